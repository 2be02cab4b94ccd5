//! Process-wide cache of the last known record of every settings domain
//!
//! The store is constructed once by the composition root and cloned into
//! every consumer; clones share the same slots. A slot starts empty and is
//! only ever replaced by a whole record, so once populated it stays
//! populated for the life of the store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::settings::domain::SettingsDomain;
use crate::settings::record::CanonicalRecord;

#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    slots: Arc<RwLock<HashMap<SettingsDomain, CanonicalRecord>>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached record of `domain`, if it has been loaded
    pub fn get(&self, domain: SettingsDomain) -> Option<CanonicalRecord> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&domain)
            .cloned()
    }

    pub fn is_populated(&self, domain: SettingsDomain) -> bool {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&domain)
    }

    /// Overwrite the slot of the record's domain. No merge: last writer wins.
    pub fn set(&self, record: CanonicalRecord) {
        let domain = record.domain();
        let previous = self
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(domain, record);
        debug!(%domain, replaced = previous.is_some(), "Settings cache updated");
    }

    /// Modify a populated slot in place and return the updated record.
    /// Returns `None` without calling `apply` when the slot is empty.
    pub fn update<E>(
        &self,
        domain: SettingsDomain,
        apply: impl FnOnce(&mut CanonicalRecord) -> Result<(), E>,
    ) -> Result<Option<CanonicalRecord>, E> {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = slots.get(&domain) else {
            return Ok(None);
        };

        // Apply to a copy so a failed edit leaves the cached record intact
        let mut updated = current.clone();
        apply(&mut updated)?;
        slots.insert(domain, updated.clone());
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::error::SettingsError;
    use crate::settings::record::FieldValue;
    use crate::settings::schema::SchemaMapper;

    #[test]
    fn test_empty_store() {
        let store = SettingsStore::new();
        for domain in SettingsDomain::ALL {
            assert_eq!(store.get(domain), None);
            assert!(!store.is_populated(domain));
        }
    }

    #[test]
    fn test_set_overwrites_whole_record() {
        let store = SettingsStore::new();
        store.set(SchemaMapper::defaults(SettingsDomain::Menu));

        let replacement = CanonicalRecord::new(SettingsDomain::Menu)
            .with("taxRate", FieldValue::quantity("5"))
            .unwrap();
        store.set(replacement.clone());

        assert_eq!(store.get(SettingsDomain::Menu), Some(replacement));
        assert!(!store.is_populated(SettingsDomain::Delivery));
    }

    #[test]
    fn test_clones_share_slots() {
        let store = SettingsStore::new();
        let other = store.clone();
        store.set(SchemaMapper::defaults(SettingsDomain::Delivery));
        assert!(other.is_populated(SettingsDomain::Delivery));
    }

    #[test]
    fn test_update_on_empty_slot_is_noop() {
        let store = SettingsStore::new();
        let mut called = false;
        let result = store.update(SettingsDomain::Menu, |_| {
            called = true;
            Ok::<(), SettingsError>(())
        });
        assert!(matches!(result, Ok(None)));
        assert!(!called);
        assert!(!store.is_populated(SettingsDomain::Menu));
    }

    #[test]
    fn test_failed_update_keeps_record() {
        let store = SettingsStore::new();
        store.set(SchemaMapper::defaults(SettingsDomain::Menu));

        let result = store.update(SettingsDomain::Menu, |record| {
            record.insert("taxRate", FieldValue::quantity("1"))?;
            record.insert("nope", FieldValue::Flag(true))?;
            Ok::<(), SettingsError>(())
        });

        assert!(result.is_err());
        assert_eq!(
            store.get(SettingsDomain::Menu),
            Some(SchemaMapper::defaults(SettingsDomain::Menu))
        );
    }
}
