//! Optimistic local edits and explicit write-back
//!
//! Edits land in the shared store immediately and never touch the remote
//! store. Persisting them is a separate, caller-triggered flush that sends
//! the whole encoded record as a merge write. A failed flush leaves the
//! edited record in the cache; the user retries by flushing again.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::notify::Notifier;
use crate::remote::DocumentStore;
use crate::settings::domain::SettingsDomain;
use crate::settings::error::SettingsError;
use crate::settings::record::{CanonicalRecord, FieldKind, FieldValue};
use crate::settings::schema::SchemaMapper;
use crate::settings::scope::PanelScope;
use crate::settings::store::SettingsStore;

#[derive(Clone)]
pub struct SettingsMutator {
    store: SettingsStore,
    remote: Arc<dyn DocumentStore>,
    notifier: Notifier,
}

impl SettingsMutator {
    pub fn new(store: SettingsStore, remote: Arc<dyn DocumentStore>, notifier: Notifier) -> Self {
        Self {
            store,
            remote,
            notifier,
        }
    }

    /// Merge one field into the cached record of `domain`.
    ///
    /// Returns the updated record, or `Ok(None)` when the domain has not been
    /// loaded yet (the edit is ignored). Unknown keys and values of the wrong
    /// kind are rejected before the cache is looked at.
    pub fn local_update(
        &self,
        domain: SettingsDomain,
        key: &str,
        value: FieldValue,
    ) -> Result<Option<CanonicalRecord>, SettingsError> {
        let spec = SchemaMapper::field(domain, key)?;
        if spec.kind() != value.kind() {
            return Err(SettingsError::KindMismatch {
                domain,
                key: key.to_string(),
                expected: spec.kind(),
            });
        }

        let updated = self
            .store
            .update(domain, |record| record.insert(spec.key, value).map(|_| ()))?;
        if updated.is_none() {
            warn!(%domain, key, "Ignoring edit, settings not loaded yet");
        }
        Ok(updated)
    }

    /// Parse user text for `key` and apply it as a local update
    pub fn local_update_input(
        &self,
        domain: SettingsDomain,
        key: &str,
        raw: &str,
    ) -> Result<Option<CanonicalRecord>, SettingsError> {
        let value = SchemaMapper::field(domain, key)?.parse_input(raw)?;
        self.local_update(domain, key, value)
    }

    /// Flip a flag field of the cached record
    pub fn toggle(
        &self,
        domain: SettingsDomain,
        key: &str,
    ) -> Result<Option<CanonicalRecord>, SettingsError> {
        let spec = SchemaMapper::field(domain, key)?;
        if spec.kind() != FieldKind::Flag {
            return Err(SettingsError::KindMismatch {
                domain,
                key: key.to_string(),
                expected: spec.kind(),
            });
        }

        let updated = self.store.update(domain, |record| {
            let current = record
                .flag(spec.key)
                .unwrap_or_else(|| spec.default.to_value().as_flag().unwrap_or(false));
            record.insert(spec.key, FieldValue::Flag(!current)).map(|_| ())
        })?;
        if updated.is_none() {
            warn!(%domain, key, "Ignoring toggle, settings not loaded yet");
        }
        Ok(updated)
    }

    /// Persist the cached record of `domain` as a merge write.
    ///
    /// Outcomes are reported on the notice channel. On failure the cached
    /// record is left exactly as it was.
    pub async fn flush(&self, domain: SettingsDomain) -> Result<(), SettingsError> {
        let Some(record) = self.store.get(domain) else {
            warn!(%domain, "Nothing to save, settings not loaded");
            self.notifier
                .info(format!("{} settings have not been loaded yet.", domain.title()));
            return Err(SettingsError::NotLoaded(domain));
        };

        let key = domain.document_key();
        let fields = SchemaMapper::encode(domain, &record);
        info!(%domain, document = %key, fields = fields.len(), "Saving settings");

        match self.remote.merge(key, fields).await {
            Ok(()) => {
                self.notifier
                    .success(format!("{} settings saved successfully!", domain.title()));
                Ok(())
            }
            Err(source) => {
                error!(%domain, document = %key, error = %source, "Failed to save settings");
                self.notifier.error(format!(
                    "Failed to save {} settings. Please try again.",
                    domain.title().to_lowercase()
                ));
                Err(SettingsError::Save { domain, source })
            }
        }
    }

    /// [`flush`](Self::flush) on behalf of a panel; the write and the notice
    /// happen regardless, the outcome is only returned while `scope` is active.
    pub async fn flush_within(
        &self,
        domain: SettingsDomain,
        scope: &PanelScope,
    ) -> Option<Result<(), SettingsError>> {
        let result = self.flush(domain).await;
        scope.admit(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{self, NoticeFeed, NoticeLevel};
    use crate::remote::MemoryDocumentStore;
    use crate::settings::loader::SettingsLoader;
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        remote: Arc<MemoryDocumentStore>,
        store: SettingsStore,
        loader: SettingsLoader,
        mutator: SettingsMutator,
        feed: NoticeFeed,
    }

    fn fixture() -> Fixture {
        let remote = Arc::new(MemoryDocumentStore::new());
        let store = SettingsStore::new();
        let (notifier, feed) = notify::channel(Duration::from_millis(3000));
        Fixture {
            loader: SettingsLoader::new(store.clone(), remote.clone()),
            mutator: SettingsMutator::new(store.clone(), remote.clone(), notifier),
            remote,
            store,
            feed,
        }
    }

    #[tokio::test]
    async fn test_local_update_before_load_is_noop() {
        let f = fixture();
        let result = f
            .mutator
            .local_update(SettingsDomain::Delivery, "minOrder", FieldValue::quantity("30"))
            .unwrap();
        assert_eq!(result, None);
        assert!(!f.store.is_populated(SettingsDomain::Delivery));
        assert_eq!(f.remote.read_count(), 0);
    }

    #[tokio::test]
    async fn test_local_update_changes_cache_without_io() {
        let f = fixture();
        f.loader.load(SettingsDomain::Delivery).await.unwrap();

        let updated = f
            .mutator
            .local_update(SettingsDomain::Delivery, "minOrder", FieldValue::quantity("30"))
            .unwrap()
            .unwrap();

        assert_eq!(updated.quantity("minOrder"), Some("30"));
        assert_eq!(updated.quantity("deliveryFee"), Some("8"));
        assert_eq!(f.store.get(SettingsDomain::Delivery), Some(updated));
        assert_eq!(f.remote.write_count(), 0);
        assert_eq!(f.remote.read_count(), 1);
    }

    #[tokio::test]
    async fn test_local_update_rejects_unknown_key_and_wrong_kind() {
        let f = fixture();
        f.loader.load(SettingsDomain::Menu).await.unwrap();

        assert!(matches!(
            f.mutator.local_update(SettingsDomain::Menu, "deliveryFee", FieldValue::quantity("1")),
            Err(SettingsError::UnknownField { .. })
        ));
        assert!(matches!(
            f.mutator.local_update(SettingsDomain::Menu, "taxRate", FieldValue::Flag(true)),
            Err(SettingsError::KindMismatch { .. })
        ));
        assert_eq!(
            f.store.get(SettingsDomain::Menu),
            Some(SchemaMapper::defaults(SettingsDomain::Menu))
        );
    }

    #[tokio::test]
    async fn test_local_update_input_parses_flags() {
        let f = fixture();
        f.loader.load(SettingsDomain::Notifications).await.unwrap();

        let updated = f
            .mutator
            .local_update_input(SettingsDomain::Notifications, "driverUpdates", "yes")
            .unwrap()
            .unwrap();
        assert_eq!(updated.flag("driverUpdates"), Some(true));
    }

    #[tokio::test]
    async fn test_toggle_flips_flag() {
        let f = fixture();
        f.loader.load(SettingsDomain::Menu).await.unwrap();

        let once = f.mutator.toggle(SettingsDomain::Menu, "showRatings").unwrap().unwrap();
        assert_eq!(once.flag("showRatings"), Some(false));
        let twice = f.mutator.toggle(SettingsDomain::Menu, "showRatings").unwrap().unwrap();
        assert_eq!(twice.flag("showRatings"), Some(true));

        assert!(matches!(
            f.mutator.toggle(SettingsDomain::Menu, "taxRate"),
            Err(SettingsError::KindMismatch { expected: FieldKind::Quantity, .. })
        ));
    }

    #[tokio::test]
    async fn test_flush_merge_writes_encoded_record() {
        let mut f = fixture();
        let key = SettingsDomain::Delivery.document_key();
        f.remote.insert(
            key,
            json!({"minimumOrderAmount": 25, "Delivery Fee": 4.99, "zone": "north"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        f.loader.load(SettingsDomain::Delivery).await.unwrap();
        f.mutator
            .local_update(SettingsDomain::Delivery, "deliveryRadius", FieldValue::quantity("12.5"))
            .unwrap();

        f.mutator.flush(SettingsDomain::Delivery).await.unwrap();

        let document = f.remote.document(key).unwrap();
        assert_eq!(document["minimumOrderAmount"], json!(25));
        assert_eq!(document["deliveryFee"], json!(4.99));
        assert_eq!(document["deliveryRadius"], json!(12.5));
        assert_eq!(document["averagePrepTime"], json!(20));
        assert_eq!(document["averageDeliveryTime"], json!(20));
        // Fields outside the encoded set survive the merge
        assert_eq!(document["zone"], json!("north"));
        assert_eq!(document["Delivery Fee"], json!(4.99));

        let notices = f.feed.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert_eq!(notices[0].message, "Delivery settings saved successfully!");
    }

    #[tokio::test]
    async fn test_failed_flush_keeps_optimistic_value() {
        let mut f = fixture();
        f.loader.load(SettingsDomain::Menu).await.unwrap();
        let edited = f
            .mutator
            .local_update(SettingsDomain::Menu, "taxRate", FieldValue::quantity("7.5"))
            .unwrap()
            .unwrap();

        f.remote.fail_writes(true);
        let err = f.mutator.flush(SettingsDomain::Menu).await.unwrap_err();

        assert!(matches!(err, SettingsError::Save { domain: SettingsDomain::Menu, .. }));
        assert_eq!(f.store.get(SettingsDomain::Menu), Some(edited));
        assert_eq!(f.remote.document(SettingsDomain::Menu.document_key()), None);

        let notices = f.feed.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert_eq!(notices[0].message, "Failed to save menu settings. Please try again.");

        // Manual retry succeeds once the remote accepts writes again
        f.remote.fail_writes(false);
        f.mutator.flush(SettingsDomain::Menu).await.unwrap();
        let document = f.remote.document(SettingsDomain::Menu.document_key()).unwrap();
        assert_eq!(document["taxRate"], json!(7.5));
    }

    #[tokio::test]
    async fn test_flush_before_load_is_rejected() {
        let mut f = fixture();
        let err = f.mutator.flush(SettingsDomain::Notifications).await.unwrap_err();
        assert!(matches!(err, SettingsError::NotLoaded(SettingsDomain::Notifications)));
        assert_eq!(f.remote.write_count(), 0);
        assert_eq!(f.feed.drain()[0].level, NoticeLevel::Info);
    }

    #[tokio::test]
    async fn test_local_update_never_flushes() {
        let f = fixture();
        f.loader.load(SettingsDomain::Notifications).await.unwrap();
        f.mutator.toggle(SettingsDomain::Notifications, "weeklyReports").unwrap();
        f.mutator
            .local_update(SettingsDomain::Notifications, "newOrders", FieldValue::Flag(false))
            .unwrap();
        assert_eq!(f.remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_flush_within_inactive_scope_still_writes() {
        let mut f = fixture();
        f.loader.load(SettingsDomain::Menu).await.unwrap();
        let scope = PanelScope::new();
        scope.deactivate();

        assert!(f.mutator.flush_within(SettingsDomain::Menu, &scope).await.is_none());
        assert_eq!(f.remote.write_count(), 1);
        assert_eq!(scope.suppressed(), 1);
        assert_eq!(f.feed.drain().len(), 1);
    }
}
