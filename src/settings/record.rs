//! Canonical (internal) representation of a settings domain

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::settings::domain::SettingsDomain;
use crate::settings::error::SettingsError;
use crate::settings::schema::SchemaMapper;

/// Kind of value a canonical field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// On/off toggle
    Flag,
    /// Numeric quantity kept as decimal text while the user edits it
    Quantity,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Flag => f.pad("boolean"),
            FieldKind::Quantity => f.pad("numeric"),
        }
    }
}

/// Typed value of a canonical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Quantity(String),
}

impl FieldValue {
    pub fn quantity(text: impl Into<String>) -> Self {
        FieldValue::Quantity(text.into())
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Flag(_) => FieldKind::Flag,
            FieldValue::Quantity(_) => FieldKind::Quantity,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(value) => Some(*value),
            FieldValue::Quantity(_) => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&str> {
        match self {
            FieldValue::Quantity(text) => Some(text),
            FieldValue::Flag(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(true) => f.pad("on"),
            FieldValue::Flag(false) => f.pad("off"),
            FieldValue::Quantity(text) => f.pad(text),
        }
    }
}

/// Canonical record for one domain.
///
/// Keys are always canonical keys of the domain's schema and every value
/// matches the kind declared for its key. Records produced by decoding are
/// complete; hand-built records may leave keys out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalRecord {
    #[serde(skip)]
    domain: SettingsDomain,
    #[serde(flatten)]
    values: BTreeMap<&'static str, FieldValue>,
}

impl CanonicalRecord {
    /// Empty record for `domain`
    pub fn new(domain: SettingsDomain) -> Self {
        Self {
            domain,
            values: BTreeMap::new(),
        }
    }

    /// Builder form of [`CanonicalRecord::insert`]
    pub fn with(mut self, key: &str, value: FieldValue) -> Result<Self, SettingsError> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn domain(&self) -> SettingsDomain {
        self.domain
    }

    /// Set a single field, validating the key and the value kind against the schema
    pub fn insert(
        &mut self,
        key: &str,
        value: FieldValue,
    ) -> Result<Option<FieldValue>, SettingsError> {
        let spec = SchemaMapper::field(self.domain, key)?;
        if spec.kind() != value.kind() {
            return Err(SettingsError::KindMismatch {
                domain: self.domain,
                key: key.to_string(),
                expected: spec.kind(),
            });
        }
        Ok(self.values.insert(spec.key, value))
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(FieldValue::as_flag)
    }

    pub fn quantity(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_quantity)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fields in schema order (not alphabetical)
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> + '_ {
        SchemaMapper::fields(self.domain)
            .iter()
            .filter_map(|spec| self.values.get(spec.key).map(|value| (spec.key, value)))
    }

    /// Crate-internal insert for values already checked against the schema
    pub(crate) fn insert_unchecked(&mut self, key: &'static str, value: FieldValue) {
        self.values.insert(key, value);
    }
}
