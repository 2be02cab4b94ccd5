//! Error types for the settings subsystem

use thiserror::Error;

use crate::remote::RemoteError;
use crate::settings::domain::SettingsDomain;
use crate::settings::record::FieldKind;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown settings domain '{0}' (expected notifications, menu or delivery)")]
    UnknownDomain(String),

    #[error("'{key}' is not a {domain} setting")]
    UnknownField { domain: SettingsDomain, key: String },

    #[error("{domain} setting '{key}' expects a {expected} value")]
    KindMismatch {
        domain: SettingsDomain,
        key: String,
        expected: FieldKind,
    },

    #[error("invalid value '{value}' for '{key}': expected true/false, yes/no, on/off or 1/0")]
    InvalidFlag { key: String, value: String },

    #[error("{0} settings have not been loaded yet")]
    NotLoaded(SettingsDomain),

    #[error("failed to load {domain} settings")]
    Load {
        domain: SettingsDomain,
        #[source]
        source: RemoteError,
    },

    #[error("failed to save {domain} settings")]
    Save {
        domain: SettingsDomain,
        #[source]
        source: RemoteError,
    },
}

impl SettingsError {
    /// Message including the underlying remote failure, for in-panel display
    pub fn detailed(&self) -> String {
        match self {
            SettingsError::Load { source, .. } | SettingsError::Save { source, .. } => {
                format!("{self}: {source}")
            }
            _ => self.to_string(),
        }
    }
}
