//! Settings domains and the remote documents that back them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::documents;
use crate::settings::error::SettingsError;

/// One of the three independently stored configuration categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsDomain {
    Notifications,
    Menu,
    Delivery,
}

impl SettingsDomain {
    pub const ALL: [SettingsDomain; 3] = [
        SettingsDomain::Notifications,
        SettingsDomain::Menu,
        SettingsDomain::Delivery,
    ];

    /// Fixed address of this domain's remote document
    pub fn document_key(self) -> DocumentKey {
        let collection = match self {
            SettingsDomain::Notifications => documents::NOTIFICATIONS_COLLECTION,
            SettingsDomain::Menu => documents::MENU_COLLECTION,
            SettingsDomain::Delivery => documents::DELIVERY_COLLECTION,
        };
        DocumentKey::new(collection, documents::SETTINGS_ID)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SettingsDomain::Notifications => "notifications",
            SettingsDomain::Menu => "menu",
            SettingsDomain::Delivery => "delivery",
        }
    }

    /// Human readable title used in notices and panel headings
    pub fn title(self) -> &'static str {
        match self {
            SettingsDomain::Notifications => "Notification",
            SettingsDomain::Menu => "Menu",
            SettingsDomain::Delivery => "Delivery",
        }
    }
}

impl fmt::Display for SettingsDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingsDomain {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SettingsDomain::ALL
            .into_iter()
            .find(|domain| domain.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SettingsError::UnknownDomain(wanted.to_string()))
    }
}

/// Address of a document in the remote store (`collection/id`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub collection: &'static str,
    pub id: &'static str,
}

impl DocumentKey {
    pub const fn new(collection: &'static str, id: &'static str) -> Self {
        Self { collection, id }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
