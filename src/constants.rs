//! Application-wide constants
//!
//! This module contains the magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Config file location
pub mod config {
    /// Directory under the platform config dir (and data dir)
    pub const APP_DIR: &str = "admin-settings-sync";

    /// Config file name
    pub const FILENAME: &str = "config.toml";

    /// Sub-directory of the data dir holding remote documents for the file store
    pub const DOCUMENTS_DIR: &str = "documents";
}

/// Environment variables that override config values
pub mod env {
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const DATA_DIR: &str = "ADMIN_SETTINGS_DATA_DIR";
}

/// Remote document addressing
pub mod documents {
    /// Every settings collection stores its record under this document id
    pub const SETTINGS_ID: &str = "settings";

    pub const NOTIFICATIONS_COLLECTION: &str = "Notification Settings";
    pub const MENU_COLLECTION: &str = "Menu Settings";
    pub const DELIVERY_COLLECTION: &str = "Delivery Settings";

    /// Extension of document files written by the JSON file store
    pub const FILE_EXTENSION: &str = "json";
}

/// Transient notification timing
pub mod notices {
    /// Matches the auto-close delay of the dashboard's toast banners
    pub const DEFAULT_TTL_MS: u64 = 3000;

    pub const MIN_TTL_MS: u64 = 500;
    pub const MAX_TTL_MS: u64 = 60_000;
}

/// Accepted log level names
pub mod log {
    pub const DEFAULT_LEVEL: &str = "info";
    pub const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
}
