//! Configuration management for the settings tool
//!
//! - **app**: `AppConfig` loaded from TOML with environment overrides

pub mod app;

// Re-export commonly used types
pub use app::{AppConfig, NoticeSettings, StoreBackend, StoreSettings};
