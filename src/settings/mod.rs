//! Settings synchronization and cache layer
//!
//! - **schema**: canonical ↔ external field translation and defaults
//! - **store**: shared per-domain cache
//! - **loader**: cache-first remote loading
//! - **mutator**: optimistic local edits and explicit flush
//! - **scope**: liveness scope that gates late results for a panel

pub mod domain;
pub mod error;
pub mod loader;
pub mod mutator;
pub mod record;
pub mod schema;
pub mod scope;
pub mod store;

use std::sync::Arc;

use crate::notify::Notifier;
use crate::remote::DocumentStore;

pub use domain::{DocumentKey, SettingsDomain};
pub use error::SettingsError;
pub use loader::SettingsLoader;
pub use mutator::SettingsMutator;
pub use record::{CanonicalRecord, FieldKind, FieldValue};
pub use schema::{FieldDefault, FieldSpec, SchemaMapper};
pub use scope::PanelScope;
pub use store::SettingsStore;

/// Composition root of the settings subsystem.
///
/// Owns the one store shared by every loader, mutator and panel created
/// from it. Cloning the context shares that store.
#[derive(Clone)]
pub struct SettingsContext {
    store: SettingsStore,
    loader: SettingsLoader,
    mutator: SettingsMutator,
}

impl SettingsContext {
    pub fn new(remote: Arc<dyn DocumentStore>, notifier: Notifier) -> Self {
        let store = SettingsStore::new();
        Self {
            loader: SettingsLoader::new(store.clone(), remote.clone()),
            mutator: SettingsMutator::new(store.clone(), remote, notifier),
            store,
        }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn loader(&self) -> &SettingsLoader {
        &self.loader
    }

    pub fn mutator(&self) -> &SettingsMutator {
        &self.mutator
    }
}
