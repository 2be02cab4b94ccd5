//! Cache-first loading of settings domains

use std::sync::Arc;
use tracing::{debug, error, info};

use crate::remote::DocumentStore;
use crate::settings::domain::SettingsDomain;
use crate::settings::error::SettingsError;
use crate::settings::record::CanonicalRecord;
use crate::settings::schema::SchemaMapper;
use crate::settings::scope::PanelScope;
use crate::settings::store::SettingsStore;

#[derive(Clone)]
pub struct SettingsLoader {
    store: SettingsStore,
    remote: Arc<dyn DocumentStore>,
}

impl SettingsLoader {
    pub fn new(store: SettingsStore, remote: Arc<dyn DocumentStore>) -> Self {
        Self { store, remote }
    }

    /// Return the cached record of `domain`, reading the remote document only on a cache miss.
    ///
    /// A miss issues exactly one read. An absent document yields the defaults
    /// table. Either way the result is written to the store before returning.
    /// Two loads of the same domain racing on a miss both read and both write;
    /// whichever resolves last stays in the cache.
    pub async fn load(&self, domain: SettingsDomain) -> Result<CanonicalRecord, SettingsError> {
        if let Some(record) = self.store.get(domain) {
            debug!(%domain, "Settings cache hit");
            return Ok(record);
        }

        let key = domain.document_key();
        info!(%domain, document = %key, "Loading settings from remote store");

        let document = self.remote.read(key).await.map_err(|source| {
            error!(%domain, document = %key, error = %source, "Failed to load settings");
            SettingsError::Load { domain, source }
        })?;

        let record = match document {
            Some(fields) => {
                info!(%domain, fields = fields.len(), "Decoded settings document");
                SchemaMapper::decode(domain, Some(&fields))
            }
            None => {
                info!(%domain, "Settings document does not exist, using defaults");
                SchemaMapper::defaults(domain)
            }
        };

        self.store.set(record.clone());
        Ok(record)
    }

    /// [`load`](Self::load) on behalf of a panel.
    ///
    /// The cache is populated regardless, but the result is only handed back
    /// while `scope` is still active; `None` means the panel went away.
    pub async fn load_within(
        &self,
        domain: SettingsDomain,
        scope: &PanelScope,
    ) -> Option<Result<CanonicalRecord, SettingsError>> {
        let result = self.load(domain).await;
        scope.admit(result)
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }
}
