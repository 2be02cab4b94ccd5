//! Host-side view model of one settings panel
//!
//! A panel shows a single domain. It moves from `Uninitialized` to `Loading`
//! on a cache miss and to `Ready` once the record arrives (or straight to
//! `Ready` on a cache hit). Edits keep it `Ready` with the updated record,
//! and a failed save never moves it back. Everything asynchronous the panel
//! starts goes through its [`PanelScope`], so results that resolve after the
//! panel is gone never reach its view.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::settings::{
    CanonicalRecord, FieldValue, PanelScope, SettingsContext, SettingsDomain, SettingsError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelView {
    Uninitialized,
    Loading,
    Ready(CanonicalRecord),
    /// Load failed; the message is shown in place of the settings
    Failed(String),
}

pub struct SettingsPanel {
    domain: SettingsDomain,
    context: SettingsContext,
    view: Arc<Mutex<PanelView>>,
    scope: PanelScope,
}

impl SettingsPanel {
    pub fn mount(context: &SettingsContext, domain: SettingsDomain) -> Self {
        debug!(%domain, "Panel mounted");
        Self {
            domain,
            context: context.clone(),
            view: Arc::new(Mutex::new(PanelView::Uninitialized)),
            scope: PanelScope::new(),
        }
    }

    pub fn domain(&self) -> SettingsDomain {
        self.domain
    }

    pub fn view(&self) -> PanelView {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Record currently on display, if the panel is ready
    pub fn record(&self) -> Option<CanonicalRecord> {
        match self.view() {
            PanelView::Ready(record) => Some(record),
            _ => None,
        }
    }

    pub fn scope(&self) -> &PanelScope {
        &self.scope
    }

    /// Show the domain's settings, loading them when the cache is empty.
    ///
    /// Returns the spawned load task on a cache miss, `None` when the panel
    /// became ready synchronously or no load was needed. Must be called from
    /// within a tokio runtime.
    pub fn activate(&self) -> Option<JoinHandle<()>> {
        if !self.scope.is_active() {
            warn!(domain = %self.domain, "Activate called on an unmounted panel");
            return None;
        }

        if let Some(record) = self.context.store().get(self.domain) {
            debug!(domain = %self.domain, "Panel ready from cache");
            commit_view(&self.view, &self.scope, PanelView::Ready(record));
            return None;
        }

        if matches!(self.view(), PanelView::Loading) {
            return None;
        }
        if !commit_view(&self.view, &self.scope, PanelView::Loading) {
            return None;
        }

        let loader = self.context.loader().clone();
        let view = Arc::clone(&self.view);
        let scope = self.scope.clone();
        let domain = self.domain;

        Some(tokio::spawn(async move {
            let Some(result) = loader.load_within(domain, &scope).await else {
                return;
            };
            let next = match result {
                Ok(record) => {
                    info!(%domain, "Panel ready");
                    PanelView::Ready(record)
                }
                Err(err) => {
                    warn!(%domain, error = %err.detailed(), "Panel failed to load settings");
                    PanelView::Failed(err.detailed())
                }
            };
            commit_view(&view, &scope, next);
        }))
    }

    /// Manually retry after a failed load
    pub fn retry(&self) -> Option<JoinHandle<()>> {
        match self.view() {
            PanelView::Failed(_) | PanelView::Uninitialized => self.activate(),
            _ => None,
        }
    }

    /// Apply a typed edit. Returns `false` when the settings are not loaded yet.
    ///
    /// The cached record is edited even after the panel has been deactivated;
    /// only the panel's own view is left alone then.
    pub fn set(&self, key: &str, value: FieldValue) -> Result<bool, SettingsError> {
        let updated = self.context.mutator().local_update(self.domain, key, value)?;
        Ok(self.show_update(updated))
    }

    /// Apply an edit from user text. Returns `false` when the settings are not loaded yet.
    pub fn edit(&self, key: &str, raw: &str) -> Result<bool, SettingsError> {
        let updated = self.context.mutator().local_update_input(self.domain, key, raw)?;
        Ok(self.show_update(updated))
    }

    /// Flip a flag. Returns `false` when the settings are not loaded yet.
    pub fn toggle(&self, key: &str) -> Result<bool, SettingsError> {
        let updated = self.context.mutator().toggle(self.domain, key)?;
        Ok(self.show_update(updated))
    }

    /// Persist the current record. The view is left as it is either way;
    /// the outcome is also reported on the notice channel.
    ///
    /// The write happens even if the panel is deactivated meanwhile, but the
    /// outcome is then dropped and `Ok(())` is returned.
    pub async fn save(&self) -> Result<(), SettingsError> {
        match self.context.mutator().flush_within(self.domain, &self.scope).await {
            Some(result) => result,
            None => {
                debug!(domain = %self.domain, "Save finished after panel was deactivated");
                Ok(())
            }
        }
    }

    /// Navigate away: results still in flight will no longer reach this panel
    pub fn deactivate(&self) {
        // Held so no view commit can land between its own check and write
        let _view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        self.scope.deactivate();
    }

    fn show_update(&self, updated: Option<CanonicalRecord>) -> bool {
        match updated {
            Some(record) => {
                commit_view(&self.view, &self.scope, PanelView::Ready(record));
                true
            }
            None => false,
        }
    }
}

/// Replace the view if the scope is still active. The scope is checked while
/// the view lock is held.
fn commit_view(view: &Mutex<PanelView>, scope: &PanelScope, next: PanelView) -> bool {
    let mut current = view.lock().unwrap_or_else(PoisonError::into_inner);
    match scope.admit(next) {
        Some(next) => {
            *current = next;
            true
        }
        None => false,
    }
}

impl Drop for SettingsPanel {
    fn drop(&mut self) {
        self.deactivate();
    }
}
