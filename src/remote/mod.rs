//! Remote settings document storage
//!
//! Each settings domain lives in one addressable document. The store only
//! needs two operations: read a whole document (or report that it does not
//! exist) and merge a subset of fields into it.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::settings::domain::DocumentKey;

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryDocumentStore;

/// Field map of a document as persisted remotely (external field names)
pub type ExternalRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("document {key} is malformed: {reason}")]
    Malformed { key: DocumentKey, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the entire document, `None` when it was never created
    async fn read(&self, key: DocumentKey) -> Result<Option<ExternalRecord>, RemoteError>;

    /// Merge `fields` into the document, creating it if absent.
    /// Fields not named in `fields` are left untouched.
    async fn merge(&self, key: DocumentKey, fields: ExternalRecord) -> Result<(), RemoteError>;
}
