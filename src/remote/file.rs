//! JSON file backed document store
//!
//! Every document is a JSON object stored at `<root>/<collection>/<id>.json`,
//! with the collection name slugified (`Delivery Settings` → `delivery-settings`).

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use super::{DocumentStore, ExternalRecord, RemoteError};
use crate::constants::documents::FILE_EXTENSION;
use crate::settings::domain::DocumentKey;

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the document at `key`
    pub fn document_path(&self, key: DocumentKey) -> PathBuf {
        self.root
            .join(slugify(key.collection))
            .join(format!("{}.{}", slugify(key.id), FILE_EXTENSION))
    }

    async fn read_object(
        &self,
        key: DocumentKey,
        path: &Path,
    ) -> Result<Option<ExternalRecord>, RemoteError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(RemoteError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(fields)) => Ok(Some(fields)),
            Ok(other) => Err(RemoteError::Malformed {
                key,
                reason: format!("expected a JSON object, found {}", json_type(&other)),
            }),
            Err(err) => Err(RemoteError::Malformed {
                key,
                reason: err.to_string(),
            }),
        }
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn read(&self, key: DocumentKey) -> Result<Option<ExternalRecord>, RemoteError> {
        let path = self.document_path(key);
        debug!(document = %key, path = %path.display(), "Reading document");
        self.read_object(key, &path).await
    }

    async fn merge(&self, key: DocumentKey, fields: ExternalRecord) -> Result<(), RemoteError> {
        let path = self.document_path(key);
        let io_error = |source| RemoteError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let mut document = self.read_object(key, &path).await?.unwrap_or_default();
        let written = fields.len();
        document.extend(fields);

        let contents = serde_json::to_vec_pretty(&Value::Object(document))
            .map_err(|err| RemoteError::Rejected(format!("failed to serialize {key}: {err}")))?;

        // Replace the file in one step so readers never see a half-written document
        let staging = path.with_extension(format!("{FILE_EXTENSION}.tmp"));
        fs::write(&staging, contents).await.map_err(io_error)?;
        fs::rename(&staging, &path).await.map_err(io_error)?;

        info!(document = %key, path = %path.display(), fields = written, "Merged document");
        Ok(())
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
