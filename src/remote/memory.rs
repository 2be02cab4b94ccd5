//! In-process document store
//!
//! Holds documents in a map and counts every read and write. Reads and
//! writes can be made to fail, and reads can be held at a gate so callers
//! can observe what happens while a load is in flight.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::Semaphore;
use tracing::debug;

use super::{DocumentStore, ExternalRecord, RemoteError};
use crate::settings::domain::DocumentKey;

#[derive(Debug)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<DocumentKey, ExternalRecord>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads_paused: AtomicBool,
    read_gate: Semaphore,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            reads_paused: AtomicBool::new(false),
            read_gate: Semaphore::new(0),
        }
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document directly, bypassing counters
    pub fn insert(&self, key: DocumentKey, fields: ExternalRecord) {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, fields);
    }

    /// Current contents of a document, bypassing counters
    pub fn document(&self, key: DocumentKey) -> Option<ExternalRecord> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    /// Number of reads issued so far (including failed and gated ones)
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of merge writes issued so far (including failed ones)
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold every subsequent read until [`release_reads`](Self::release_reads) lets it through
    pub fn pause_reads(&self) {
        self.reads_paused.store(true, Ordering::SeqCst);
    }

    /// Let `count` held (or future) reads complete
    pub fn release_reads(&self, count: usize) {
        self.read_gate.add_permits(count);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read(&self, key: DocumentKey) -> Result<Option<ExternalRecord>, RemoteError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        if self.reads_paused.load(Ordering::SeqCst) {
            debug!(document = %key, "Read held at gate");
            let permit = self
                .read_gate
                .acquire()
                .await
                .map_err(|_| RemoteError::Unavailable("read gate closed".to_string()))?;
            permit.forget();
        }

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable(format!("read of {key} refused")));
        }
        Ok(self.document(key))
    }

    async fn merge(&self, key: DocumentKey, fields: ExternalRecord) -> Result<(), RemoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::Rejected(format!("write to {key} refused")));
        }

        let mut documents = self.documents.lock().unwrap_or_else(PoisonError::into_inner);
        documents.entry(key).or_default().extend(fields);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: DocumentKey = DocumentKey::new("Delivery Settings", "settings");

    fn fields(value: serde_json::Value) -> ExternalRecord {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_read_missing_document() {
        let store = MemoryDocumentStore::new();
        assert_eq!(store.read(KEY).await.unwrap(), None);
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn test_merge_leaves_other_fields_untouched() {
        let store = MemoryDocumentStore::new();
        store.insert(KEY, fields(json!({"deliveryFee": 5, "notes": "keep me"})));

        store.merge(KEY, fields(json!({"deliveryFee": 7}))).await.unwrap();

        let document = store.document(KEY).unwrap();
        assert_eq!(document["deliveryFee"], json!(7));
        assert_eq!(document["notes"], json!("keep me"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_merge_creates_missing_document() {
        let store = MemoryDocumentStore::new();
        store.merge(KEY, fields(json!({"deliveryFee": 7}))).await.unwrap();
        assert_eq!(store.document(KEY), Some(fields(json!({"deliveryFee": 7}))));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryDocumentStore::new();
        store.fail_reads(true);
        store.fail_writes(true);

        assert!(matches!(store.read(KEY).await, Err(RemoteError::Unavailable(_))));
        assert!(matches!(
            store.merge(KEY, ExternalRecord::new()).await,
            Err(RemoteError::Rejected(_))
        ));
        assert_eq!(store.document(KEY), None);
    }

    #[tokio::test]
    async fn test_paused_read_completes_after_release() {
        let store = MemoryDocumentStore::new();
        store.insert(KEY, fields(json!({"deliveryFee": 5})));
        store.pause_reads();
        store.release_reads(1);

        let document = store.read(KEY).await.unwrap();
        assert_eq!(document, Some(fields(json!({"deliveryFee": 5}))));
    }
}
