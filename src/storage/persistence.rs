//! Reference and batch boundaries, plus the in-memory adapter
//!
//! Both traits are async because either side may be a remote service.
//! Implementations must be `Send + Sync` for shared access across tasks.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::types::{BatchReceipt, BatchRecord, ReferenceTrajectory};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("reference trajectory '{0}' not found")]
    ReferenceNotFound(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("persistence sink unavailable: {0}")]
    Unavailable(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Read-only source of reference trajectories.
#[async_trait]
pub trait ReferenceProvider: Send + Sync {
    async fn load_reference(&self, id: &str) -> Result<ReferenceTrajectory, StorageError>;
}

/// Write-only sink for finished batches.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn finalize(&self, record: &BatchRecord) -> Result<BatchReceipt, StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// In-memory store for tests and throwaway sessions.
///
/// Not durable: data is lost on restart. `set_offline(true)` makes every
/// `finalize` fail, to exercise the retry path.
#[derive(Default)]
pub struct InMemoryStore {
    references: RwLock<HashMap<String, ReferenceTrajectory>>,
    batches: RwLock<Vec<BatchRecord>>,
    offline: AtomicBool,
    finalize_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference(self, reference: ReferenceTrajectory) -> Self {
        self.insert_reference(reference);
        self
    }

    pub fn insert_reference(&self, reference: ReferenceTrajectory) {
        let mut refs = self
            .references
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        refs.insert(reference.id.clone(), reference);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `finalize` calls received, successful or not.
    pub fn finalize_calls(&self) -> usize {
        self.finalize_calls.load(Ordering::SeqCst)
    }

    /// Batches accepted so far, oldest first.
    pub fn batches(&self) -> Vec<BatchRecord> {
        self.batches
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ReferenceProvider for InMemoryStore {
    async fn load_reference(&self, id: &str) -> Result<ReferenceTrajectory, StorageError> {
        let refs = self
            .references
            .read()
            .map_err(|e| StorageError::Storage(e.to_string()))?;
        refs.get(id)
            .cloned()
            .ok_or_else(|| StorageError::ReferenceNotFound(id.to_string()))
    }
}

#[async_trait]
impl BatchSink for InMemoryStore {
    async fn finalize(&self, record: &BatchRecord) -> Result<BatchReceipt, StorageError> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory store is offline".to_string()));
        }

        let mut batches = self
            .batches
            .write()
            .map_err(|e| StorageError::Storage(e.to_string()))?;
        batches.push(record.clone());

        Ok(BatchReceipt {
            batch_id: record.session_id.to_string(),
            stored_at: Utc::now(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
