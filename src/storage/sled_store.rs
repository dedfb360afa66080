//! Sled-backed batch and reference storage
//!
//! Two trees:
//! - `batches`: session id -> JSON `BatchRecord`
//! - `references`: reference id -> JSON `ReferenceTrajectory`
//!
//! Every finalized batch is also written to `references` under its session
//! id, so a good roast can be replayed as the master for the next one.

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{BatchSink, ReferenceProvider, StorageError};
use crate::types::{BatchReceipt, BatchRecord, ReferenceTrajectory};

const BATCHES_TREE: &str = "batches";
const REFERENCES_TREE: &str = "references";

#[derive(Clone)]
pub struct SledStore {
    db: Arc<sled::Db>,
    batches: sled::Tree,
    references: sled::Tree,
}

impl SledStore {
    /// Open or create the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        let batches = db.open_tree(BATCHES_TREE)?;
        let references = db.open_tree(REFERENCES_TREE)?;
        info!(path = %path_ref.display(), "Roast store opened");
        Ok(Self {
            db: Arc::new(db),
            batches,
            references,
        })
    }

    /// Insert or replace a reference trajectory.
    pub fn store_reference(&self, reference: &ReferenceTrajectory) -> Result<(), StorageError> {
        let value = serde_json::to_vec(reference)?;
        self.references.insert(reference.id.as_bytes(), value)?;
        debug!(id = %reference.id, points = reference.len(), "Reference stored");
        Ok(())
    }

    pub fn has_reference(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.references.contains_key(id.as_bytes())?)
    }

    /// `(id, label)` for every stored reference, ordered by id.
    pub fn list_references(&self) -> Vec<(String, String)> {
        self.references
            .iter()
            .filter_map(Result::ok)
            .filter_map(|(_key, value)| serde_json::from_slice::<ReferenceTrajectory>(&value).ok())
            .map(|r| (r.id, r.label))
            .collect()
    }

    pub fn get_batch(&self, batch_id: &str) -> Result<Option<BatchRecord>, StorageError> {
        match self.batches.get(batch_id.as_bytes())? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

#[async_trait]
impl ReferenceProvider for SledStore {
    async fn load_reference(&self, id: &str) -> Result<ReferenceTrajectory, StorageError> {
        match self.references.get(id.as_bytes())? {
            Some(value) => Ok(serde_json::from_slice(&value)?),
            None => Err(StorageError::ReferenceNotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl BatchSink for SledStore {
    async fn finalize(&self, record: &BatchRecord) -> Result<BatchReceipt, StorageError> {
        let batch_id = record.session_id.to_string();
        self.batches
            .insert(batch_id.as_bytes(), serde_json::to_vec(record)?)?;

        if !record.telemetry.is_empty() {
            self.store_reference(&ReferenceTrajectory::from_record(record))?;
        }

        self.db.flush_async().await?;
        info!(batch_id = %batch_id, label = %record.label, "Batch persisted");

        Ok(BatchReceipt {
            batch_id,
            stored_at: Utc::now(),
        })
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TelemetrySample;
    use chrono::NaiveDate;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn record_with_curve() -> BatchRecord {
        BatchRecord {
            session_id: Uuid::new_v4(),
            label: "Kenya AA".to_string(),
            source_lot: "LOT-9".to_string(),
            roast_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            process_type: "washed".to_string(),
            green_weight_kg: 12.0,
            roasted_weight_kg: 10.2,
            total_ticks: 3,
            final_temp: 27.0,
            tenant: "acme".to_string(),
            milestones: Vec::new(),
            telemetry: (0..=3)
                .map(|tick| TelemetrySample {
                    tick,
                    bean_temp: 25.0 + tick as f64 * 0.5,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_finalized_batch_becomes_reference() {
        let dir = TempDir::new().unwrap();
        let store = SledStore::open(dir.path().join("db")).unwrap();
        let record = record_with_curve();

        let receipt = store.finalize(&record).await.unwrap();
        assert_eq!(store.batch_count(), 1);
        assert_eq!(
            store.get_batch(&receipt.batch_id).unwrap(),
            Some(record.clone())
        );

        let reference = store.load_reference(&receipt.batch_id).await.unwrap();
        assert_eq!(reference.len(), 4);
        assert_eq!(reference.point_at(2).map(|p| p.temp), Some(26.0));
        assert!(reference.label.starts_with("Kenya AA"));
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = SledStore::open(dir.path().join("db")).unwrap();
        assert!(matches!(
            store.load_reference("missing").await,
            Err(StorageError::ReferenceNotFound(_))
        ));
        assert!(!store.has_reference("missing").unwrap());
    }

    #[test]
    fn test_list_references() {
        let dir = TempDir::new().unwrap();
        let store = SledStore::open(dir.path().join("db")).unwrap();
        store
            .store_reference(&ReferenceTrajectory::new("b", "second", Vec::new(), Vec::new()))
            .unwrap();
        store
            .store_reference(&ReferenceTrajectory::new("a", "first", Vec::new(), Vec::new()))
            .unwrap();
        let listed = store.list_references();
        assert_eq!(
            listed,
            vec![
                ("a".to_string(), "first".to_string()),
                ("b".to_string(), "second".to_string()),
            ]
        );
    }
}
