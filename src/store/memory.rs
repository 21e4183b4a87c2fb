//! In-memory record store used by pipeline tests.
//!
//! Clones share state, so a test can hand the store to the pipeline and
//! keep a handle for assertions.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::{RecordStore, StoreError};
use crate::record::{MenuItem, RecordStatus, SourceRecord};

#[derive(Default)]
struct Inner {
    records: BTreeMap<String, SourceRecord>,
    items: Vec<MenuItem>,
}

#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, record: SourceRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.records.insert(record.id.clone(), record);
    }

    pub fn status_of(&self, id: &str) -> Option<RecordStatus> {
        let inner = self.inner.lock().unwrap();
        inner.records.get(id).map(|r| r.status)
    }

    pub fn items(&self) -> Vec<MenuItem> {
        self.inner.lock().unwrap().items.clone()
    }
}

impl RecordStore for MemoryRecordStore {
    async fn list_by_status(
        &self,
        status: RecordStatus,
    ) -> Result<Vec<SourceRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn claim(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.records.get_mut(id) {
            Some(record) if record.status == RecordStatus::Pending => {
                record.status = RecordStatus::Working;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_status(&self, id: &str, status: RecordStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.records.get_mut(id) {
            Some(record) => {
                record.status = status;
                Ok(())
            }
            None => Err(StoreError::Rejected(format!("no record with id {id}"))),
        }
    }

    async fn insert_items(&self, items: &[MenuItem]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.items.extend_from_slice(items);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn pending(id: &str) -> SourceRecord {
        SourceRecord::new(id, Map::new())
    }

    #[tokio::test]
    async fn list_returns_only_matching_status() {
        let store = MemoryRecordStore::new();
        store.seed(pending("a"));
        let mut done = pending("b");
        done.status = RecordStatus::Done;
        store.seed(done);

        let listed = store.list_by_status(RecordStatus::Pending).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "a");
    }

    #[tokio::test]
    async fn claim_moves_pending_to_working_once() {
        let store = MemoryRecordStore::new();
        store.seed(pending("a"));

        assert!(store.claim("a").await.unwrap());
        assert_eq!(store.status_of("a"), Some(RecordStatus::Working));
        // A second claim observes the record as no longer pending.
        assert!(!store.claim("a").await.unwrap());
    }

    #[tokio::test]
    async fn claim_of_unknown_record_is_a_miss() {
        let store = MemoryRecordStore::new();
        assert!(!store.claim("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn racing_claims_have_exactly_one_winner() {
        let store = MemoryRecordStore::new();
        store.seed(pending("contested"));

        let s1 = store.clone();
        let s2 = store.clone();
        let (first, second) = tokio::join!(
            tokio::spawn(async move { s1.claim("contested").await.unwrap() }),
            tokio::spawn(async move { s2.claim("contested").await.unwrap() }),
        );
        let wins = [first.unwrap(), second.unwrap()]
            .iter()
            .filter(|&&won| won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(store.status_of("contested"), Some(RecordStatus::Working));
    }

    #[tokio::test]
    async fn update_status_of_unknown_record_is_rejected() {
        let store = MemoryRecordStore::new();
        let err = store
            .update_status("ghost", RecordStatus::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }
}
