//! Record store gateway: typed access to the source-record collection and
//! the append-only derived-item collection.
//!
//! Each operation is independently atomic; no transaction spans calls. The
//! pipeline depends on the [`RecordStore`] trait so tests can run against
//! the in-memory implementation.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use thiserror::Error;

use crate::record::{MenuItem, RecordStatus, SourceRecord};

/// Failure from the record store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored status value that is not part of the state machine.
    #[error("record {id} has invalid status {value:?}")]
    InvalidStatus { id: String, value: String },

    /// The backend rejected a write (e.g. unknown record id).
    #[error("write rejected: {0}")]
    Rejected(String),
}

pub trait RecordStore {
    /// Finite snapshot of all records currently in `status`.
    fn list_by_status(
        &self,
        status: RecordStatus,
    ) -> impl Future<Output = Result<Vec<SourceRecord>, StoreError>>;

    /// Atomically move a record from `pending` to `working`.
    ///
    /// Returns `Ok(false)` when the record is no longer pending (claimed by
    /// another pass or already terminal), so racing claimants get exactly
    /// one winner.
    fn claim(&self, id: &str) -> impl Future<Output = Result<bool, StoreError>>;

    /// Unconditional status write for an existing record.
    fn update_status(
        &self,
        id: &str,
        status: RecordStatus,
    ) -> impl Future<Output = Result<(), StoreError>>;

    /// Bulk-insert derived items as one atomic write.
    fn insert_items(&self, items: &[MenuItem]) -> impl Future<Output = Result<(), StoreError>>;
}

pub use postgres::PgRecordStore;
