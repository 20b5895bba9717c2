//! Persistence Boundary
//!
//! `LifecycleStore` is the transactional contract the service consumes:
//! reads inside a transaction are consistent with the subsequent write,
//! and the load patch plus the history append commit or roll back as one.
//!
//! Dropping a [`LifecycleTx`] without calling `commit` rolls it back.

use async_trait::async_trait;
use rustc_hash::FxHashMap;

use crate::core_types::LoadId;
use crate::error::LifecycleError;
use crate::models::{Load, LoadFilter, NewStatusRecord, StatusHistoryRecord};
use crate::status::LoadStatus;

pub mod mem;
pub mod pg;

pub use mem::MemLifecycleStore;
pub use pg::PgLifecycleStore;

/// Transactional store for loads and their status history ledger
#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// Open a transaction. Concurrent transactions on DIFFERENT loads
    /// must not block each other; serialization per load is the
    /// implementation's responsibility (row locks, or equivalent).
    async fn begin(&self) -> Result<Box<dyn LifecycleTx>, LifecycleError>;

    /// Non-locking read of one load
    async fn get(&self, load_id: LoadId) -> Result<Option<Load>, LifecycleError>;

    /// Full ledger for one load, oldest first (insertion order)
    async fn history(&self, load_id: LoadId) -> Result<Vec<StatusHistoryRecord>, LifecycleError>;

    /// Status of the newest ledger record, None if the load has none
    async fn current_status(
        &self,
        load_id: LoadId,
    ) -> Result<Option<LoadStatus>, LifecycleError>;

    /// Count of loads per status, statuses with zero loads omitted
    /// (the service overlays these onto a zero-initialized map)
    async fn status_counts(
        &self,
        filter: &LoadFilter,
    ) -> Result<FxHashMap<LoadStatus, i64>, LifecycleError>;

    /// Remove a load and, by cascade, its entire ledger.
    /// Returns false if the load did not exist.
    async fn delete(&self, load_id: LoadId) -> Result<bool, LifecycleError>;
}

/// One open transaction
///
/// All writes performed through a transaction become visible only at
/// `commit`. Reads observe the transaction's own pending writes.
#[async_trait]
pub trait LifecycleTx: Send {
    /// Read one load, taking a write lock on it for the lifetime of the
    /// transaction (`SELECT ... FOR UPDATE` semantics)
    async fn get_for_update(&mut self, load_id: LoadId) -> Result<Option<Load>, LifecycleError>;

    /// Insert a brand-new load record
    async fn insert_load(&mut self, load: &Load) -> Result<(), LifecycleError>;

    /// Set the load's status and bump `updated_at`
    async fn patch_status(
        &mut self,
        load_id: LoadId,
        status: LoadStatus,
    ) -> Result<Load, LifecycleError>;

    /// Append one immutable record to the ledger
    async fn append_history(
        &mut self,
        record: NewStatusRecord,
    ) -> Result<StatusHistoryRecord, LifecycleError>;

    async fn commit(self: Box<Self>) -> Result<(), LifecycleError>;
}
