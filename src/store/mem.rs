//! In-Memory Store
//!
//! Full `LifecycleStore` implementation over a store-wide async mutex.
//! A transaction takes the owned guard, mutates a working copy, and
//! swaps it in at commit; dropping the transaction discards the copy.
//! That gives real rollback and read-your-writes semantics, at the cost
//! of serializing ALL transactions - fine for tests and demos, not for
//! production scale (the Postgres store locks per load).
//!
//! `fail_next_append` injects a one-shot persistence failure between the
//! status patch and the history append, for atomicity tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core_types::{HistoryRecordId, LoadId};
use crate::error::LifecycleError;
use crate::models::{Load, LoadFilter, NewStatusRecord, StatusHistoryRecord};
use crate::status::LoadStatus;
use crate::store::{LifecycleStore, LifecycleTx};

#[derive(Default, Clone)]
struct MemState {
    loads: FxHashMap<LoadId, Load>,
    /// Per-load ledger, insertion order
    history: FxHashMap<LoadId, Vec<StatusHistoryRecord>>,
}

/// In-memory lifecycle store
#[derive(Default)]
pub struct MemLifecycleStore {
    state: Arc<Mutex<MemState>>,
    fail_next_append: Arc<AtomicBool>,
}

impl MemLifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `append_history` fail once with a persistence error
    pub fn fail_next_append(&self) {
        self.fail_next_append.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LifecycleStore for MemLifecycleStore {
    async fn begin(&self) -> Result<Box<dyn LifecycleTx>, LifecycleError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemTx {
            guard,
            working,
            fail_next_append: self.fail_next_append.clone(),
        }))
    }

    async fn get(&self, load_id: LoadId) -> Result<Option<Load>, LifecycleError> {
        Ok(self.state.lock().await.loads.get(&load_id).cloned())
    }

    async fn history(&self, load_id: LoadId) -> Result<Vec<StatusHistoryRecord>, LifecycleError> {
        Ok(self
            .state
            .lock()
            .await
            .history
            .get(&load_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn current_status(
        &self,
        load_id: LoadId,
    ) -> Result<Option<LoadStatus>, LifecycleError> {
        Ok(self
            .state
            .lock()
            .await
            .history
            .get(&load_id)
            .and_then(|records| records.last())
            .map(|r| r.status))
    }

    async fn status_counts(
        &self,
        filter: &LoadFilter,
    ) -> Result<FxHashMap<LoadStatus, i64>, LifecycleError> {
        let state = self.state.lock().await;
        let mut counts = FxHashMap::default();
        for load in state.loads.values() {
            if filter.matches(load) {
                *counts.entry(load.status).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn delete(&self, load_id: LoadId) -> Result<bool, LifecycleError> {
        let mut state = self.state.lock().await;
        let existed = state.loads.remove(&load_id).is_some();
        state.history.remove(&load_id);
        Ok(existed)
    }
}

struct MemTx {
    guard: OwnedMutexGuard<MemState>,
    working: MemState,
    fail_next_append: Arc<AtomicBool>,
}

#[async_trait]
impl LifecycleTx for MemTx {
    async fn get_for_update(&mut self, load_id: LoadId) -> Result<Option<Load>, LifecycleError> {
        Ok(self.working.loads.get(&load_id).cloned())
    }

    async fn insert_load(&mut self, load: &Load) -> Result<(), LifecycleError> {
        if self.working.loads.contains_key(&load.load_id) {
            return Err(LifecycleError::Persistence(format!(
                "duplicate load_id: {}",
                load.load_id
            )));
        }
        self.working.loads.insert(load.load_id, load.clone());
        Ok(())
    }

    async fn patch_status(
        &mut self,
        load_id: LoadId,
        status: LoadStatus,
    ) -> Result<Load, LifecycleError> {
        let load = self
            .working
            .loads
            .get_mut(&load_id)
            .ok_or_else(|| LifecycleError::NotFound(load_id.to_string()))?;
        load.status = status;
        load.updated_at = Utc::now();
        Ok(load.clone())
    }

    async fn append_history(
        &mut self,
        record: NewStatusRecord,
    ) -> Result<StatusHistoryRecord, LifecycleError> {
        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(LifecycleError::Persistence(
                "injected append failure".to_string(),
            ));
        }

        let stored = StatusHistoryRecord {
            record_id: HistoryRecordId::new(),
            load_id: record.load_id,
            status: record.status,
            details: record.details,
            actor: record.actor,
            location: record.location,
            created_at: Utc::now(),
        };
        self.working
            .history
            .entry(record.load_id)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<(), LifecycleError> {
        let MemTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLoad;

    fn sample_load() -> Load {
        NewLoad::new(uuid::Uuid::new_v4()).into_load(LoadId::new(), Utc::now())
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = MemLifecycleStore::new();
        let load = sample_load();

        let mut tx = store.begin().await.unwrap();
        tx.insert_load(&load).await.unwrap();
        tx.commit().await.unwrap();

        assert!(store.get(load.load_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let store = MemLifecycleStore::new();
        let load = sample_load();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_load(&load).await.unwrap();
            tx.append_history(NewStatusRecord {
                load_id: load.load_id,
                status: LoadStatus::Created,
                details: serde_json::Value::Null,
                actor: "test".into(),
                location: None,
            })
            .await
            .unwrap();
            // dropped without commit
        }

        assert!(store.get(load.load_id).await.unwrap().is_none());
        assert!(store.history(load.load_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_your_writes_inside_tx() {
        let store = MemLifecycleStore::new();
        let load = sample_load();

        let mut tx = store.begin().await.unwrap();
        tx.insert_load(&load).await.unwrap();
        let seen = tx.get_for_update(load.load_id).await.unwrap();
        assert!(seen.is_some());
        drop(tx);
    }

    #[tokio::test]
    async fn test_injected_append_failure_is_one_shot() {
        let store = MemLifecycleStore::new();
        let load = sample_load();
        store.fail_next_append();

        let mut tx = store.begin().await.unwrap();
        tx.insert_load(&load).await.unwrap();
        let record = NewStatusRecord {
            load_id: load.load_id,
            status: LoadStatus::Created,
            details: serde_json::Value::Null,
            actor: "test".into(),
            location: None,
        };
        assert!(tx.append_history(record.clone()).await.is_err());
        assert!(tx.append_history(record).await.is_ok());
        drop(tx);
    }

    #[tokio::test]
    async fn test_delete_purges_history() {
        let store = MemLifecycleStore::new();
        let load = sample_load();

        let mut tx = store.begin().await.unwrap();
        tx.insert_load(&load).await.unwrap();
        tx.append_history(NewStatusRecord {
            load_id: load.load_id,
            status: LoadStatus::Created,
            details: serde_json::Value::Null,
            actor: "test".into(),
            location: None,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        assert!(store.delete(load.load_id).await.unwrap());
        assert!(!store.delete(load.load_id).await.unwrap());
        assert!(store.history(load.load_id).await.unwrap().is_empty());
    }
}
