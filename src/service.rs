//! Load Lifecycle Service
//!
//! The orchestrator and the only caller-facing path that mutates a
//! load's status. Validates the requested transition against the static
//! rule table, patches the load and appends the ledger record inside one
//! store transaction, and publishes the change after commit.
//!
//! Invoked concurrently by many request handlers; holds no in-process
//! locks. Serialization of racing writers on the same load is delegated
//! to the store's transaction (row locks in Postgres).

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::core_types::LoadId;
use crate::error::LifecycleError;
use crate::events::{
    EventEnvelope, EventPublisher, LOAD_STATUS_EVENT_TYPE, LOAD_STATUS_TOPIC, LoadStatusChanged,
};
use crate::models::{Load, LoadFilter, NewLoad, NewStatusRecord, StatusHistoryRecord, StatusUpdate};
use crate::rules::{TRANSITION_RULES, TransitionRuleTable};
use crate::status::{ALL_STATUSES, LoadStatus};
use crate::store::LifecycleStore;

/// Load lifecycle orchestrator
pub struct LoadLifecycleService {
    store: Arc<dyn LifecycleStore>,
    publisher: Arc<dyn EventPublisher>,
    /// Producer name stamped on outbound envelopes
    producer: String,
}

impl LoadLifecycleService {
    pub fn new(
        store: Arc<dyn LifecycleStore>,
        publisher: Arc<dyn EventPublisher>,
        producer: impl Into<String>,
    ) -> Self {
        Self {
            store,
            publisher,
            producer: producer.into(),
        }
    }

    /// Create a load in `created` status with its first ledger record
    ///
    /// Insert and initial append share one transaction, so every load
    /// the store knows about has a non-empty ledger.
    pub async fn create_load(
        &self,
        new_load: NewLoad,
        actor: impl Into<String>,
    ) -> Result<Load, LifecycleError> {
        let actor = actor.into();
        let load = new_load.into_load(LoadId::new(), chrono::Utc::now());

        let mut tx = self.store.begin().await?;
        tx.insert_load(&load).await?;
        tx.append_history(NewStatusRecord {
            load_id: load.load_id,
            status: LoadStatus::Created,
            details: serde_json::Value::Null,
            actor: actor.clone(),
            location: None,
        })
        .await?;
        tx.commit().await?;

        info!(load_id = %load.load_id, shipper_id = %load.shipper_id, actor = %actor, "Load created");

        self.publish_change(&load, None, serde_json::Value::Null, None)
            .await;

        Ok(load)
    }

    /// Move a load to `requested` status
    ///
    /// `current == requested` is an idempotent no-op: accepted without a
    /// rule-table check, and the ledger still gains a record so repeated
    /// confirmations stay visible. Downstream retries depend on this.
    ///
    /// The read, the validation, the status patch, and the ledger append
    /// all run inside one store transaction. Event publication happens
    /// only after commit and cannot fail the call.
    pub async fn update_status(
        &self,
        load_id: LoadId,
        requested: LoadStatus,
        update: StatusUpdate,
    ) -> Result<Load, LifecycleError> {
        let mut tx = self.store.begin().await?;

        let load = tx
            .get_for_update(load_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(load_id.to_string()))?;
        let previous = load.status;

        if previous != requested && !TRANSITION_RULES.allowed(previous, requested) {
            debug!(
                load_id = %load_id,
                from = %previous,
                to = %requested,
                "Transition rejected"
            );
            // tx dropped here - rollback
            return Err(LifecycleError::InvalidTransition {
                from: previous,
                to: requested,
            });
        }

        let updated = tx.patch_status(load_id, requested).await?;
        tx.append_history(NewStatusRecord {
            load_id,
            status: requested,
            details: update.details.clone(),
            actor: update.actor.clone(),
            location: update.location,
        })
        .await?;
        tx.commit().await?;

        info!(
            load_id = %load_id,
            from = %previous,
            to = %requested,
            actor = %update.actor,
            "Status updated"
        );

        self.publish_change(&updated, Some(previous), update.details, update.correlation_id)
            .await;

        Ok(updated)
    }

    /// Full audit trail for one load, oldest first
    pub async fn get_status_history(
        &self,
        load_id: LoadId,
    ) -> Result<Vec<StatusHistoryRecord>, LifecycleError> {
        self.store.history(load_id).await
    }

    /// Current status, derived from the ledger tail
    pub async fn get_current_status(&self, load_id: LoadId) -> Result<LoadStatus, LifecycleError> {
        self.store
            .current_status(load_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(load_id.to_string()))
    }

    /// Fetch one load
    pub async fn get_load(&self, load_id: LoadId) -> Result<Load, LifecycleError> {
        self.store
            .get(load_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(load_id.to_string()))
    }

    /// Loads per status, every known status present (zero when empty)
    pub async fn get_status_counts(
        &self,
        filter: Option<LoadFilter>,
    ) -> Result<FxHashMap<LoadStatus, i64>, LifecycleError> {
        let mut counts: FxHashMap<LoadStatus, i64> =
            ALL_STATUSES.iter().map(|s| (*s, 0)).collect();

        let actual = self
            .store
            .status_counts(&filter.unwrap_or_default())
            .await?;
        for (status, count) in actual {
            counts.insert(status, count);
        }
        Ok(counts)
    }

    /// The full transition rule table, read-only
    pub fn transition_rules(&self) -> &'static TransitionRuleTable {
        &TRANSITION_RULES
    }

    /// Remove a load and its entire ledger
    pub async fn delete_load(&self, load_id: LoadId) -> Result<(), LifecycleError> {
        if !self.store.delete(load_id).await? {
            return Err(LifecycleError::NotFound(load_id.to_string()));
        }
        info!(load_id = %load_id, "Load deleted (history purged)");
        Ok(())
    }

    /// Fire-and-forget publication after a committed write
    async fn publish_change(
        &self,
        load: &Load,
        previous: Option<LoadStatus>,
        details: serde_json::Value,
        correlation_id: Option<String>,
    ) {
        let payload = LoadStatusChanged {
            load_id: load.load_id,
            previous_status: previous,
            new_status: load.status,
            details,
        };
        let payload = match serde_json::to_value(&payload) {
            Ok(v) => v,
            Err(e) => {
                warn!(load_id = %load.load_id, error = %e, "Failed to serialize status event");
                return;
            }
        };

        let envelope = EventEnvelope::new(LOAD_STATUS_EVENT_TYPE, &self.producer, payload)
            .with_correlation_id(correlation_id);

        if let Err(e) = self.publisher.publish(LOAD_STATUS_TOPIC, envelope).await {
            // At-least-once side channel: the write is committed, the
            // caller still gets the updated load.
            warn!(
                load_id = %load.load_id,
                new_status = %load.status,
                error = %e,
                "Event publish failed after commit"
            );
        }
    }
}
