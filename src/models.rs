//! Load and Ledger Models
//!
//! The stored `Load` record, the immutable `StatusHistoryRecord` audit
//! entry, and the request-side context types the service consumes.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::{GeoPoint, HistoryRecordId, LoadId};
use crate::status::LoadStatus;

/// One shipment unit tracked through its operational lifecycle
///
/// `status` is only ever mutated through
/// [`crate::service::LoadLifecycleService`]; no other code path writes it.
/// Invariant: `status` equals the status of the newest
/// [`StatusHistoryRecord`] for this load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub load_id: LoadId,
    /// Owning shipper, referenced by identifier only
    pub shipper_id: uuid::Uuid,
    /// Assigned driver, referenced by identifier only
    pub assigned_driver_id: Option<uuid::Uuid>,
    pub equipment_type: Option<String>,
    pub weight_lbs: Option<i32>,
    pub rate: Option<Decimal>,
    pub status: LoadStatus,
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last status mutation
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Load[{}] shipper={} status={}",
            self.load_id, self.shipper_id, self.status
        )
    }
}

/// Attributes for a brand-new load; status and timestamps are assigned
/// by the service (loads are always born in `created`).
#[derive(Debug, Clone, Default)]
pub struct NewLoad {
    pub shipper_id: uuid::Uuid,
    pub equipment_type: Option<String>,
    pub weight_lbs: Option<i32>,
    pub rate: Option<Decimal>,
}

impl NewLoad {
    pub fn new(shipper_id: uuid::Uuid) -> Self {
        Self {
            shipper_id,
            ..Default::default()
        }
    }

    /// Materialize the stored record in the initial state
    pub fn into_load(self, load_id: LoadId, now: DateTime<Utc>) -> Load {
        Load {
            load_id,
            shipper_id: self.shipper_id,
            assigned_driver_id: None,
            equipment_type: self.equipment_type,
            weight_lbs: self.weight_lbs,
            rate: self.rate,
            status: LoadStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One immutable audit entry: who moved the load where, when, and why
///
/// Created exactly once per accepted transition. Never updated or
/// deleted except by whole-load cascading purge. Per-load order is
/// insertion sequence, not the clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryRecord {
    pub record_id: HistoryRecordId,
    pub load_id: LoadId,
    /// The state entered by this transition
    pub status: LoadStatus,
    /// Free-form structured context (reason, message)
    pub details: serde_json::Value,
    /// Who or what performed the transition
    pub actor: String,
    pub location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

/// Ledger insert payload; `record_id` and `created_at` are assigned at
/// append time.
#[derive(Debug, Clone)]
pub struct NewStatusRecord {
    pub load_id: LoadId,
    pub status: LoadStatus,
    pub details: serde_json::Value,
    pub actor: String,
    pub location: Option<GeoPoint>,
}

/// Caller-supplied context for one status transition request
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    /// Free-form structured context, lands in the ledger and the event
    pub details: serde_json::Value,
    pub actor: String,
    pub location: Option<GeoPoint>,
    /// Propagated into the event envelope for tracing across services
    pub correlation_id: Option<String>,
}

impl StatusUpdate {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            details: serde_json::Value::Null,
            actor: actor.into(),
            location: None,
            correlation_id: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_location(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_correlation_id(mut self, cid: impl Into<String>) -> Self {
        self.correlation_id = Some(cid.into());
        self
    }
}

/// Optional scoping for aggregate reads ([`crate::service::LoadLifecycleService::get_status_counts`])
#[derive(Debug, Clone, Default)]
pub struct LoadFilter {
    pub shipper_id: Option<uuid::Uuid>,
    pub assigned_driver_id: Option<uuid::Uuid>,
}

impl LoadFilter {
    /// Does `load` fall inside this filter?
    pub fn matches(&self, load: &Load) -> bool {
        if let Some(shipper) = self.shipper_id
            && load.shipper_id != shipper
        {
            return false;
        }
        if let Some(driver) = self.assigned_driver_id
            && load.assigned_driver_id != Some(driver)
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_load_starts_created() {
        let shipper = uuid::Uuid::new_v4();
        let load_id = LoadId::new();
        let now = Utc::now();
        let load = NewLoad::new(shipper).into_load(load_id, now);

        assert_eq!(load.load_id, load_id);
        assert_eq!(load.shipper_id, shipper);
        assert_eq!(load.status, LoadStatus::Created);
        assert_eq!(load.created_at, load.updated_at);
        assert!(load.assigned_driver_id.is_none());
    }

    #[test]
    fn test_status_update_builder() {
        let update = StatusUpdate::new("dispatcher:42")
            .with_details(serde_json::json!({"reason": "carrier confirmed"}))
            .with_location(GeoPoint::new(41.88, -87.63))
            .with_correlation_id("req-123");

        assert_eq!(update.actor, "dispatcher:42");
        assert_eq!(update.details["reason"], "carrier confirmed");
        assert!(update.location.is_some());
        assert_eq!(update.correlation_id.as_deref(), Some("req-123"));
    }

    #[test]
    fn test_load_filter() {
        let shipper = uuid::Uuid::new_v4();
        let driver = uuid::Uuid::new_v4();
        let mut load = NewLoad::new(shipper).into_load(LoadId::new(), Utc::now());
        load.assigned_driver_id = Some(driver);

        assert!(LoadFilter::default().matches(&load));
        assert!(
            LoadFilter {
                shipper_id: Some(shipper),
                assigned_driver_id: Some(driver),
            }
            .matches(&load)
        );
        assert!(
            !LoadFilter {
                shipper_id: Some(uuid::Uuid::new_v4()),
                ..Default::default()
            }
            .matches(&load)
        );
    }
}
