//! loadcore - Load Lifecycle State Machine
//!
//! Governs how a freight load moves through its operational states,
//! keeps an immutable audit trail of every transition, and announces
//! state changes to downstream consumers.
//!
//! # Modules
//!
//! - [`core_types`] - Identifier newtypes (LoadId, HistoryRecordId, GeoPoint)
//! - [`status`] - The closed lifecycle status enumeration
//! - [`rules`] - Static transition rule table (pure data, built once)
//! - [`models`] - Load and status history record types
//! - [`error`] - Error taxonomy
//! - [`events`] - Event envelope and publisher seam
//! - [`store`] - Transactional persistence boundary (Postgres + in-memory)
//! - [`service`] - The lifecycle orchestrator (the only status-mutation path)
//! - [`config`] / [`logging`] - Process bootstrap

pub mod config;
pub mod core_types;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod rules;
pub mod service;
pub mod status;
pub mod store;

// Convenient re-exports at crate root
pub use core_types::{GeoPoint, HistoryRecordId, LoadId};
pub use error::{LifecycleError, PublishError};
pub use events::{EventEnvelope, EventPublisher, LoadStatusChanged, LogPublisher};
pub use models::{Load, LoadFilter, NewLoad, NewStatusRecord, StatusHistoryRecord, StatusUpdate};
pub use rules::{TRANSITION_RULES, TransitionRuleTable};
pub use service::LoadLifecycleService;
pub use status::{ALL_STATUSES, LoadStatus};
pub use store::{LifecycleStore, LifecycleTx, MemLifecycleStore, PgLifecycleStore};
