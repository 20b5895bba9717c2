//! Load Lifecycle Status Definitions
//!
//! Status IDs are designed for PostgreSQL storage as SMALLINT.
//! Terminal states: COMPLETED (140), CANCELLED (-20).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Load lifecycle states
///
/// The closed enumeration every load moves through. Reachability between
/// distinct states is defined by [`crate::rules::TransitionRuleTable`];
/// this enum carries no transition logic of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum LoadStatus {
    /// Initial state - load entered by the shipper, not yet posted
    Created = 0,

    /// Awaiting optimization or posting
    Pending = 10,

    /// Route/rate optimization in progress
    Optimizing = 20,

    /// Posted to the board, bookable by carriers
    Available = 30,

    /// Held by a carrier, pending assignment confirmation
    Reserved = 40,

    /// Driver assigned, not yet moving
    Assigned = 50,

    /// Moving toward pickup or dropoff
    InTransit = 60,

    /// Arrived at the pickup facility
    AtPickup = 70,

    /// Freight on board, departing pickup
    Loaded = 80,

    /// Behind schedule, still recoverable
    Delayed = 90,

    /// Operational problem requiring intervention
    Exception = 100,

    /// Exception closed out, resuming normal flow
    Resolved = 110,

    /// Arrived at the dropoff facility
    AtDropoff = 120,

    /// Freight handed over, paperwork pending
    Delivered = 130,

    /// Terminal: delivered and settled
    Completed = 140,

    /// Posting lapsed without a booking; may be re-posted
    Expired = -10,

    /// Terminal: cancelled at any point before completion
    Cancelled = -20,
}

/// Every status, in id order. Used to zero-initialize count maps and to
/// iterate the full graph in tests.
pub const ALL_STATUSES: [LoadStatus; 17] = [
    LoadStatus::Cancelled,
    LoadStatus::Expired,
    LoadStatus::Created,
    LoadStatus::Pending,
    LoadStatus::Optimizing,
    LoadStatus::Available,
    LoadStatus::Reserved,
    LoadStatus::Assigned,
    LoadStatus::InTransit,
    LoadStatus::AtPickup,
    LoadStatus::Loaded,
    LoadStatus::Delayed,
    LoadStatus::Exception,
    LoadStatus::Resolved,
    LoadStatus::AtDropoff,
    LoadStatus::Delivered,
    LoadStatus::Completed,
];

impl LoadStatus {
    /// Check if this is a terminal state (no outgoing transitions)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadStatus::Completed | LoadStatus::Cancelled)
    }

    /// Get the numeric status ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from PostgreSQL status ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(LoadStatus::Created),
            10 => Some(LoadStatus::Pending),
            20 => Some(LoadStatus::Optimizing),
            30 => Some(LoadStatus::Available),
            40 => Some(LoadStatus::Reserved),
            50 => Some(LoadStatus::Assigned),
            60 => Some(LoadStatus::InTransit),
            70 => Some(LoadStatus::AtPickup),
            80 => Some(LoadStatus::Loaded),
            90 => Some(LoadStatus::Delayed),
            100 => Some(LoadStatus::Exception),
            110 => Some(LoadStatus::Resolved),
            120 => Some(LoadStatus::AtDropoff),
            130 => Some(LoadStatus::Delivered),
            140 => Some(LoadStatus::Completed),
            -10 => Some(LoadStatus::Expired),
            -20 => Some(LoadStatus::Cancelled),
            _ => None,
        }
    }

    /// Get the wire/API name (snake_case, matches serde form)
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Created => "created",
            LoadStatus::Pending => "pending",
            LoadStatus::Optimizing => "optimizing",
            LoadStatus::Available => "available",
            LoadStatus::Reserved => "reserved",
            LoadStatus::Assigned => "assigned",
            LoadStatus::InTransit => "in_transit",
            LoadStatus::AtPickup => "at_pickup",
            LoadStatus::Loaded => "loaded",
            LoadStatus::Delayed => "delayed",
            LoadStatus::Exception => "exception",
            LoadStatus::Resolved => "resolved",
            LoadStatus::AtDropoff => "at_dropoff",
            LoadStatus::Delivered => "delivered",
            LoadStatus::Completed => "completed",
            LoadStatus::Expired => "expired",
            LoadStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for LoadStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        LoadStatus::from_id(value).ok_or(())
    }
}

impl FromStr for LoadStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STATUSES
            .iter()
            .find(|st| st.as_str() == s)
            .copied()
            .ok_or(())
    }
}
