//! Transition Rule Table
//!
//! The legal status graph as pure data: one static adjacency table built
//! once at startup and shared by reference. No per-call allocation, no
//! hidden mutation points. Same-state requests are NOT edges here; the
//! service layer treats them as idempotent no-ops.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::status::{ALL_STATUSES, LoadStatus};

/// Edge list: status -> statuses reachable in one hop.
/// Terminal states (completed, cancelled) have no outgoing edges.
const EDGES: &[(LoadStatus, &[LoadStatus])] = &[
    (
        LoadStatus::Created,
        &[LoadStatus::Pending, LoadStatus::Cancelled],
    ),
    (
        LoadStatus::Pending,
        &[
            LoadStatus::Optimizing,
            LoadStatus::Available,
            LoadStatus::Cancelled,
        ],
    ),
    (
        LoadStatus::Optimizing,
        &[LoadStatus::Available, LoadStatus::Cancelled],
    ),
    (
        LoadStatus::Available,
        &[
            LoadStatus::Reserved,
            LoadStatus::Cancelled,
            LoadStatus::Expired,
        ],
    ),
    (
        LoadStatus::Reserved,
        &[
            LoadStatus::Assigned,
            LoadStatus::Available,
            LoadStatus::Cancelled,
        ],
    ),
    (
        LoadStatus::Assigned,
        &[LoadStatus::InTransit, LoadStatus::Cancelled],
    ),
    (
        LoadStatus::InTransit,
        &[
            LoadStatus::AtPickup,
            LoadStatus::Delayed,
            LoadStatus::Cancelled,
        ],
    ),
    (
        LoadStatus::AtPickup,
        &[
            LoadStatus::Loaded,
            LoadStatus::Exception,
            LoadStatus::Cancelled,
        ],
    ),
    (
        LoadStatus::Loaded,
        &[LoadStatus::InTransit, LoadStatus::Cancelled],
    ),
    (
        LoadStatus::Delayed,
        &[LoadStatus::InTransit, LoadStatus::Cancelled],
    ),
    (
        LoadStatus::Exception,
        &[LoadStatus::Resolved, LoadStatus::Cancelled],
    ),
    (
        LoadStatus::Resolved,
        &[
            LoadStatus::AtPickup,
            LoadStatus::AtDropoff,
            LoadStatus::Cancelled,
        ],
    ),
    (
        LoadStatus::AtDropoff,
        &[
            LoadStatus::Delivered,
            LoadStatus::Exception,
            LoadStatus::Cancelled,
        ],
    ),
    (
        LoadStatus::Delivered,
        &[LoadStatus::Completed, LoadStatus::Exception],
    ),
    (LoadStatus::Expired, &[LoadStatus::Available]),
    (LoadStatus::Completed, &[]),
    (LoadStatus::Cancelled, &[]),
];

/// Static directed graph of legal status transitions
///
/// Total over [`LoadStatus`]: every status has an entry, possibly empty.
/// Pure lookup, no side effects, no failure modes.
pub struct TransitionRuleTable {
    edges: FxHashMap<LoadStatus, &'static [LoadStatus]>,
}

impl TransitionRuleTable {
    fn build() -> Self {
        let mut edges = FxHashMap::default();
        for (from, to) in EDGES {
            edges.insert(*from, *to);
        }
        debug_assert_eq!(edges.len(), ALL_STATUSES.len(), "rule table must be total");
        Self { edges }
    }

    /// Is `from -> to` a legal one-hop transition between DISTINCT states?
    ///
    /// `allowed(s, s)` is false for every `s`; the same-state no-op lives
    /// in [`crate::service::LoadLifecycleService`], not in the graph.
    pub fn allowed(&self, from: LoadStatus, to: LoadStatus) -> bool {
        self.edges
            .get(&from)
            .is_some_and(|next| next.contains(&to))
    }

    /// Statuses reachable from `from` in one hop (empty for terminal states)
    pub fn next_states(&self, from: LoadStatus) -> &'static [LoadStatus] {
        self.edges.get(&from).copied().unwrap_or(&[])
    }

    /// Serializable view of the whole table, for client-side validation/UX.
    /// Keys are ordered by status id so output is stable.
    pub fn to_map(&self) -> BTreeMap<LoadStatus, Vec<LoadStatus>> {
        ALL_STATUSES
            .iter()
            .map(|s| (*s, self.next_states(*s).to_vec()))
            .collect()
    }
}

/// The process-wide rule table, built once on first use
pub static TRANSITION_RULES: Lazy<TransitionRuleTable> = Lazy::new(TransitionRuleTable::build);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_total() {
        for status in ALL_STATUSES {
            // next_states never panics and terminal states are empty
            let next = TRANSITION_RULES.next_states(status);
            if status.is_terminal() {
                assert!(next.is_empty(), "{status} must have no outgoing edges");
            } else {
                assert!(!next.is_empty(), "{status} must have outgoing edges");
            }
        }
    }

    #[test]
    fn test_known_edges() {
        let t = &*TRANSITION_RULES;
        assert!(t.allowed(LoadStatus::Created, LoadStatus::Pending));
        assert!(t.allowed(LoadStatus::Available, LoadStatus::Reserved));
        assert!(t.allowed(LoadStatus::Reserved, LoadStatus::Available)); // carrier backs out
        assert!(t.allowed(LoadStatus::Expired, LoadStatus::Available)); // re-post
        assert!(t.allowed(LoadStatus::Delayed, LoadStatus::InTransit)); // recovery
        assert!(t.allowed(LoadStatus::Delivered, LoadStatus::Exception)); // paperwork dispute
        assert!(t.allowed(LoadStatus::Delivered, LoadStatus::Completed));
    }

    #[test]
    fn test_known_non_edges() {
        let t = &*TRANSITION_RULES;
        assert!(!t.allowed(LoadStatus::Pending, LoadStatus::Assigned)); // must go through the board
        assert!(!t.allowed(LoadStatus::Created, LoadStatus::Delivered));
        assert!(!t.allowed(LoadStatus::Delivered, LoadStatus::Cancelled)); // too late to cancel
        assert!(!t.allowed(LoadStatus::Expired, LoadStatus::Cancelled));
    }

    #[test]
    fn test_self_transition_never_an_edge() {
        for status in ALL_STATUSES {
            assert!(
                !TRANSITION_RULES.allowed(status, status),
                "{status} -> {status} must not be a table edge"
            );
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for to in ALL_STATUSES {
            assert!(!TRANSITION_RULES.allowed(LoadStatus::Completed, to));
            assert!(!TRANSITION_RULES.allowed(LoadStatus::Cancelled, to));
        }
    }

    #[test]
    fn test_exhaustive_against_edge_list() {
        // allowed() must agree with the raw edge list for every pair
        for from in ALL_STATUSES {
            let listed = EDGES
                .iter()
                .find(|(f, _)| *f == from)
                .map(|(_, to)| *to)
                .unwrap();
            for to in ALL_STATUSES {
                assert_eq!(
                    TRANSITION_RULES.allowed(from, to),
                    listed.contains(&to),
                    "mismatch for {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_map_view_serializes() {
        let map = TRANSITION_RULES.to_map();
        assert_eq!(map.len(), 17);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["created"], serde_json::json!(["pending", "cancelled"]));
        assert_eq!(json["completed"], serde_json::json!([]));
    }
}
