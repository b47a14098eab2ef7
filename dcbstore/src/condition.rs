//! Append conditions: query-scoped optimistic concurrency control.
//!
//! An [`AppendCondition`] defines a consistency boundary for an append. The
//! boundary is expressed as a query rather than a fixed stream identity: the
//! append is rejected when any event committed after the reference position
//! matches the condition's query.

use crate::query::Query;
use crate::types::Position;
use serde::{Deserialize, Serialize};

/// A consistency boundary for a conditional append.
///
/// The append fails with an integrity error when any committed event with a
/// position greater than `after` matches `fail_if_events_match`. An absent
/// `after` means no matching event may exist anywhere in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendCondition {
    /// Query that must not match any event committed after `after`.
    pub fail_if_events_match: Query,
    /// Reference position; the check covers everything committed after it.
    pub after: Option<Position>,
}

impl AppendCondition {
    /// Creates a condition checked from the very first position.
    pub const fn new(fail_if_events_match: Query) -> Self {
        Self {
            fail_if_events_match,
            after: None,
        }
    }

    /// Sets the reference position the check starts after.
    #[must_use]
    pub const fn after(mut self, after: Option<Position>) -> Self {
        self.after = after;
        self
    }
}
