//! Event records for the `dcbstore` engine.
//!
//! An [`Event`] is an immutable, caller-constructed record of something that
//! happened. Once committed it becomes a [`SequencedEvent`], which pairs the
//! event with its position in the store's total order.

use crate::types::Position;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event to be appended to the store.
///
/// Tags and the event type are arbitrary strings, matched case-sensitively
/// and never normalized. The optional `event_id` is used solely for
/// idempotent retries; an event without one is never deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The event type identifier.
    pub event_type: String,
    /// Opaque event payload.
    pub data: Vec<u8>,
    /// Tags for cross-cutting filtering, independent of the event type.
    pub tags: Vec<String>,
    /// Optional caller-supplied identifier for idempotency.
    pub event_id: Option<Uuid>,
}

impl Event {
    /// Creates a new event with the given type and payload.
    pub fn new(event_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            tags: Vec::new(),
            event_id: None,
        }
    }

    /// Replaces the event's tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Adds a single tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Sets the idempotency identifier.
    #[must_use]
    pub const fn with_event_id(mut self, event_id: Uuid) -> Self {
        self.event_id = Some(event_id);
        self
    }
}

/// An event that has been committed, together with its assigned position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    /// The committed event.
    pub event: Event,
    /// The event's position in the store's total order.
    pub position: Position,
}

impl SequencedEvent {
    /// Creates a new sequenced event.
    pub const fn new(event: Event, position: Position) -> Self {
        Self { event, position }
    }
}
