//! The event store boundary contract.
//!
//! This module defines the [`EventStore`] trait implemented by storage
//! backends. The trait is backend-independent: it deals in events, queries,
//! and positions, and leaves persistence, replication, and transport to the
//! implementation.

use crate::condition::AppendCondition;
use crate::errors::StoreResult;
use crate::event::{Event, SequencedEvent};
use crate::query::Query;
use crate::types::Position;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A lazy sequence of read results.
///
/// The stream borrows nothing from the store: dropping it cancels the read
/// and releases any tail-waiting registration promptly.
pub type EventStream = BoxStream<'static, StoreResult<SequencedEvent>>;

/// Configuration for a read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Position to start from. Forward reads treat it as inclusive and
    /// default to the first position; backward reads treat it as exclusive
    /// and default to the current head.
    pub start: Option<Position>,
    /// Read in descending position order.
    pub backwards: bool,
    /// Maximum number of events to deliver (None = no limit).
    pub limit: Option<usize>,
    /// Keep the stream open and deliver new matching events as they commit.
    pub subscribe: bool,
}

impl ReadOptions {
    /// Creates read options with default values: forward, unbounded, from
    /// the first position.
    pub const fn new() -> Self {
        Self {
            start: None,
            backwards: false,
            limit: None,
            subscribe: false,
        }
    }

    /// Sets the starting position.
    #[must_use]
    pub const fn from_position(mut self, start: Position) -> Self {
        self.start = Some(start);
        self
    }

    /// Reads in descending position order.
    #[must_use]
    pub const fn backwards(mut self) -> Self {
        self.backwards = true;
        self
    }

    /// Caps the number of delivered events.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Tails the store for new matching events after the catch-up phase.
    #[must_use]
    pub const fn subscribe(mut self) -> Self {
        self.subscribe = true;
        self
    }
}

/// The core event store trait that all implementations must satisfy.
///
/// Implementations must commit append batches in a strict total order with
/// contiguous positions, and must make the condition check and the position
/// assignment of a conditional append atomic with respect to concurrent
/// appends. Failed appends leave the store unchanged.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events, optionally guarded by a condition.
    ///
    /// Returns the position of the last event in the committed batch. When
    /// every event in the batch carries an `event_id` and the identical
    /// batch was already committed under an equal condition, the previously
    /// assigned position is returned and nothing is appended.
    ///
    /// # Errors
    ///
    /// * [`StoreError::Integrity`](crate::StoreError::Integrity) - the
    ///   condition's query matched an event committed after its reference
    ///   position, or an idempotent retry was ambiguous.
    /// * [`StoreError::InvalidArgument`](crate::StoreError::InvalidArgument) -
    ///   the batch was empty or carried duplicate event ids.
    async fn append(
        &self,
        events: Vec<Event>,
        condition: Option<AppendCondition>,
    ) -> StoreResult<Position>;

    /// Reads matching events as a lazy stream.
    ///
    /// `query: None` matches every event. Bounded reads observe a snapshot
    /// of the positions committed at call time; a subscribing read keeps
    /// delivering matching events as they commit, in position order.
    ///
    /// # Errors
    ///
    /// * [`StoreError::InvalidArgument`](crate::StoreError::InvalidArgument) -
    ///   `backwards` was combined with `subscribe`.
    async fn read(&self, query: Option<Query>, options: &ReadOptions) -> StoreResult<EventStream>;

    /// Returns the highest assigned position, or `None` for an empty store.
    async fn head(&self) -> StoreResult<Option<Position>>;
}
