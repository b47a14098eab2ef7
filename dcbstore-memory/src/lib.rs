//! In-memory implementation of the `dcbstore` consistency engine.
//!
//! This crate provides [`InMemoryEventStore`], a complete lock-based
//! implementation of the [`EventStore`] trait: an append-only position
//! ledger with tag/type indexes, whole-batch idempotent retries, append
//! condition enforcement, and lazy forward/backward/tailing read cursors.
//!
//! The append path is the single serialization point: idempotency
//! resolution, the condition's existence check, position assignment, and
//! head publication all happen under one write-lock acquisition, so no two
//! concurrent appends can both pass a check against the same still-absent
//! conflicting event.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

mod cursor;
mod idempotency;
mod ledger;

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dcbstore::{
    AppendCondition, Event, EventStore, EventStream, Position, Query, ReadOptions, StoreError,
    StoreResult,
};
use tokio::sync::watch;
use tracing::{debug, instrument};

use crate::cursor::ReadCursor;
use crate::idempotency::IdempotencyIndex;
use crate::ledger::Ledger;

/// Thread-safe in-memory DCB event store.
///
/// Cloning is cheap and clones share storage, so one store can serve many
/// concurrent readers and writers.
#[derive(Clone)]
pub struct InMemoryEventStore {
    shared: Arc<SharedState>,
}

pub(crate) struct SharedState {
    pub(crate) state: RwLock<StoreState>,
    /// Current head, published inside the commit critical section so that
    /// tailing cursors never miss a commit.
    pub(crate) head_tx: watch::Sender<u64>,
}

pub(crate) struct StoreState {
    pub(crate) ledger: Ledger,
    pub(crate) idempotency: IdempotencyIndex,
}

impl InMemoryEventStore {
    /// Create a new empty in-memory event store.
    pub fn new() -> Self {
        let (head_tx, _) = watch::channel(0);
        Self {
            shared: Arc::new(SharedState {
                state: RwLock::new(StoreState {
                    ledger: Ledger::new(),
                    idempotency: IdempotencyIndex::new(),
                }),
                head_tx,
            }),
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_batch(events: &[Event]) -> StoreResult<()> {
    if events.is_empty() {
        return Err(StoreError::InvalidArgument(
            "append requires at least one event".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for event in events {
        if let Some(id) = event.event_id {
            if !seen.insert(id) {
                return Err(StoreError::InvalidArgument(format!(
                    "event id {id} appears more than once in the batch"
                )));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[instrument(skip(self, events, condition), fields(batch = events.len(), conditional = condition.is_some()))]
    async fn append(
        &self,
        events: Vec<Event>,
        condition: Option<AppendCondition>,
    ) -> StoreResult<Position> {
        validate_batch(&events)?;

        let mut state = self
            .shared
            .state
            .write()
            .map_err(|_| StoreError::Storage("event ledger lock poisoned".to_string()))?;
        let StoreState { ledger, idempotency } = &mut *state;

        if let Some(position) = idempotency.resolve(&events, condition.as_ref(), ledger)? {
            debug!(%position, "resolved idempotent retry without appending");
            return Ok(position);
        }

        if let Some(condition) = &condition {
            if ledger.exists_after(condition.after, &condition.fail_if_events_match) {
                debug!(after = ?condition.after, "append condition matched a committed event");
                return Err(StoreError::Integrity(
                    "events matching the append condition were committed after the reference position"
                        .to_string(),
                ));
            }
        }

        let (first, last) = ledger.append_batch(events);
        idempotency.record(ledger.batch(first, last), condition.as_ref());
        self.shared.head_tx.send_replace(u64::from(last));
        debug!(%first, %last, "committed batch");
        Ok(last)
    }

    #[instrument(skip(self, query, options), fields(backwards = options.backwards, subscribe = options.subscribe))]
    async fn read(&self, query: Option<Query>, options: &ReadOptions) -> StoreResult<EventStream> {
        if options.backwards && options.subscribe {
            return Err(StoreError::InvalidArgument(
                "subscribe cannot be combined with a backwards read".to_string(),
            ));
        }
        let query = query.unwrap_or_else(Query::all);
        let snapshot_head = {
            let state = self
                .shared
                .state
                .read()
                .map_err(|_| StoreError::Storage("event ledger lock poisoned".to_string()))?;
            state.ledger.head_value()
        };
        let cursor = ReadCursor::new(Arc::clone(&self.shared), query, options, snapshot_head);
        Ok(cursor.into_stream())
    }

    async fn head(&self) -> StoreResult<Option<Position>> {
        let state = self
            .shared
            .state
            .read()
            .map_err(|_| StoreError::Storage("event ledger lock poisoned".to_string()))?;
        Ok(state.ledger.head())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = InMemoryEventStore::new();
        assert_eq!(store.head().await.unwrap(), None);
    }

    #[tokio::test]
    async fn clone_shares_storage() {
        let store1 = InMemoryEventStore::new();
        let store2 = store1.clone();
        assert!(Arc::ptr_eq(&store1.shared, &store2.shared));

        store1
            .append(vec![Event::new("A", Vec::new())], None)
            .await
            .unwrap();
        assert_eq!(store2.head().await.unwrap(), Some(Position::first()));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_without_effect() {
        let store = InMemoryEventStore::new();
        let err = store.append(Vec::new(), None).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert_eq!(store.head().await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_event_ids_in_one_batch_are_rejected() {
        let store = InMemoryEventStore::new();
        let id = uuid::Uuid::new_v4();
        let events = vec![
            Event::new("A", Vec::new()).with_event_id(id),
            Event::new("B", Vec::new()).with_event_id(id),
        ];

        let err = store.append(events, None).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert_eq!(store.head().await.unwrap(), None);
    }

    #[tokio::test]
    async fn append_returns_the_last_position_of_the_batch() {
        let store = InMemoryEventStore::new();
        let last = store
            .append(
                vec![Event::new("A", Vec::new()), Event::new("B", Vec::new())],
                None,
            )
            .await
            .unwrap();
        assert_eq!(u64::from(last), 2);
        assert_eq!(store.head().await.unwrap(), Some(last));
    }
}
