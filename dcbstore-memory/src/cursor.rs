//! Lazy read cursors over the ledger.
//!
//! A cursor re-acquires the shared read lock for each step, so an open
//! stream never blocks appends or other reads. Tailing cursors wait on the
//! head watch channel; the sender publishes inside the commit critical
//! section, and `borrow_and_update` closes the window between releasing the
//! lock and waiting, so a commit can never slip past unobserved. Dropping
//! the stream drops the watch receiver, releasing the registration.

use std::sync::Arc;

use dcbstore::{EventStream, Query, ReadOptions, SequencedEvent, StoreError, StoreResult};
use tokio::sync::watch;

use crate::SharedState;

pub(crate) struct ReadCursor {
    shared: Arc<SharedState>,
    query: Query,
    backwards: bool,
    subscribe: bool,
    /// Exclusive lower bound for forward scans (last delivered position).
    after: u64,
    /// Exclusive upper bound for backward scans.
    below: u64,
    /// Snapshot head bounding non-subscribing forward reads.
    end: u64,
    remaining: Option<usize>,
    head_rx: watch::Receiver<u64>,
    done: bool,
}

enum Scan {
    Found(SequencedEvent),
    /// Nothing left to deliver; `head` is how far the scan looked.
    Drained { head: u64 },
}

impl ReadCursor {
    pub(crate) fn new(
        shared: Arc<SharedState>,
        query: Query,
        options: &ReadOptions,
        snapshot_head: u64,
    ) -> Self {
        let head_rx = shared.head_tx.subscribe();
        // Forward starts are inclusive, backward starts exclusive; a
        // defaulted backward start begins at the head itself.
        let after = options.start.map_or(0, |start| u64::from(start) - 1);
        let below = options.start.map_or(snapshot_head + 1, u64::from);
        Self {
            shared,
            query,
            backwards: options.backwards,
            subscribe: options.subscribe,
            after,
            below,
            end: snapshot_head,
            remaining: options.limit,
            head_rx,
            done: false,
        }
    }

    pub(crate) fn into_stream(self) -> EventStream {
        Box::pin(futures::stream::unfold(self, |mut cursor| async move {
            cursor.next_item().await.map(|item| (item, cursor))
        }))
    }

    async fn next_item(&mut self) -> Option<StoreResult<SequencedEvent>> {
        if self.done || self.remaining == Some(0) {
            return None;
        }
        loop {
            match self.scan() {
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
                Ok(Scan::Found(sequenced)) => {
                    let position = u64::from(sequenced.position);
                    if self.backwards {
                        self.below = position;
                    } else {
                        self.after = position;
                    }
                    if let Some(remaining) = &mut self.remaining {
                        *remaining -= 1;
                    }
                    return Some(Ok(sequenced));
                }
                Ok(Scan::Drained { head }) => {
                    if !self.subscribe {
                        return None;
                    }
                    if *self.head_rx.borrow_and_update() > head {
                        // Committed between the scan and here; look again.
                        continue;
                    }
                    if self.head_rx.changed().await.is_err() {
                        return None;
                    }
                }
            }
        }
    }

    /// One step against the ledger, holding the read lock only briefly.
    fn scan(&self) -> StoreResult<Scan> {
        let state = self
            .shared
            .state
            .read()
            .map_err(|_| StoreError::Storage("event ledger lock poisoned".to_string()))?;
        let found = if self.backwards {
            state.ledger.prev_match(self.below, &self.query)
        } else {
            let max = if self.subscribe { u64::MAX } else { self.end };
            state.ledger.next_match(self.after, max, &self.query)
        };
        Ok(found.cloned().map_or_else(
            || Scan::Drained {
                head: state.ledger.head_value(),
            },
            Scan::Found,
        ))
    }
}
