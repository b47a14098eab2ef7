//! Idempotent retry resolution.
//!
//! Committed event ids are tracked alongside the batch they were committed
//! in and the append condition that guarded the commit. A retry is resolved
//! to its earlier position only when it is the exact batch committed before:
//! same ids in the same order, identical content, equal condition. Anything
//! in between - partial overlap, reordered events, a changed condition, an
//! id reused for different content - is an ambiguous retry and rejected,
//! since a partial duplicate indicates a caller bug.

use std::collections::HashMap;

use dcbstore::{AppendCondition, Event, Position, SequencedEvent, StoreError, StoreResult};
use uuid::Uuid;

use crate::ledger::Ledger;

/// Where a committed event id landed.
#[derive(Debug, Clone)]
struct CommittedId {
    position: Position,
    batch_first: Position,
    batch_last: Position,
    condition: Option<AppendCondition>,
}

pub(crate) struct IdempotencyIndex {
    by_event_id: HashMap<Uuid, CommittedId>,
}

impl IdempotencyIndex {
    pub(crate) fn new() -> Self {
        Self {
            by_event_id: HashMap::new(),
        }
    }

    /// Resolves a batch against previous commits.
    ///
    /// Returns `Ok(Some(position))` with the previously assigned last
    /// position when the batch is an exact retry, `Ok(None)` when no event
    /// id is known (fresh append), and an integrity error for ambiguous
    /// retries.
    pub(crate) fn resolve(
        &self,
        events: &[Event],
        condition: Option<&AppendCondition>,
        ledger: &Ledger,
    ) -> StoreResult<Option<Position>> {
        let entries: Vec<Option<&CommittedId>> = events
            .iter()
            .map(|event| {
                event
                    .event_id
                    .and_then(|id| self.by_event_id.get(&id))
            })
            .collect();

        let hits = entries.iter().filter(|entry| entry.is_some()).count();
        if hits == 0 {
            return Ok(None);
        }
        if hits < events.len() {
            return Err(StoreError::Integrity(
                "ambiguous idempotent retry: batch partially overlaps a previous commit"
                    .to_string(),
            ));
        }

        let entries: Vec<&CommittedId> = entries.into_iter().flatten().collect();
        let Some(first) = entries.first() else {
            return Ok(None);
        };

        let batch_len = u64::from(first.batch_last) - u64::from(first.batch_first) + 1;
        if batch_len != events.len() as u64 {
            return Err(StoreError::Integrity(
                "ambiguous idempotent retry: batch length differs from the previous commit"
                    .to_string(),
            ));
        }

        for (offset, (event, entry)) in events.iter().zip(&entries).enumerate() {
            if entry.batch_first != first.batch_first || entry.batch_last != first.batch_last {
                return Err(StoreError::Integrity(
                    "ambiguous idempotent retry: event ids span multiple commits".to_string(),
                ));
            }
            if u64::from(entry.position) != u64::from(first.batch_first) + offset as u64 {
                return Err(StoreError::Integrity(
                    "ambiguous idempotent retry: batch order differs from the previous commit"
                        .to_string(),
                ));
            }
            if entry.condition.as_ref() != condition {
                return Err(StoreError::Integrity(
                    "event id was previously committed under a different append condition"
                        .to_string(),
                ));
            }
            let committed = ledger.get(entry.position).ok_or_else(|| {
                StoreError::Corruption(format!(
                    "idempotency entry references missing position {}",
                    entry.position
                ))
            })?;
            if committed.event != *event {
                return Err(StoreError::Integrity(
                    "event id was previously committed with different content".to_string(),
                ));
            }
        }

        Ok(Some(first.batch_last))
    }

    /// Records the ids of a freshly committed batch.
    ///
    /// Must run in the same critical section as the commit itself so that a
    /// concurrent identical retry either resolves to this batch or conflicts
    /// on the append condition, never both.
    pub(crate) fn record(
        &mut self,
        batch: &[SequencedEvent],
        condition: Option<&AppendCondition>,
    ) {
        let (Some(first), Some(last)) = (batch.first(), batch.last()) else {
            return;
        };
        let (batch_first, batch_last) = (first.position, last.position);
        for sequenced in batch {
            if let Some(id) = sequenced.event.event_id {
                self.by_event_id.insert(
                    id,
                    CommittedId {
                        position: sequenced.position,
                        batch_first,
                        batch_last,
                        condition: condition.cloned(),
                    },
                );
            }
        }
    }
}
