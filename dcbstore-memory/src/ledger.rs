//! The append-only position ledger.
//!
//! Events live in a dense vector: the record at index `i` holds position
//! `i + 1`, so positions are gapless and position lookup is an index
//! calculation. Secondary posting lists by tag and by type keep the
//! existence check for append conditions off the full-scan path; the lists
//! hold positions in ascending order, so skipping past a reference position
//! is a binary search.

use std::collections::HashMap;

use dcbstore::{Event, Position, Query, QueryItem, SequencedEvent};

pub(crate) struct Ledger {
    records: Vec<SequencedEvent>,
    by_tag: HashMap<String, Vec<Position>>,
    by_type: HashMap<String, Vec<Position>>,
}

impl Ledger {
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
            by_tag: HashMap::new(),
            by_type: HashMap::new(),
        }
    }

    /// Highest assigned position, or `None` for an empty ledger.
    pub(crate) fn head(&self) -> Option<Position> {
        self.records.last().map(|record| record.position)
    }

    /// Head as a raw value, `0` for an empty ledger.
    pub(crate) fn head_value(&self) -> u64 {
        self.records.len() as u64
    }

    pub(crate) fn get(&self, position: Position) -> Option<&SequencedEvent> {
        let index = usize::try_from(u64::from(position) - 1).ok()?;
        self.records.get(index)
    }

    /// Assigns contiguous positions to the batch, in batch order.
    ///
    /// Returns the first and last assigned position. Callers validate that
    /// the batch is non-empty.
    pub(crate) fn append_batch(&mut self, events: Vec<Event>) -> (Position, Position) {
        debug_assert!(!events.is_empty());
        let first = self.head().map_or_else(Position::first, Position::next);
        let mut last = first;
        for (offset, event) in events.into_iter().enumerate() {
            let position = if offset == 0 { first } else { last.next() };
            self.index_event(&event, position);
            self.records.push(SequencedEvent::new(event, position));
            last = position;
        }
        (first, last)
    }

    /// The committed records of a batch previously returned by
    /// [`append_batch`](Self::append_batch).
    pub(crate) fn batch(&self, first: Position, last: Position) -> &[SequencedEvent] {
        let start = usize::try_from(u64::from(first) - 1).unwrap_or(usize::MAX);
        let end = usize::try_from(u64::from(last)).unwrap_or(usize::MAX);
        &self.records[start..end]
    }

    fn index_event(&mut self, event: &Event, position: Position) {
        for tag in &event.tags {
            let list = self.by_tag.entry(tag.clone()).or_default();
            // Duplicate tags on one event index once.
            if list.last() != Some(&position) {
                list.push(position);
            }
        }
        self.by_type
            .entry(event.event_type.clone())
            .or_default()
            .push(position);
    }

    /// Whether any committed event with a position greater than `after`
    /// matches `query`. `after: None` checks the entire ledger.
    ///
    /// Candidates come from the posting lists; the check short-circuits on
    /// the first hit.
    pub(crate) fn exists_after(&self, after: Option<Position>, query: &Query) -> bool {
        let after = after.map_or(0, u64::from);
        if self.head_value() <= after {
            return false;
        }
        if query.items.is_empty() {
            return true;
        }
        query
            .items
            .iter()
            .any(|item| self.item_exists_after(item, after))
    }

    fn item_exists_after(&self, item: &QueryItem, after: u64) -> bool {
        if !item.tags.is_empty() {
            // All required tags must be known; scan the rarest posting list
            // and verify each candidate against the full predicate.
            let mut rarest: Option<&Vec<Position>> = None;
            for tag in &item.tags {
                let Some(list) = self.by_tag.get(tag) else {
                    return false;
                };
                if rarest.map_or(true, |current| list.len() < current.len()) {
                    rarest = Some(list);
                }
            }
            let Some(list) = rarest else {
                return false;
            };
            let start = list.partition_point(|position| u64::from(*position) <= after);
            return list[start..].iter().any(|position| {
                self.get(*position)
                    .map_or(false, |record| item.matches(&record.event))
            });
        }
        if item.types.is_empty() {
            // Unconstrained item; the caller already knows the ledger
            // extends past `after`.
            return true;
        }
        // Types-only item: any position in a matching type's posting list
        // past `after` satisfies the item outright.
        item.types.iter().any(|event_type| {
            self.by_type.get(event_type).map_or(false, |list| {
                list.partition_point(|position| u64::from(*position) <= after) < list.len()
            })
        })
    }

    /// First matching record with position in `(after, max]`.
    pub(crate) fn next_match(
        &self,
        after: u64,
        max: u64,
        query: &Query,
    ) -> Option<&SequencedEvent> {
        let start = usize::try_from(after).ok()?;
        let end = usize::try_from(max.min(self.head_value())).ok()?;
        self.records
            .get(start..end)?
            .iter()
            .find(|record| query.matches(&record.event))
    }

    /// Last matching record with position strictly below `below`.
    pub(crate) fn prev_match(&self, below: u64, query: &Query) -> Option<&SequencedEvent> {
        let end = usize::try_from(below.saturating_sub(1).min(self.head_value())).ok()?;
        self.records
            .get(..end)?
            .iter()
            .rev()
            .find(|record| query.matches(&record.event))
    }
}
