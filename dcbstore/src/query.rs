//! Query matching for tagged, typed events.
//!
//! A [`Query`] is a flat list of [`QueryItem`] predicates combined with OR
//! semantics: an event matches the query when it matches at least one item.
//! Within an item, the type check and the tag subset check are combined with
//! AND. The grammar is closed and fixed-depth, so the representation is a
//! plain list of predicate structs rather than a predicate tree.

use crate::event::Event;
use serde::{Deserialize, Serialize};

/// A single query predicate over event types and tags.
///
/// An event matches the item when its type is one of `types` (or `types` is
/// empty) and every tag in `tags` is present on the event (or `tags` is
/// empty). An item with no types and no tags matches every event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryItem {
    /// Event types to match; empty means any type.
    pub types: Vec<String>,
    /// Tags that must all be present on the event; empty means no constraint.
    pub tags: Vec<String>,
}

impl QueryItem {
    /// Creates an item with no constraints, matching every event.
    pub const fn new() -> Self {
        Self {
            types: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Replaces the item's type constraint.
    #[must_use]
    pub fn with_types(mut self, types: Vec<String>) -> Self {
        self.types = types;
        self
    }

    /// Replaces the item's tag constraint.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Decides whether `event` satisfies this predicate.
    ///
    /// String comparison is exact and case-sensitive; no value is rejected
    /// as malformed. Duplicate tags on either side are irrelevant.
    pub fn matches(&self, event: &Event) -> bool {
        let type_matches =
            self.types.is_empty() || self.types.iter().any(|t| *t == event.event_type);
        let tags_match = self.tags.iter().all(|t| event.tags.contains(t));
        type_matches && tags_match
    }
}

/// A query over the event store: OR across items, AND within an item.
///
/// The empty query matches every event; this is the convention used for
/// unconditional reads and position checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// The query items; an event matches when any item matches.
    pub items: Vec<QueryItem>,
}

impl Query {
    /// Creates an empty query, which matches every event.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// The match-everything query.
    pub const fn all() -> Self {
        Self::new()
    }

    /// Creates a query from a list of items.
    pub const fn from_items(items: Vec<QueryItem>) -> Self {
        Self { items }
    }

    /// Appends an item to the query.
    #[must_use]
    pub fn with_item(mut self, item: QueryItem) -> Self {
        self.items.push(item);
        self
    }

    /// Decides whether `event` matches this query.
    ///
    /// Evaluation short-circuits on the first matching item; the result is
    /// order-independent since items combine with a pure OR.
    pub fn matches(&self, event: &Event) -> bool {
        self.items.is_empty() || self.items.iter().any(|item| item.matches(event))
    }

    /// Decides whether any event in `events` matches this query.
    ///
    /// This is an existence check, not a collection operation: it stops at
    /// the first match found.
    pub fn matches_any<'a, I>(&self, events: I) -> bool
    where
        I: IntoIterator<Item = &'a Event>,
    {
        events.into_iter().any(|event| self.matches(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn event(event_type: &str, tags: &[&str]) -> Event {
        Event::new(event_type, Vec::new())
            .with_tags(tags.iter().map(ToString::to_string).collect())
    }

    proptest! {
        #[test]
        fn empty_item_matches_every_event(
            event_type in "[a-zA-Z0-9:_-]{0,32}",
            tags in proptest::collection::vec("[a-zA-Z0-9:_-]{0,32}", 0..5),
        ) {
            let e = Event::new(event_type, Vec::new()).with_tags(tags);
            prop_assert!(QueryItem::new().matches(&e));
        }

        #[test]
        fn empty_query_matches_every_event(
            event_type in "[a-zA-Z0-9:_-]{0,32}",
            tags in proptest::collection::vec("[a-zA-Z0-9:_-]{0,32}", 0..5),
        ) {
            let e = Event::new(event_type, Vec::new()).with_tags(tags);
            prop_assert!(Query::all().matches(&e));
        }

        #[test]
        fn item_tag_matching_is_subset_matching(
            tags in proptest::collection::vec("[a-z]{1,8}", 1..6),
            extra in proptest::collection::vec("[A-Z]{1,8}", 0..4),
        ) {
            // An event carrying a superset of the item's tags always matches.
            let mut event_tags = tags.clone();
            event_tags.extend(extra);
            let e = Event::new("t", Vec::new()).with_tags(event_tags);
            let item = QueryItem::new().with_tags(tags);
            prop_assert!(item.matches(&e));
        }

        #[test]
        fn item_requiring_absent_tag_never_matches(
            tags in proptest::collection::vec("[a-z]{1,8}", 0..4),
        ) {
            let e = Event::new("t", Vec::new()).with_tags(tags.clone());
            let mut required = tags;
            required.push("tag-that-is-not-there".to_string());
            let item = QueryItem::new().with_tags(required);
            prop_assert!(!item.matches(&e));
        }
    }

    #[test]
    fn item_type_matching_is_exact_membership() {
        let item = QueryItem::new().with_types(vec!["A".to_string(), "B".to_string()]);

        assert!(item.matches(&event("A", &[])));
        assert!(item.matches(&event("B", &[])));
        assert!(!item.matches(&event("C", &[])));
        // Case-sensitive, never normalized.
        assert!(!item.matches(&event("a", &[])));
    }

    #[test]
    fn item_combines_type_and_tag_checks_with_and() {
        let item = QueryItem::new()
            .with_types(vec!["OrderCreated".to_string()])
            .with_tags(vec!["order:O1".to_string()]);

        assert!(item.matches(&event("OrderCreated", &["order:O1", "extra"])));
        assert!(!item.matches(&event("OrderCreated", &["order:O2"])));
        assert!(!item.matches(&event("OrderCancelled", &["order:O1"])));
    }

    #[test]
    fn query_combines_items_with_or() {
        let query = Query::new()
            .with_item(QueryItem::new().with_types(vec!["A".to_string()]))
            .with_item(QueryItem::new().with_tags(vec!["b".to_string()]));

        // Type "A" matches regardless of tags.
        assert!(query.matches(&event("A", &[])));
        assert!(query.matches(&event("A", &["unrelated"])));
        // Tag "b" matches regardless of type.
        assert!(query.matches(&event("Z", &["b"])));
        // Neither clause.
        assert!(!query.matches(&event("Z", &["c"])));
    }

    #[test]
    fn empty_strings_are_matched_literally() {
        let item = QueryItem::new().with_types(vec![String::new()]);
        assert!(item.matches(&event("", &[])));
        assert!(!item.matches(&event("A", &[])));
    }

    #[test]
    fn matches_any_finds_first_match() {
        let query = Query::new().with_item(QueryItem::new().with_tags(vec!["x".to_string()]));
        let events = vec![event("A", &[]), event("B", &["x"]), event("C", &[])];

        assert!(query.matches_any(events.iter()));
        assert!(!query.matches_any(events[..1].iter()));
        assert!(!query.matches_any(std::iter::empty::<&Event>()));
    }

    #[test]
    fn query_roundtrip_serialization() {
        let query = Query::new().with_item(
            QueryItem::new()
                .with_types(vec!["OrderCreated".to_string()])
                .with_tags(vec!["order:O1".to_string()]),
        );

        let json = serde_json::to_string(&query).unwrap();
        let deserialized: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(query, deserialized);
    }
}
