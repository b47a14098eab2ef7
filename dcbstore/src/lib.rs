//! `dcbstore` - dynamic consistency boundary event store engine
//!
//! This crate defines the core model of a DCB event store: an append-only
//! sequence of tagged, typed events with flexible multi-predicate queries
//! and query-scoped optimistic concurrency. Consistency boundaries are
//! expressed as queries over tags and types rather than fixed aggregate or
//! stream identities.
//!
//! The crate provides the domain types, the pure matching logic, and the
//! [`EventStore`] trait; storage backends (such as `dcbstore-memory`)
//! implement the trait.
//!
//! ```rust,ignore
//! use dcbstore::{AppendCondition, Event, EventStore, Query, QueryItem};
//!
//! let event = Event::new("OrderCreated", payload).with_tag("order:O1");
//! let boundary = AppendCondition::new(
//!     Query::new().with_item(
//!         QueryItem::new()
//!             .with_types(vec!["OrderCreated".into()])
//!             .with_tags(vec!["order:O1".into()]),
//!     ),
//! )
//! .after(store.head().await?);
//!
//! // Fails with an integrity error if a matching event was committed
//! // after the observed head.
//! store.append(vec![event], Some(boundary)).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod condition;
pub mod errors;
pub mod event;
pub mod query;
pub mod store;
pub mod types;

pub use condition::AppendCondition;
pub use errors::{StoreError, StoreResult};
pub use event::{Event, SequencedEvent};
pub use query::{Query, QueryItem};
pub use store::{EventStore, EventStream, ReadOptions};
pub use types::Position;
