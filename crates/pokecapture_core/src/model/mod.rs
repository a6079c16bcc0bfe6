//! Domain model for the catalog and per-user capture state.
//!
//! # Responsibility
//! - Define catalog entities as delivered to the presentation layer.
//! - Define capture records as stored in the document collection.
//!
//! # Invariants
//! - Entities are ephemeral and rebuilt on every catalog fetch.
//! - Capture records are the only durable state and the source of truth
//!   for `captured`.

pub mod capture;
pub mod entity;
