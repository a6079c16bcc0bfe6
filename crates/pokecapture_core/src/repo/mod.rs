//! Capture-record persistence.
//!
//! # Responsibility
//! - Define the document-collection contract used by lookup and toggle.
//! - Keep SQL details out of the service layer.
//!
//! # Invariants
//! - Every query filters by exact equality on both `user_id` and
//!   `entity_name`.
//! - Delete removes every match, so duplicate records never survive a release.

pub mod capture_repo;
