//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate catalog, capture store and auth calls into use-case APIs.
//! - Keep UI/FFI layers decoupled from transport and storage details.

pub mod capture_service;
pub mod sync_service;
