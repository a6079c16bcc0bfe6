//! Flutter-facing bindings for PokeCapture core.

pub mod api;
