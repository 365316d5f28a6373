//! Use-case services orchestrating geometry, history, and persistence.
//!
//! # Responsibility
//! - Provide the stable entry points the UI shell calls per input event.
//! - Delegate storage to repository implementations.
//!
//! # Invariants
//! - Local in-memory state commits before persistence is attempted and is
//!   never rolled back on store failure.
//! - Operations that need a selection are silent no-ops without one.

pub mod canvas_service;
pub mod notebook_service;
