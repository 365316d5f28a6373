//! Domain model for the stroke engine.
//!
//! # Responsibility
//! - Define the canonical value types shared by geometry, history, and
//!   persistence: pointer samples, brushes, strokes, and the ownership tree.
//!
//! # Invariants
//! - Every persisted record is identified by a stable uuid.
//! - Strokes are immutable after finalization except for id confirmation.

pub mod brush;
pub mod notebook;
pub mod stroke;
