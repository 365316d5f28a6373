//! Core stroke engine for Inknote.
//! This crate is the single source of truth for drawing and history invariants.

pub mod db;
pub mod geometry;
pub mod history;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use geometry::{build_geometry, hit_test_point, hit_test_sweep, RenderGeometry, Surface};
pub use history::{CanvasHistory, PersistenceEvent, HISTORY_LIMIT};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::brush::{BrushConfig, Rgba, ToolKind, WidthProfile};
pub use model::notebook::{Canvas, Chapter, ChapterId, Notebook, NotebookId};
pub use model::stroke::{CanvasId, PointerSample, Stroke, StrokeId};
pub use repo::notebook_repo::{NotebookRepository, SqliteNotebookRepository};
pub use repo::stroke_repo::{SqliteStrokeRepository, StrokeRepository};
pub use repo::{RepoError, RepoResult};
pub use service::canvas_service::{CanvasService, CanvasServiceError};
pub use service::notebook_service::{NotebookService, NotebookServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
