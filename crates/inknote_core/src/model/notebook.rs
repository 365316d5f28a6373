//! Notebook/chapter/canvas ownership records.
//!
//! # Responsibility
//! - Define the hierarchical containers that scope canvas lifetime.
//! - Provide constructors for the optimistic default chain (a new notebook
//!   always materializes one chapter holding one canvas).
//!
//! # Invariants
//! - Children are ordered by `sort_order` and owned exclusively by their
//!   parent; deleting a parent cascades downward.
//! - Structural changes are not part of per-canvas stroke history.

use crate::model::stroke::CanvasId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for a notebook.
pub type NotebookId = Uuid;

/// Stable identifier for a chapter.
pub type ChapterId = Uuid;

/// Returns the current wall-clock time as unix epoch milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

/// One drawing page. Live stroke state lives in the history engine; this
/// record carries identity, ownership, and ordering only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub id: CanvasId,
    pub chapter_id: ChapterId,
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Canvas {
    pub fn new(chapter_id: ChapterId, sort_order: i64) -> Self {
        let now = now_ms();
        Self {
            id: Uuid::new_v4(),
            chapter_id,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Ordered group of canvases inside a notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub notebook_id: NotebookId,
    pub title: String,
    pub sort_order: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub canvases: Vec<Canvas>,
}

impl Chapter {
    /// Creates a chapter with one default canvas.
    pub fn with_default_canvas(
        notebook_id: NotebookId,
        title: impl Into<String>,
        sort_order: i64,
    ) -> Self {
        let now = now_ms();
        let id = Uuid::new_v4();
        Self {
            id,
            notebook_id,
            title: title.into(),
            sort_order,
            created_at: now,
            updated_at: now,
            canvases: vec![Canvas::new(id, 0)],
        }
    }
}

/// Top-level container of chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: NotebookId,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub chapters: Vec<Chapter>,
}

impl Notebook {
    /// Creates a notebook with the fully-formed default child chain, so the
    /// UI never observes a partially-built tree.
    pub fn with_default_chain(title: impl Into<String>) -> Self {
        let now = now_ms();
        let id = Uuid::new_v4();
        Self {
            id,
            title: title.into(),
            created_at: now,
            updated_at: now,
            chapters: vec![Chapter::with_default_canvas(id, "Chapter 1", 0)],
        }
    }

    /// First canvas in document order, if any.
    pub fn first_canvas(&self) -> Option<&Canvas> {
        self.chapters
            .first()
            .and_then(|chapter| chapter.canvases.first())
    }
}
