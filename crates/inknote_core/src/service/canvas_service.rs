//! Canvas drawing use-case service.
//!
//! # Responsibility
//! - Drive per-canvas stroke history from finalized gestures, eraser
//!   sweeps, and undo/redo commands.
//! - Mirror every committed mutation into the stroke store.
//!
//! # Invariants
//! - The in-memory history is the source of truth for the open canvas; it
//!   commits first and is never rolled back when persistence fails.
//! - Store failures are logged and surfaced, one error per batch, after the
//!   whole event batch has been attempted.
//! - Without a selected canvas every mutation is a silent no-op.

use crate::geometry::{hit_test_sweep, Surface};
use crate::history::{CanvasHistory, PersistenceEvent};
use crate::model::brush::BrushConfig;
use crate::model::stroke::{CanvasId, PointerSample, Stroke, StrokeId};
use crate::repo::stroke_repo::StrokeRepository;
use crate::repo::RepoError;
use kurbo::Point;
use log::error;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from canvas service operations.
#[derive(Debug)]
pub enum CanvasServiceError {
    /// Loading persisted strokes failed; the canvas was not opened.
    Load(RepoError),
    /// Persistence failed after the local mutation already committed. The
    /// in-memory state is intact; only the store is behind.
    Persist(RepoError),
}

impl Display for CanvasServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "canvas load failed: {err}"),
            Self::Persist(err) => write!(f, "stroke persistence failed: {err}"),
        }
    }
}

impl Error for CanvasServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) | Self::Persist(err) => Some(err),
        }
    }
}

/// Use-case service facade over per-canvas stroke histories.
pub struct CanvasService<R: StrokeRepository> {
    repo: R,
    canvases: HashMap<CanvasId, CanvasHistory>,
    selected: Option<CanvasId>,
}

impl<R: StrokeRepository> CanvasService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            canvases: HashMap::new(),
            selected: None,
        }
    }

    /// Loads a canvas's persisted strokes into a fresh history and selects
    /// it. Reopening an already-open canvas keeps its live history and
    /// undo/redo stacks.
    pub fn open_canvas(&mut self, canvas_id: CanvasId) -> Result<(), CanvasServiceError> {
        if !self.canvases.contains_key(&canvas_id) {
            let strokes = self
                .repo
                .list_strokes(canvas_id)
                .map_err(CanvasServiceError::Load)?;
            self.canvases
                .insert(canvas_id, CanvasHistory::from_strokes(strokes));
        }
        self.selected = Some(canvas_id);
        Ok(())
    }

    /// Switches the selection to an already-open canvas. Returns false and
    /// leaves the selection untouched when the canvas is not open.
    pub fn select_canvas(&mut self, canvas_id: CanvasId) -> bool {
        if self.canvases.contains_key(&canvas_id) {
            self.selected = Some(canvas_id);
            true
        } else {
            false
        }
    }

    pub fn selected_canvas(&self) -> Option<CanvasId> {
        self.selected
    }

    /// Live strokes of the selected canvas, in draw order. Empty without a
    /// selection.
    pub fn strokes(&self) -> &[Stroke] {
        self.selected_history()
            .map(CanvasHistory::strokes)
            .unwrap_or(&[])
    }

    pub fn undo_depth(&self) -> usize {
        self.selected_history().map_or(0, CanvasHistory::undo_depth)
    }

    pub fn redo_depth(&self) -> usize {
        self.selected_history().map_or(0, CanvasHistory::redo_depth)
    }

    /// Finalizes a completed gesture into a stroke on the selected canvas.
    ///
    /// Returns the new stroke's id, or `Ok(None)` when the gesture produced
    /// no samples or no canvas is selected.
    pub fn finalize_stroke(
        &mut self,
        points: Vec<PointerSample>,
        brush: BrushConfig,
    ) -> Result<Option<StrokeId>, CanvasServiceError> {
        let Some(canvas_id) = self.selected else {
            return Ok(None);
        };
        if points.is_empty() {
            return Ok(None);
        }

        let stroke = Stroke::new(canvas_id, points, brush);
        let stroke_id = stroke.id;
        let events = self.history_mut(canvas_id).add_stroke(stroke);
        self.emit(events)?;
        Ok(Some(stroke_id))
    }

    /// Applies one eraser pointer-move on the selected canvas: sweeps the
    /// eraser circle from `prev` to `curr` and erases the first stroke hit.
    ///
    /// Returns the erased stroke's id, if any. Called once per move event;
    /// erasing several overlapping strokes takes several events.
    pub fn erase_sweep(
        &mut self,
        prev: Point,
        curr: Point,
        radius: f64,
        surface: Surface,
    ) -> Result<Option<StrokeId>, CanvasServiceError> {
        let Some(canvas_id) = self.selected else {
            return Ok(None);
        };

        let hit = {
            let history = self.history_mut(canvas_id);
            hit_test_sweep(prev, curr, radius, history.strokes(), surface)
        };
        let Some(stroke_id) = hit else {
            return Ok(None);
        };

        let events = self.history_mut(canvas_id).erase_stroke(stroke_id);
        self.emit(events)?;
        Ok(Some(stroke_id))
    }

    /// Erases one stroke by id. Unknown ids and missing selection are
    /// no-ops.
    pub fn erase_stroke(&mut self, stroke_id: StrokeId) -> Result<(), CanvasServiceError> {
        let Some(canvas_id) = self.selected else {
            return Ok(());
        };
        let events = self.history_mut(canvas_id).erase_stroke(stroke_id);
        self.emit(events)
    }

    /// Clears the selected canvas as one undoable step.
    pub fn clear(&mut self) -> Result<(), CanvasServiceError> {
        let Some(canvas_id) = self.selected else {
            return Ok(());
        };
        let events = self.history_mut(canvas_id).clear();
        self.emit(events)
    }

    /// Undoes the last mutation on the selected canvas.
    pub fn undo(&mut self) -> Result<(), CanvasServiceError> {
        let Some(canvas_id) = self.selected else {
            return Ok(());
        };
        let events = self.history_mut(canvas_id).undo();
        self.emit(events)
    }

    /// Redoes the most recently undone mutation on the selected canvas.
    pub fn redo(&mut self) -> Result<(), CanvasServiceError> {
        let Some(canvas_id) = self.selected else {
            return Ok(());
        };
        let events = self.history_mut(canvas_id).redo();
        self.emit(events)
    }

    fn selected_history(&self) -> Option<&CanvasHistory> {
        self.selected.and_then(|id| self.canvases.get(&id))
    }

    fn history_mut(&mut self, canvas_id: CanvasId) -> &mut CanvasHistory {
        self.canvases.entry(canvas_id).or_default()
    }

    /// Replays history events against the store. Every event in the batch
    /// is attempted even after a failure; the first error is surfaced once
    /// the batch completes.
    fn emit(&mut self, events: Vec<PersistenceEvent>) -> Result<(), CanvasServiceError> {
        let mut first_error: Option<RepoError> = None;

        for event in events {
            let result = match &event {
                PersistenceEvent::CreateStroke(stroke) => {
                    self.repo.create_stroke(stroke).map(|_| ())
                }
                PersistenceEvent::DeleteStrokes(ids) => self.repo.delete_strokes(ids),
            };

            if let Err(err) = result {
                error!(
                    "event=stroke_persist module=service status=error error_code=store_write_failed error={err}"
                );
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(CanvasServiceError::Persist(err)),
            None => Ok(()),
        }
    }
}
