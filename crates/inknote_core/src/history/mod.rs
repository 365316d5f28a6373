//! Per-canvas stroke list with bounded undo/redo.
//!
//! # Responsibility
//! - Hold the authoritative in-memory stroke list for one open canvas.
//! - Record full-list snapshots for undo/redo, bounded to the most recent
//!   [`HISTORY_LIMIT`] entries.
//! - Translate every mutation into the persistence events needed to bring
//!   the store in line with the new state.
//!
//! # Invariants
//! - The live list mutates first; persistence events describe the delta
//!   after the fact and never roll the list back.
//! - Any new mutation clears the redo stack.
//! - Undo/redo reconciliation is minimal: events are computed from the
//!   id-set difference between the restored and replaced snapshots, so a
//!   single undone add emits exactly one delete and nothing else.

use crate::model::stroke::{Stroke, StrokeId};
use std::collections::{HashSet, VecDeque};

/// Maximum retained undo (and redo) snapshots per canvas. Older snapshots
/// are evicted silently; memory stays bounded at the cost of very deep undo.
pub const HISTORY_LIMIT: usize = 100;

/// Immutable copy of the full stroke list at one point in time.
///
/// Strokes are cheap enough to clone wholesale at note-taking scale; the
/// snapshot model keeps undo/redo trivially correct for every mutation kind.
#[derive(Debug, Clone)]
struct Snapshot {
    strokes: Vec<Stroke>,
}

/// Instruction for the persistence collaborator, emitted after a mutation
/// has already been applied to the live list.
#[derive(Debug, Clone)]
pub enum PersistenceEvent {
    /// Insert one newly live stroke.
    CreateStroke(Stroke),
    /// Remove the strokes with these ids.
    DeleteStrokes(Vec<StrokeId>),
}

/// Undo/redo engine for a single canvas.
#[derive(Debug, Default)]
pub struct CanvasHistory {
    strokes: Vec<Stroke>,
    undo: VecDeque<Snapshot>,
    redo: VecDeque<Snapshot>,
}

impl CanvasHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history seeded from already-persisted strokes, with empty
    /// undo/redo stacks.
    pub fn from_strokes(strokes: Vec<Stroke>) -> Self {
        Self {
            strokes,
            undo: VecDeque::new(),
            redo: VecDeque::new(),
        }
    }

    /// Current live stroke list, in draw order.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Looks up a live stroke by id.
    pub fn find_stroke(&self, id: StrokeId) -> Option<&Stroke> {
        self.strokes.iter().find(|stroke| stroke.id == id)
    }

    /// Rewrites a live stroke's id after remote confirmation.
    ///
    /// Snapshots keep the temporary id; reconciliation works purely on id
    /// sets, so an undo spanning the confirmation still emits coherent
    /// events for the ids the snapshots actually hold.
    pub fn patch_stroke_id(&mut self, temp: StrokeId, confirmed: StrokeId) {
        for stroke in &mut self.strokes {
            if stroke.id == temp {
                stroke.patch_id(confirmed);
            }
        }
    }

    /// Appends a finalized stroke.
    pub fn add_stroke(&mut self, stroke: Stroke) -> Vec<PersistenceEvent> {
        self.begin_mutation();
        self.strokes.push(stroke.clone());
        vec![PersistenceEvent::CreateStroke(stroke)]
    }

    /// Removes one stroke by id. Unknown ids are a no-op: the stroke may
    /// have been erased by an earlier sweep sample in the same gesture.
    pub fn erase_stroke(&mut self, id: StrokeId) -> Vec<PersistenceEvent> {
        if self.find_stroke(id).is_none() {
            return Vec::new();
        }
        self.begin_mutation();
        self.strokes.retain(|stroke| stroke.id != id);
        vec![PersistenceEvent::DeleteStrokes(vec![id])]
    }

    /// Removes every stroke. Undoable like any other mutation; emits a
    /// single batched delete, or nothing when the canvas is already empty.
    pub fn clear(&mut self) -> Vec<PersistenceEvent> {
        if self.strokes.is_empty() {
            return Vec::new();
        }
        self.begin_mutation();
        let ids = self.strokes.drain(..).map(|stroke| stroke.id).collect();
        vec![PersistenceEvent::DeleteStrokes(ids)]
    }

    /// Restores the previous snapshot. No-op with empty undo stack.
    pub fn undo(&mut self) -> Vec<PersistenceEvent> {
        let Some(snapshot) = self.undo.pop_back() else {
            return Vec::new();
        };
        let replaced = std::mem::replace(&mut self.strokes, snapshot.strokes);
        let events = reconcile(&replaced, &self.strokes);
        push_bounded(&mut self.redo, Snapshot { strokes: replaced });
        events
    }

    /// Re-applies the most recently undone snapshot. No-op with empty redo
    /// stack.
    pub fn redo(&mut self) -> Vec<PersistenceEvent> {
        let Some(snapshot) = self.redo.pop_back() else {
            return Vec::new();
        };
        let replaced = std::mem::replace(&mut self.strokes, snapshot.strokes);
        let events = reconcile(&replaced, &self.strokes);
        push_bounded(&mut self.undo, Snapshot { strokes: replaced });
        events
    }

    fn begin_mutation(&mut self) {
        push_bounded(
            &mut self.undo,
            Snapshot {
                strokes: self.strokes.clone(),
            },
        );
        self.redo.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot) {
    if stack.len() == HISTORY_LIMIT {
        stack.pop_front();
    }
    stack.push_back(snapshot);
}

/// Computes the persistence delta from `before` to `after` by id-set
/// difference.
///
/// A snapshot restore only ever adds strokes or removes strokes relative to
/// its neighbor, never both, so equal cardinality means equal sets and no
/// store work at all.
fn reconcile(before: &[Stroke], after: &[Stroke]) -> Vec<PersistenceEvent> {
    if before.len() == after.len() {
        return Vec::new();
    }

    if after.len() < before.len() {
        let surviving: HashSet<StrokeId> = after.iter().map(|stroke| stroke.id).collect();
        let removed: Vec<StrokeId> = before
            .iter()
            .map(|stroke| stroke.id)
            .filter(|id| !surviving.contains(id))
            .collect();
        return vec![PersistenceEvent::DeleteStrokes(removed)];
    }

    let known: HashSet<StrokeId> = before.iter().map(|stroke| stroke.id).collect();
    after
        .iter()
        .filter(|stroke| !known.contains(&stroke.id))
        .map(|stroke| PersistenceEvent::CreateStroke(stroke.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{CanvasHistory, PersistenceEvent, HISTORY_LIMIT};
    use crate::model::brush::BrushConfig;
    use crate::model::stroke::{PointerSample, Stroke};
    use uuid::Uuid;

    fn sample_stroke() -> Stroke {
        Stroke::new(
            Uuid::new_v4(),
            vec![
                PointerSample::new(0.1, 0.1, 0.5),
                PointerSample::new(0.2, 0.2, 0.6),
            ],
            BrushConfig::default(),
        )
    }

    #[test]
    fn add_emits_create_and_records_undo() {
        let mut history = CanvasHistory::new();
        let stroke = sample_stroke();
        let events = history.add_stroke(stroke.clone());
        assert_eq!(history.strokes().len(), 1);
        assert_eq!(history.undo_depth(), 1);
        assert!(
            matches!(&events[..], [PersistenceEvent::CreateStroke(s)] if s.id == stroke.id)
        );
    }

    #[test]
    fn erase_of_unknown_id_is_a_noop() {
        let mut history = CanvasHistory::new();
        history.add_stroke(sample_stroke());
        let events = history.erase_stroke(Uuid::new_v4());
        assert!(events.is_empty());
        assert_eq!(history.strokes().len(), 1);
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn undo_of_add_emits_single_delete() {
        let mut history = CanvasHistory::new();
        let stroke = sample_stroke();
        history.add_stroke(stroke.clone());
        let events = history.undo();
        assert!(history.strokes().is_empty());
        assert!(
            matches!(&events[..], [PersistenceEvent::DeleteStrokes(ids)] if ids == &vec![stroke.id])
        );
    }

    #[test]
    fn undo_of_erase_emits_single_create() {
        let mut history = CanvasHistory::new();
        let a = sample_stroke();
        let b = sample_stroke();
        history.add_stroke(a.clone());
        history.add_stroke(b.clone());
        history.erase_stroke(a.id);
        assert_eq!(history.strokes().len(), 1);

        let events = history.undo();
        assert_eq!(history.strokes().len(), 2);
        assert!(
            matches!(&events[..], [PersistenceEvent::CreateStroke(s)] if s.id == a.id)
        );
    }

    #[test]
    fn redo_reapplies_undone_mutation() {
        let mut history = CanvasHistory::new();
        let stroke = sample_stroke();
        history.add_stroke(stroke.clone());
        history.undo();
        let events = history.redo();
        assert_eq!(history.strokes().len(), 1);
        assert!(
            matches!(&events[..], [PersistenceEvent::CreateStroke(s)] if s.id == stroke.id)
        );
    }

    #[test]
    fn new_mutation_clears_redo() {
        let mut history = CanvasHistory::new();
        history.add_stroke(sample_stroke());
        history.undo();
        assert_eq!(history.redo_depth(), 1);
        history.add_stroke(sample_stroke());
        assert_eq!(history.redo_depth(), 0);
        assert!(history.redo().is_empty());
    }

    #[test]
    fn undo_stack_is_bounded_and_evicts_oldest() {
        let mut history = CanvasHistory::new();
        for _ in 0..HISTORY_LIMIT + 50 {
            history.add_stroke(sample_stroke());
        }
        assert_eq!(history.undo_depth(), HISTORY_LIMIT);

        while history.undo_depth() > 0 {
            assert!(!history.undo().is_empty());
        }
        // The 50 oldest strokes survive; their snapshots were evicted.
        assert_eq!(history.strokes().len(), 50);
        assert!(history.undo().is_empty());
    }

    #[test]
    fn redo_stack_shares_the_history_bound() {
        let mut history = CanvasHistory::new();
        for _ in 0..HISTORY_LIMIT + 50 {
            history.add_stroke(sample_stroke());
        }

        while history.undo_depth() > 0 {
            history.undo();
            assert!(history.redo_depth() <= HISTORY_LIMIT);
        }
        assert_eq!(history.redo_depth(), HISTORY_LIMIT);

        while history.redo_depth() > 0 {
            assert!(!history.redo().is_empty());
        }
        assert_eq!(history.strokes().len(), HISTORY_LIMIT + 50);
    }

    #[test]
    fn clear_is_batched_and_undoable() {
        let mut history = CanvasHistory::new();
        let a = sample_stroke();
        let b = sample_stroke();
        history.add_stroke(a.clone());
        history.add_stroke(b.clone());

        let events = history.clear();
        assert!(history.strokes().is_empty());
        assert!(
            matches!(&events[..], [PersistenceEvent::DeleteStrokes(ids)] if ids.len() == 2)
        );

        history.undo();
        assert_eq!(history.strokes().len(), 2);
    }

    #[test]
    fn clear_on_empty_canvas_emits_nothing() {
        let mut history = CanvasHistory::new();
        assert!(history.clear().is_empty());
        assert_eq!(history.undo_depth(), 0);
    }

    #[test]
    fn scripted_session_matches_expected_states() {
        let mut history = CanvasHistory::new();
        let a = sample_stroke();
        let b = sample_stroke();

        history.add_stroke(a.clone());
        history.add_stroke(b.clone());
        history.erase_stroke(a.id);
        assert_eq!(
            history.strokes().iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![b.id]
        );
        assert_eq!(history.undo_depth(), 3);

        // Undo the erase: A comes back.
        let events = history.undo();
        assert_eq!(history.strokes().len(), 2);
        assert!(
            matches!(&events[..], [PersistenceEvent::CreateStroke(s)] if s.id == a.id)
        );

        // Undo the second add: only A remains.
        let events = history.undo();
        assert_eq!(
            history.strokes().iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![a.id]
        );
        assert!(
            matches!(&events[..], [PersistenceEvent::DeleteStrokes(ids)] if ids == &vec![b.id])
        );
    }

    #[test]
    fn id_patch_keeps_history_consistent() {
        let mut history = CanvasHistory::new();
        let stroke = sample_stroke();
        let temp_id = stroke.id;
        history.add_stroke(stroke);

        let confirmed = Uuid::new_v4();
        history.patch_stroke_id(temp_id, confirmed);
        assert!(history.find_stroke(confirmed).is_some());
        assert!(history.find_stroke(temp_id).is_none());
    }
}
