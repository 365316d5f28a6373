//! Notebook tree use-case service.
//!
//! # Responsibility
//! - Maintain the in-memory notebook → chapter → canvas tree with
//!   optimistic creation: entities appear locally first, under temporary
//!   ids, then get patched to the store's confirmed ids.
//! - Keep the current notebook/canvas selection consistent across patches
//!   and deletions.
//!
//! # Invariants
//! - Local tree state commits before persistence and is never rolled back;
//!   a store failure leaves the optimistic entity in place under its
//!   temporary id.
//! - Incoming ids are resolved through the patch table, so callers holding
//!   a stale temporary id keep addressing the right entity.

use crate::model::notebook::{Canvas, Chapter, ChapterId, Notebook, NotebookId};
use crate::model::stroke::CanvasId;
use crate::repo::notebook_repo::{IdConfirmation, NotebookRepository};
use crate::repo::RepoError;
use log::error;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from notebook service operations.
#[derive(Debug)]
pub enum NotebookServiceError {
    /// Loading the persisted tree failed; local state is unchanged.
    Load(RepoError),
    /// The store rejected a mutation after it already committed locally.
    Persist(RepoError),
    /// The addressed entity does not exist in the local tree.
    NotFound(Uuid),
}

impl Display for NotebookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "notebook load failed: {err}"),
            Self::Persist(err) => write!(f, "notebook persistence failed: {err}"),
            Self::NotFound(id) => write!(f, "notebook tree entity not found: {id}"),
        }
    }
}

impl Error for NotebookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) | Self::Persist(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

/// Temporary-to-confirmed id indirection built up from store confirmations.
#[derive(Debug, Default)]
struct IdPatchTable {
    patches: HashMap<Uuid, Uuid>,
}

impl IdPatchTable {
    fn record(&mut self, confirmation: IdConfirmation) {
        if confirmation.temp != confirmation.confirmed {
            self.patches.insert(confirmation.temp, confirmation.confirmed);
        }
    }

    /// Maps a possibly-temporary id to its confirmed form; unknown ids map
    /// to themselves.
    fn resolve(&self, id: Uuid) -> Uuid {
        self.patches.get(&id).copied().unwrap_or(id)
    }
}

/// Use-case service facade over the notebook ownership tree.
pub struct NotebookService<R: NotebookRepository> {
    repo: R,
    notebooks: Vec<Notebook>,
    patches: IdPatchTable,
    selected_notebook: Option<NotebookId>,
    selected_canvas: Option<CanvasId>,
}

impl<R: NotebookRepository> NotebookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            notebooks: Vec::new(),
            patches: IdPatchTable::default(),
            selected_notebook: None,
            selected_canvas: None,
        }
    }

    /// Replaces the local tree with the persisted one. Selection and patch
    /// table reset; confirmed ids are authoritative after a load.
    pub fn load(&mut self) -> Result<(), NotebookServiceError> {
        let notebooks = self
            .repo
            .list_notebooks()
            .map_err(NotebookServiceError::Load)?;
        self.notebooks = notebooks;
        self.patches = IdPatchTable::default();
        self.selected_notebook = None;
        self.selected_canvas = None;
        Ok(())
    }

    pub fn notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    pub fn selected_notebook(&self) -> Option<NotebookId> {
        self.selected_notebook
    }

    pub fn selected_canvas(&self) -> Option<CanvasId> {
        self.selected_canvas
    }

    /// Creates a notebook with its default chapter and canvas, selects it,
    /// and selects its first canvas.
    ///
    /// The tree commits locally before the store is asked; on store failure
    /// the notebook stays available under its temporary ids.
    pub fn create_notebook(
        &mut self,
        title: impl Into<String>,
    ) -> Result<NotebookId, NotebookServiceError> {
        let notebook = Notebook::with_default_chain(title);
        let temp_id = notebook.id;
        let temp_canvas = notebook.first_canvas().map(|canvas| canvas.id);

        self.notebooks.push(notebook.clone());
        self.selected_notebook = Some(temp_id);
        self.selected_canvas = temp_canvas;

        match self.repo.create_notebook(&notebook) {
            Ok(confirmations) => {
                self.apply_confirmations(confirmations);
                Ok(self.patches.resolve(temp_id))
            }
            Err(err) => {
                error!(
                    "event=notebook_persist module=service status=error error_code=store_write_failed error={err}"
                );
                Err(NotebookServiceError::Persist(err))
            }
        }
    }

    /// Appends a chapter (with one default canvas) to a notebook.
    pub fn create_chapter(
        &mut self,
        notebook_id: NotebookId,
        title: impl Into<String>,
    ) -> Result<ChapterId, NotebookServiceError> {
        let notebook_id = self.patches.resolve(notebook_id);
        let notebook = self
            .notebooks
            .iter_mut()
            .find(|notebook| notebook.id == notebook_id)
            .ok_or(NotebookServiceError::NotFound(notebook_id))?;

        let sort_order = notebook.chapters.len() as i64;
        let chapter = Chapter::with_default_canvas(notebook_id, title, sort_order);
        let temp_id = chapter.id;
        notebook.chapters.push(chapter.clone());

        match self.repo.create_chapter(&chapter) {
            Ok(confirmations) => {
                self.apply_confirmations(confirmations);
                Ok(self.patches.resolve(temp_id))
            }
            Err(err) => {
                error!(
                    "event=notebook_persist module=service status=error error_code=store_write_failed error={err}"
                );
                Err(NotebookServiceError::Persist(err))
            }
        }
    }

    /// Appends a canvas to a chapter.
    pub fn create_canvas(
        &mut self,
        chapter_id: ChapterId,
    ) -> Result<CanvasId, NotebookServiceError> {
        let chapter_id = self.patches.resolve(chapter_id);
        let chapter = self
            .notebooks
            .iter_mut()
            .flat_map(|notebook| notebook.chapters.iter_mut())
            .find(|chapter| chapter.id == chapter_id)
            .ok_or(NotebookServiceError::NotFound(chapter_id))?;

        let canvas = Canvas::new(chapter_id, chapter.canvases.len() as i64);
        let temp_id = canvas.id;
        chapter.canvases.push(canvas.clone());

        match self.repo.create_canvas(&canvas) {
            Ok(confirmation) => {
                self.apply_confirmations(vec![confirmation]);
                Ok(self.patches.resolve(temp_id))
            }
            Err(err) => {
                error!(
                    "event=notebook_persist module=service status=error error_code=store_write_failed error={err}"
                );
                Err(NotebookServiceError::Persist(err))
            }
        }
    }

    /// Selects a notebook and its first canvas.
    pub fn select_notebook(&mut self, notebook_id: NotebookId) -> bool {
        let notebook_id = self.patches.resolve(notebook_id);
        let Some(notebook) = self
            .notebooks
            .iter()
            .find(|notebook| notebook.id == notebook_id)
        else {
            return false;
        };
        self.selected_canvas = notebook.first_canvas().map(|canvas| canvas.id);
        self.selected_notebook = Some(notebook_id);
        true
    }

    /// Selects a canvas, and the notebook that owns it.
    pub fn select_canvas(&mut self, canvas_id: CanvasId) -> bool {
        let canvas_id = self.patches.resolve(canvas_id);
        for notebook in &self.notebooks {
            for chapter in &notebook.chapters {
                if chapter.canvases.iter().any(|canvas| canvas.id == canvas_id) {
                    self.selected_notebook = Some(notebook.id);
                    self.selected_canvas = Some(canvas_id);
                    return true;
                }
            }
        }
        false
    }

    /// Deletes a notebook and everything under it. Selection pointing into
    /// the subtree is cleared.
    pub fn delete_notebook(
        &mut self,
        notebook_id: NotebookId,
    ) -> Result<(), NotebookServiceError> {
        let notebook_id = self.patches.resolve(notebook_id);
        let before = self.notebooks.len();
        self.notebooks.retain(|notebook| notebook.id != notebook_id);
        if self.notebooks.len() == before {
            return Err(NotebookServiceError::NotFound(notebook_id));
        }

        if self.selected_notebook == Some(notebook_id) {
            self.selected_notebook = None;
            self.selected_canvas = None;
        }

        self.persist_delete(self.repo.delete_notebook(notebook_id))
    }

    /// Deletes a chapter and its canvases.
    pub fn delete_chapter(&mut self, chapter_id: ChapterId) -> Result<(), NotebookServiceError> {
        let chapter_id = self.patches.resolve(chapter_id);
        let mut removed_canvases: Option<Vec<CanvasId>> = None;

        for notebook in &mut self.notebooks {
            if let Some(index) = notebook
                .chapters
                .iter()
                .position(|chapter| chapter.id == chapter_id)
            {
                let chapter = notebook.chapters.remove(index);
                removed_canvases =
                    Some(chapter.canvases.iter().map(|canvas| canvas.id).collect());
                break;
            }
        }

        let Some(removed_canvases) = removed_canvases else {
            return Err(NotebookServiceError::NotFound(chapter_id));
        };

        if self
            .selected_canvas
            .is_some_and(|id| removed_canvases.contains(&id))
        {
            self.selected_canvas = None;
        }

        self.persist_delete(self.repo.delete_chapter(chapter_id))
    }

    /// Deletes a single canvas.
    pub fn delete_canvas(&mut self, canvas_id: CanvasId) -> Result<(), NotebookServiceError> {
        let canvas_id = self.patches.resolve(canvas_id);
        let mut removed = false;

        for chapter in self
            .notebooks
            .iter_mut()
            .flat_map(|notebook| notebook.chapters.iter_mut())
        {
            let before = chapter.canvases.len();
            chapter.canvases.retain(|canvas| canvas.id != canvas_id);
            if chapter.canvases.len() != before {
                removed = true;
                break;
            }
        }

        if !removed {
            return Err(NotebookServiceError::NotFound(canvas_id));
        }

        if self.selected_canvas == Some(canvas_id) {
            self.selected_canvas = None;
        }

        self.persist_delete(self.repo.delete_canvas(canvas_id))
    }

    fn persist_delete(
        &self,
        result: Result<(), RepoError>,
    ) -> Result<(), NotebookServiceError> {
        match result {
            Ok(()) => Ok(()),
            // The entity never reached the store (its optimistic create
            // failed); the local removal already settled everything.
            Err(RepoError::NotFound(_)) => Ok(()),
            Err(err) => {
                error!(
                    "event=notebook_persist module=service status=error error_code=store_delete_failed error={err}"
                );
                Err(NotebookServiceError::Persist(err))
            }
        }
    }

    /// Rewrites temporary ids across the tree, the selection, and the patch
    /// table with the store's confirmed ids.
    fn apply_confirmations(&mut self, confirmations: Vec<IdConfirmation>) {
        for confirmation in confirmations {
            let IdConfirmation { temp, confirmed } = confirmation;
            if temp == confirmed {
                continue;
            }
            self.patches.record(confirmation);

            for notebook in &mut self.notebooks {
                if notebook.id == temp {
                    notebook.id = confirmed;
                }
                for chapter in &mut notebook.chapters {
                    if chapter.id == temp {
                        chapter.id = confirmed;
                    }
                    if chapter.notebook_id == temp {
                        chapter.notebook_id = confirmed;
                    }
                    for canvas in &mut chapter.canvases {
                        if canvas.id == temp {
                            canvas.id = confirmed;
                        }
                        if canvas.chapter_id == temp {
                            canvas.chapter_id = confirmed;
                        }
                    }
                }
            }

            if self.selected_notebook == Some(temp) {
                self.selected_notebook = Some(confirmed);
            }
            if self.selected_canvas == Some(temp) {
                self.selected_canvas = Some(confirmed);
            }
        }
    }
}
