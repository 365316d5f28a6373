//! Notebook tree repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the notebook → chapter → canvas ownership tree.
//! - Confirm optimistically-created records by assigning authoritative ids,
//!   returned as temp-to-confirmed pairs for the caller to patch in.
//!
//! # Invariants
//! - Listing orders children by `sort_order` then uuid, deterministically.
//! - Deleting a parent removes the whole subtree, strokes included.

use crate::model::notebook::{Canvas, Chapter, ChapterId, Notebook, NotebookId};
use crate::model::stroke::CanvasId;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Temp-to-confirmed id pair produced when the store accepts an
/// optimistically-created record under an authoritative id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdConfirmation {
    pub temp: Uuid,
    pub confirmed: Uuid,
}

/// Repository interface for the notebook ownership tree.
pub trait NotebookRepository {
    /// Persists a notebook together with its optimistic child chain.
    /// Returns one confirmation per record written, notebook first.
    fn create_notebook(&self, notebook: &Notebook) -> RepoResult<Vec<IdConfirmation>>;
    /// Persists a chapter and any canvases it already holds.
    fn create_chapter(&self, chapter: &Chapter) -> RepoResult<Vec<IdConfirmation>>;
    fn create_canvas(&self, canvas: &Canvas) -> RepoResult<IdConfirmation>;
    /// Loads all notebooks with chapters and canvases fully assembled.
    fn list_notebooks(&self) -> RepoResult<Vec<Notebook>>;
    fn delete_notebook(&self, id: NotebookId) -> RepoResult<()>;
    fn delete_chapter(&self, id: ChapterId) -> RepoResult<()>;
    fn delete_canvas(&self, id: CanvasId) -> RepoResult<()>;
}

/// SQLite-backed notebook repository.
///
/// Acts as the authoritative store in the sync topology: it assigns fresh
/// ids on create rather than trusting the caller's temporary ones, the same
/// contract a remote backend presents.
pub struct SqliteNotebookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotebookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn insert_notebook(&self, notebook: &Notebook, confirmed: NotebookId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO notebooks (uuid, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                confirmed.to_string(),
                notebook.title.as_str(),
                notebook.created_at,
                notebook.updated_at,
            ],
        )?;
        Ok(())
    }

    fn insert_chapter(
        &self,
        chapter: &Chapter,
        confirmed: ChapterId,
        notebook_id: NotebookId,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO chapters (uuid, notebook_uuid, title, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                confirmed.to_string(),
                notebook_id.to_string(),
                chapter.title.as_str(),
                chapter.sort_order,
                chapter.created_at,
                chapter.updated_at,
            ],
        )?;
        Ok(())
    }

    fn insert_canvas(
        &self,
        canvas: &Canvas,
        confirmed: CanvasId,
        chapter_id: ChapterId,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO canvases (uuid, chapter_uuid, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                confirmed.to_string(),
                chapter_id.to_string(),
                canvas.sort_order,
                canvas.created_at,
                canvas.updated_at,
            ],
        )?;
        Ok(())
    }
}

impl NotebookRepository for SqliteNotebookRepository<'_> {
    fn create_notebook(&self, notebook: &Notebook) -> RepoResult<Vec<IdConfirmation>> {
        let mut confirmations = Vec::new();

        let notebook_id = Uuid::new_v4();
        self.insert_notebook(notebook, notebook_id)?;
        confirmations.push(IdConfirmation {
            temp: notebook.id,
            confirmed: notebook_id,
        });

        for chapter in &notebook.chapters {
            let chapter_id = Uuid::new_v4();
            self.insert_chapter(chapter, chapter_id, notebook_id)?;
            confirmations.push(IdConfirmation {
                temp: chapter.id,
                confirmed: chapter_id,
            });

            for canvas in &chapter.canvases {
                let canvas_id = Uuid::new_v4();
                self.insert_canvas(canvas, canvas_id, chapter_id)?;
                confirmations.push(IdConfirmation {
                    temp: canvas.id,
                    confirmed: canvas_id,
                });
            }
        }

        Ok(confirmations)
    }

    fn create_chapter(&self, chapter: &Chapter) -> RepoResult<Vec<IdConfirmation>> {
        let mut confirmations = Vec::new();

        let chapter_id = Uuid::new_v4();
        self.insert_chapter(chapter, chapter_id, chapter.notebook_id)?;
        confirmations.push(IdConfirmation {
            temp: chapter.id,
            confirmed: chapter_id,
        });

        for canvas in &chapter.canvases {
            let canvas_id = Uuid::new_v4();
            self.insert_canvas(canvas, canvas_id, chapter_id)?;
            confirmations.push(IdConfirmation {
                temp: canvas.id,
                confirmed: canvas_id,
            });
        }

        Ok(confirmations)
    }

    fn create_canvas(&self, canvas: &Canvas) -> RepoResult<IdConfirmation> {
        let canvas_id = Uuid::new_v4();
        self.insert_canvas(canvas, canvas_id, canvas.chapter_id)?;
        Ok(IdConfirmation {
            temp: canvas.id,
            confirmed: canvas_id,
        })
    }

    fn list_notebooks(&self) -> RepoResult<Vec<Notebook>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, title, created_at, updated_at
             FROM notebooks
             ORDER BY created_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut notebooks = Vec::new();

        while let Some(row) = rows.next()? {
            let mut notebook = parse_notebook_row(row)?;
            notebook.chapters = self.list_chapters(notebook.id)?;
            notebooks.push(notebook);
        }

        Ok(notebooks)
    }

    fn delete_notebook(&self, id: NotebookId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM strokes
             WHERE canvas_uuid IN (
                SELECT c.uuid FROM canvases c
                JOIN chapters ch ON ch.uuid = c.chapter_uuid
                WHERE ch.notebook_uuid = ?1
             );",
            [id.to_string()],
        )?;

        let changed = self
            .conn
            .execute("DELETE FROM notebooks WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_chapter(&self, id: ChapterId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM strokes
             WHERE canvas_uuid IN (SELECT uuid FROM canvases WHERE chapter_uuid = ?1);",
            [id.to_string()],
        )?;

        let changed = self
            .conn
            .execute("DELETE FROM chapters WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_canvas(&self, id: CanvasId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM strokes WHERE canvas_uuid = ?1;",
            [id.to_string()],
        )?;

        let changed = self
            .conn
            .execute("DELETE FROM canvases WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

impl SqliteNotebookRepository<'_> {
    fn list_chapters(&self, notebook_id: NotebookId) -> RepoResult<Vec<Chapter>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, notebook_uuid, title, sort_order, created_at, updated_at
             FROM chapters
             WHERE notebook_uuid = ?1
             ORDER BY sort_order ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([notebook_id.to_string()])?;
        let mut chapters = Vec::new();

        while let Some(row) = rows.next()? {
            let mut chapter = parse_chapter_row(row)?;
            chapter.canvases = self.list_canvases(chapter.id)?;
            chapters.push(chapter);
        }

        Ok(chapters)
    }

    fn list_canvases(&self, chapter_id: ChapterId) -> RepoResult<Vec<Canvas>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, chapter_uuid, sort_order, created_at, updated_at
             FROM canvases
             WHERE chapter_uuid = ?1
             ORDER BY sort_order ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([chapter_id.to_string()])?;
        let mut canvases = Vec::new();

        while let Some(row) = rows.next()? {
            canvases.push(parse_canvas_row(row)?);
        }

        Ok(canvases)
    }
}

fn parse_notebook_row(row: &Row<'_>) -> RepoResult<Notebook> {
    Ok(Notebook {
        id: parse_uuid(row, "uuid", "notebooks")?,
        title: row.get("title")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        chapters: Vec::new(),
    })
}

fn parse_chapter_row(row: &Row<'_>) -> RepoResult<Chapter> {
    Ok(Chapter {
        id: parse_uuid(row, "uuid", "chapters")?,
        notebook_id: parse_uuid(row, "notebook_uuid", "chapters")?,
        title: row.get("title")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        canvases: Vec::new(),
    })
}

fn parse_canvas_row(row: &Row<'_>) -> RepoResult<Canvas> {
    Ok(Canvas {
        id: parse_uuid(row, "uuid", "canvases")?,
        chapter_id: parse_uuid(row, "chapter_uuid", "canvases")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(row: &Row<'_>, column: &str, table: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}
