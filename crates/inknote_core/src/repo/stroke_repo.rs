//! Stroke repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable create/delete/list APIs over canonical `strokes` storage.
//! - Keep SQL and JSON column details inside the persistence boundary.
//!
//! # Invariants
//! - Strokes are immutable once written; there is no update path, only
//!   create and delete.
//! - Read paths reject malformed persisted JSON instead of masking it.

use crate::model::brush::BrushConfig;
use crate::model::stroke::{CanvasId, PointerSample, Stroke, StrokeId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const STROKE_SELECT_SQL: &str = "SELECT
    uuid,
    canvas_uuid,
    points_json,
    brush_json
FROM strokes";

/// Repository interface for stroke persistence.
pub trait StrokeRepository {
    fn create_stroke(&self, stroke: &Stroke) -> RepoResult<StrokeId>;
    /// Deletes the given strokes. Missing ids are ignored: deletes are
    /// replayed from history events and must stay idempotent.
    fn delete_strokes(&self, ids: &[StrokeId]) -> RepoResult<()>;
    fn get_stroke(&self, id: StrokeId) -> RepoResult<Option<Stroke>>;
    fn list_strokes(&self, canvas_id: CanvasId) -> RepoResult<Vec<Stroke>>;
}

/// SQLite-backed stroke repository.
pub struct SqliteStrokeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStrokeRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StrokeRepository for SqliteStrokeRepository<'_> {
    fn create_stroke(&self, stroke: &Stroke) -> RepoResult<StrokeId> {
        if stroke.points.is_empty() {
            return Err(RepoError::InvalidData(
                "stroke has no points and cannot be persisted".to_string(),
            ));
        }

        let points_json = serde_json::to_string(&stroke.points)
            .map_err(|err| RepoError::InvalidData(format!("points serialization failed: {err}")))?;
        let brush_json = serde_json::to_string(&stroke.brush)
            .map_err(|err| RepoError::InvalidData(format!("brush serialization failed: {err}")))?;

        self.conn.execute(
            "INSERT INTO strokes (
                uuid,
                canvas_uuid,
                points_json,
                brush_json
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                stroke.id.to_string(),
                stroke.canvas_id.to_string(),
                points_json,
                brush_json,
            ],
        )?;

        Ok(stroke.id)
    }

    fn delete_strokes(&self, ids: &[StrokeId]) -> RepoResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM strokes WHERE uuid IN ({placeholders});");
        let bind_values: Vec<Value> = ids.iter().map(|id| Value::Text(id.to_string())).collect();
        self.conn.execute(&sql, params_from_iter(bind_values))?;

        Ok(())
    }

    fn get_stroke(&self, id: StrokeId) -> RepoResult<Option<Stroke>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STROKE_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_stroke_row(row)?));
        }

        Ok(None)
    }

    fn list_strokes(&self, canvas_id: CanvasId) -> RepoResult<Vec<Stroke>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STROKE_SELECT_SQL}
             WHERE canvas_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        ))?;

        let mut rows = stmt.query([canvas_id.to_string()])?;
        let mut strokes = Vec::new();

        while let Some(row) = rows.next()? {
            strokes.push(parse_stroke_row(row)?);
        }

        Ok(strokes)
    }
}

fn parse_stroke_row(row: &Row<'_>) -> RepoResult<Stroke> {
    let uuid = parse_uuid_column(row, "uuid")?;
    let canvas_uuid = parse_uuid_column(row, "canvas_uuid")?;

    let points_json: String = row.get("points_json")?;
    let points: Vec<PointerSample> = serde_json::from_str(&points_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid JSON in strokes.points_json: {err}"))
    })?;

    let brush_json: String = row.get("brush_json")?;
    let brush: BrushConfig = serde_json::from_str(&brush_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid JSON in strokes.brush_json: {err}"))
    })?;

    Ok(Stroke::with_id(uuid, canvas_uuid, points, brush))
}

fn parse_uuid_column(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in strokes.{column}"))
    })
}
