use inknote_core::db::open_db_in_memory;
use inknote_core::{
    BrushConfig, NotebookRepository, NotebookService, PointerSample, SqliteNotebookRepository,
    SqliteStrokeRepository, Stroke, StrokeRepository,
};

fn sample_points() -> Vec<PointerSample> {
    vec![
        PointerSample::new(0.1, 0.1, 0.5),
        PointerSample::new(0.2, 0.2, 0.5),
    ]
}

#[test]
fn create_notebook_builds_default_chain_with_confirmed_ids() {
    let conn = open_db_in_memory().unwrap();
    let mut service = NotebookService::new(SqliteNotebookRepository::new(&conn));

    let notebook_id = service.create_notebook("Sketches").unwrap();

    let persisted = SqliteNotebookRepository::new(&conn).list_notebooks().unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].id, notebook_id);
    assert_eq!(persisted[0].chapters.len(), 1);
    assert_eq!(persisted[0].chapters[0].title, "Chapter 1");
    assert_eq!(persisted[0].chapters[0].canvases.len(), 1);

    // The in-memory tree was patched to the store's ids.
    assert_eq!(service.notebooks()[0].id, notebook_id);
    assert_eq!(
        service.selected_canvas(),
        persisted[0].chapters[0].canvases.first().map(|c| c.id)
    );
}

#[test]
fn chapters_and_canvases_list_in_sort_order() {
    let conn = open_db_in_memory().unwrap();
    let mut service = NotebookService::new(SqliteNotebookRepository::new(&conn));

    let notebook_id = service.create_notebook("Sketches").unwrap();
    service.create_chapter(notebook_id, "Chapter 2").unwrap();
    service.create_chapter(notebook_id, "Chapter 3").unwrap();

    let persisted = SqliteNotebookRepository::new(&conn).list_notebooks().unwrap();
    let titles: Vec<_> = persisted[0]
        .chapters
        .iter()
        .map(|chapter| chapter.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Chapter 1", "Chapter 2", "Chapter 3"]);
}

#[test]
fn delete_notebook_cascades_to_strokes() {
    let conn = open_db_in_memory().unwrap();
    let mut service = NotebookService::new(SqliteNotebookRepository::new(&conn));

    let notebook_id = service.create_notebook("Sketches").unwrap();
    let canvas_id = service.selected_canvas().unwrap();

    let stroke_repo = SqliteStrokeRepository::new(&conn);
    let stroke = Stroke::new(canvas_id, sample_points(), BrushConfig::default());
    stroke_repo.create_stroke(&stroke).unwrap();
    assert_eq!(stroke_repo.list_strokes(canvas_id).unwrap().len(), 1);

    service.delete_notebook(notebook_id).unwrap();

    assert!(SqliteNotebookRepository::new(&conn)
        .list_notebooks()
        .unwrap()
        .is_empty());
    assert!(stroke_repo.list_strokes(canvas_id).unwrap().is_empty());
    assert_eq!(service.selected_notebook(), None);
    assert_eq!(service.selected_canvas(), None);
}

#[test]
fn delete_chapter_cascades_but_keeps_siblings() {
    let conn = open_db_in_memory().unwrap();
    let mut service = NotebookService::new(SqliteNotebookRepository::new(&conn));

    let notebook_id = service.create_notebook("Sketches").unwrap();
    let chapter_id = service.create_chapter(notebook_id, "Chapter 2").unwrap();
    let canvas_id = service.create_canvas(chapter_id).unwrap();

    let stroke_repo = SqliteStrokeRepository::new(&conn);
    let stroke = Stroke::new(canvas_id, sample_points(), BrushConfig::default());
    stroke_repo.create_stroke(&stroke).unwrap();

    service.delete_chapter(chapter_id).unwrap();

    let persisted = SqliteNotebookRepository::new(&conn).list_notebooks().unwrap();
    assert_eq!(persisted[0].chapters.len(), 1);
    assert_eq!(persisted[0].chapters[0].title, "Chapter 1");
    assert!(stroke_repo.list_strokes(canvas_id).unwrap().is_empty());
}

#[test]
fn reload_replaces_local_tree_with_persisted_state() {
    let conn = open_db_in_memory().unwrap();

    {
        let mut service = NotebookService::new(SqliteNotebookRepository::new(&conn));
        service.create_notebook("Sketches").unwrap();
        service.create_notebook("Field notes").unwrap();
    }

    let mut service = NotebookService::new(SqliteNotebookRepository::new(&conn));
    service.load().unwrap();
    assert_eq!(service.notebooks().len(), 2);
    assert_eq!(service.selected_notebook(), None);

    let notebook_id = service.notebooks()[0].id;
    assert!(service.select_notebook(notebook_id));
    assert!(service.selected_canvas().is_some());
}
