mod common;

use common::*;
use modeler_session::domain::FALLBACK_SHEET_ID;
use modeler_session::editor::{EditorController, EditorStore};
use modeler_session::{EditorProps, Engine, MemoryEngine, SessionError};

fn mounted(
    store: &mut EditorStore<MemoryEngine>,
    host: &mut RecordingHost,
) -> EditorController<MemoryEngine> {
    let mut editor = controller("tab-1");
    editor
        .mount(store, host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();
    editor
}

#[test]
fn test_switching_sheets_keeps_edits_dirty() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);

    engine(&mut store, "tab-1").rename("dish", "Dinner").unwrap();
    assert!(editor.is_dirty(&mut store));

    editor.update(
        &mut store,
        &mut host,
        EditorProps::new(DOCUMENT).with_active_sheet("season"),
    );

    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "season");
    assert_eq!(engine(&mut store, "tab-1").active_view().unwrap().id(), "season");
    assert!(editor.is_dirty(&mut store));
    assert!(!editor.can_undo(&mut store));

    editor.switch_sheet(&mut store, &mut host, "dish").unwrap();

    assert_eq!(host.last_active_sheet(), Some("dish"));
    assert!(editor.is_dirty(&mut store));
}

#[test]
fn test_edit_then_undo_on_same_sheet_is_clean() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);

    engine(&mut store, "tab-1").rename("dish", "Dinner").unwrap();
    editor.pump(&mut store, &mut host);
    assert!(host.snapshots.last().unwrap().undo);

    editor.undo(&mut store, &mut host);

    assert!(!editor.is_dirty(&mut store));
    assert!(editor.can_redo(&mut store));
    let snapshot = host.snapshots.last().unwrap();
    assert!(!snapshot.dirty);
    assert!(snapshot.redo);

    editor.redo(&mut store, &mut host);
    assert!(editor.is_dirty(&mut store));
}

#[test]
fn test_active_sheet_survives_reimport_by_id() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);
    editor.update(
        &mut store,
        &mut host,
        EditorProps::new(DOCUMENT).with_active_sheet("season"),
    );
    let before = editor.active_sheet(&mut store).unwrap().view.unwrap();

    editor.update(
        &mut store,
        &mut host,
        EditorProps::new(RENAMED_DOCUMENT).with_active_sheet("season"),
    );

    let after = editor.active_sheet(&mut store).unwrap().view.unwrap();
    assert_eq!(after.id(), "season");
    assert!(!after.is(&before));
    assert_eq!(engine(&mut store, "tab-1").active_view().unwrap().id(), "season");
    assert!(!editor.is_dirty(&mut store));
}

#[test]
fn test_properties_panel_follows_active_view() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);

    editor.switch_sheet(&mut store, &mut host, "guests").unwrap();

    let panel = engine(&mut store, "tab-1")
        .viewer("guests")
        .unwrap()
        .properties_panel()
        .cloned();
    assert_eq!(panel.map(|m| m.0), Some("properties".to_string()));
}

#[test]
fn test_unknown_sheet_is_rejected() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);

    let result = editor.switch_sheet(&mut store, &mut host, "missing");

    assert!(matches!(result, Err(SessionError::UnknownSheet(id)) if id == "missing"));
    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "dish");
}

#[test]
fn test_leaving_for_fallback_carries_engine_edits() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);
    engine(&mut store, "tab-1").rename("dish", "Dinner").unwrap();

    editor.switch_sheet(&mut store, &mut host, "#fallback").unwrap();

    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "#fallback");
    assert!(editor.is_dirty(&mut store));
    let source = editor.current_source(&mut store).unwrap();
    assert!(source.contains("Dinner"));

    editor.update(
        &mut store,
        &mut host,
        EditorProps::new(source).with_active_sheet("dish"),
    );
    assert_eq!(host.imports.len(), 1);
    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "dish");
    assert!(editor.is_dirty(&mut store));

    editor.mark_saved(&mut store);
    assert!(!editor.is_dirty(&mut store));
}

#[test]
fn test_clean_switch_to_fallback_stays_clean() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);

    editor.switch_sheet(&mut store, &mut host, "#fallback").unwrap();

    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "#fallback");
    assert!(!editor.is_dirty(&mut store));
    assert_eq!(editor.current_source(&mut store).as_deref(), Some(DOCUMENT));
}

#[test]
fn test_fixed_source_reimports_on_fallback() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");
    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(BROKEN_DOCUMENT))
        .unwrap();

    editor.update(
        &mut store,
        &mut host,
        EditorProps::new(DOCUMENT).with_active_sheet("#fallback"),
    );

    assert_eq!(host.imports.len(), 2);
    assert!(host.imports[1].0.is_none());
    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "#fallback");
    assert_eq!(
        sheet_ids(&editor.sheets(&mut store)),
        vec!["dish", "season", "guests", "#fallback"]
    );

    editor.update(
        &mut store,
        &mut host,
        EditorProps::new(DOCUMENT).with_active_sheet("dish"),
    );
    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "dish");
}

#[test]
fn test_engine_events_refresh_snapshot() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);

    engine(&mut store, "tab-1").select(&["dish"]);
    engine(&mut store, "tab-1").raise_error("render failed");
    editor.pump(&mut store, &mut host);

    assert!(host.snapshots.last().unwrap().elements_selected);
    assert_eq!(host.errors, vec!["Engine error: render failed".to_string()]);
}

#[test]
fn test_engine_initiated_switch_after_save_stays_clean() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);
    engine(&mut store, "tab-1").rename("dish", "Dinner").unwrap();
    editor.get_source(&mut store, &mut host, |source| assert!(source.is_ok()));
    assert!(!editor.is_dirty(&mut store));

    let table = engine(&mut store, "tab-1").views()[1].clone();
    engine(&mut store, "tab-1").open(&table);
    assert!(!editor.is_dirty(&mut store));
    editor.pump(&mut store, &mut host);

    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "season");
    assert!(!editor.is_dirty(&mut store));
    assert!(!host.snapshots.last().unwrap().dirty);
}

#[test]
fn test_engine_initiated_switch_keeps_unsaved_edits() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);
    engine(&mut store, "tab-1").rename("dish", "Dinner").unwrap();

    let table = engine(&mut store, "tab-1").views()[1].clone();
    engine(&mut store, "tab-1").open(&table);
    editor.pump(&mut store, &mut host);

    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "season");
    assert!(editor.is_dirty(&mut store));
    assert!(!editor.can_undo(&mut store));

    let diagram = engine(&mut store, "tab-1").views()[0].clone();
    engine(&mut store, "tab-1").open(&diagram);
    editor.pump(&mut store, &mut host);
    assert!(editor.is_dirty(&mut store));
}

#[test]
fn test_engine_initiated_switch_moves_panel_within_pump() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = mounted(&mut store, &mut host);

    let expression = engine(&mut store, "tab-1").views()[2].clone();
    engine(&mut store, "tab-1").open(&expression);
    let viewer = engine(&mut store, "tab-1").viewer("guests").unwrap();
    assert!(viewer.properties_panel().is_none());

    assert_eq!(editor.pump(&mut store, &mut host), 1);

    let panel = engine(&mut store, "tab-1")
        .viewer("guests")
        .unwrap()
        .properties_panel()
        .cloned();
    assert_eq!(panel.map(|m| m.0), Some("properties".to_string()));
    assert_eq!(host.last_active_sheet(), Some("guests"));
}

#[test]
fn test_element_with_fallback_like_id_stays_reachable() {
    const DOCUMENT_WITH_FALLBACK_TABLE: &str = r#"{
        "id": "dish",
        "decisions": [{ "id": "fallback", "name": "Fallback", "logic": "decisionTable" }]
    }"#;
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");
    editor
        .mount(
            &mut store,
            &mut host,
            mounts(),
            EditorProps::new(DOCUMENT_WITH_FALLBACK_TABLE),
        )
        .unwrap();
    assert_eq!(
        sheet_ids(&editor.sheets(&mut store)),
        vec!["dish", "fallback", FALLBACK_SHEET_ID]
    );

    editor.switch_sheet(&mut store, &mut host, "fallback").unwrap();

    let active = editor.active_sheet(&mut store).unwrap();
    assert_eq!(active.name, "Fallback");
    assert!(!active.is_fallback());
    assert_eq!(engine(&mut store, "tab-1").active_view().unwrap().id(), "fallback");

    editor.switch_sheet(&mut store, &mut host, FALLBACK_SHEET_ID).unwrap();
    assert!(editor.active_sheet(&mut store).unwrap().is_fallback());
}
