mod common;

use common::*;
use modeler_session::domain::{NoticeKind, Tab};
use modeler_session::editor::{ActionResult, DialogChoice, EditorState, EditorStore, HostAction};
use modeler_session::{Config, EditorProps, Engine, MemoryEngine, SessionKey};

#[test]
fn test_mount_imports_and_derives_sheets() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");

    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();

    assert_eq!(host.imports, vec![(None, Vec::new())]);
    let sheets = editor.sheets(&mut store);
    assert_eq!(sheet_ids(&sheets), vec!["dish", "season", "guests", "#fallback"]);
    let names: Vec<&str> = sheets.iter().map(|sheet| sheet.name.as_str()).collect();
    assert_eq!(names, vec!["Diagram", "Season", "Guests", "XML"]);
    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "dish");
    assert_eq!(host.last_active_sheet(), Some("dish"));
    assert!(!editor.is_dirty(&mut store));

    let engine = engine(&mut store, "tab-1");
    assert_eq!(engine.attached_to().map(|m| m.0.as_str()), Some("canvas"));
    let panel = engine.viewer("dish").unwrap().properties_panel();
    assert_eq!(panel.map(|m| m.0.as_str()), Some("properties"));
}

#[test]
fn test_remount_reuses_engine_without_reimport() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut first = controller("tab-1");
    first
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();
    let probe = engine(&mut store, "tab-1").destroy_probe();
    first.unmount(&mut store);
    drop(first);

    let mut second = controller("tab-1");
    second
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();

    assert_eq!(host.imports.len(), 1);
    assert_eq!(store.len(), 1);
    assert_eq!(probe.get(), 0);
    assert_eq!(second.active_sheet(&mut store).unwrap().id, "dish");
}

#[test]
fn test_unchanged_content_is_not_reimported() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");
    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();

    editor.update(&mut store, &mut host, EditorProps::new(DOCUMENT));
    assert_eq!(host.imports.len(), 1);

    editor.update(&mut store, &mut host, EditorProps::new(RENAMED_DOCUMENT));
    assert_eq!(host.imports.len(), 2);
    let state = store.get("tab-1").unwrap();
    assert_eq!(state.last_imported.as_deref(), Some(RENAMED_DOCUMENT));
}

#[test]
fn test_failed_import_opens_fallback_and_dialog() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");

    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(BROKEN_DOCUMENT))
        .unwrap();

    assert!(host.imports[0].0.is_some());
    assert_eq!(host.errors.len(), 1);
    assert!(host.errors[0].starts_with("Import error"));

    let active = editor.active_sheet(&mut store).unwrap();
    assert_eq!(active.id, "#fallback");
    assert_eq!(active.name, "XML");
    assert_eq!(host.last_active_sheet(), Some("#fallback"));

    assert_eq!(host.actions.len(), 1);
    assert!(matches!(host.actions[0], HostAction::ShowDialog(_)));
    let state = store.get("tab-1").unwrap();
    assert!(state.last_imported.is_none());
}

#[test]
fn test_ask_in_forum_opens_forum_page() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::answering(ActionResult::Chosen(DialogChoice::AskInForum));
    let mut editor = controller("tab-1");

    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(BROKEN_DOCUMENT))
        .unwrap();

    assert_eq!(host.actions.len(), 2);
    assert_eq!(
        host.actions[1],
        HostAction::OpenExternalUrl(Config::default().forum_url)
    );
}

#[test]
fn test_other_dialog_answers_dispatch_once() {
    let mut host = RecordingHost::answering(ActionResult::Chosen(DialogChoice::ShowDetails));
    let editor = controller("tab-1");

    let answer = editor.show_import_error_dialog(
        &mut host,
        &modeler_session::EngineError::new("unparsable content"),
    );

    assert_eq!(answer, ActionResult::Chosen(DialogChoice::ShowDetails));
    assert_eq!(host.actions.len(), 1);
}

#[test]
fn test_import_warnings_raise_notice() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");

    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DRAFT_DOCUMENT))
        .unwrap();

    assert_eq!(host.warnings, vec!["decision 'draft' has no decision logic".to_string()]);
    let notice = editor.notice(&mut store).unwrap();
    assert_eq!(notice.kind, NoticeKind::Warnings);
    assert_eq!(notice.payload, host.warnings);
    assert_eq!(sheet_ids(&editor.sheets(&mut store)), vec!["dish", "#fallback"]);
}

#[test]
fn test_notice_replace_and_clear() {
    let mut store = EditorStore::new();
    let editor = controller("tab-1");

    editor.set_notice(
        &mut store,
        NoticeKind::Warnings,
        vec!["w1".to_string(), "w2".to_string()],
    );
    let notice = editor.notice(&mut store).unwrap();
    assert_eq!(notice.kind, NoticeKind::Warnings);
    assert_eq!(notice.payload.len(), 2);

    editor.clear_notice(&mut store);
    assert!(editor.notice(&mut store).is_none());
}

#[test]
fn test_content_update_marks_dirty_only_when_changed() {
    let mut store = EditorStore::new();
    let mut state = EditorState::new(MemoryEngine::new());
    state.last_imported = Some("<foo></foo>".to_string());
    store.set(SessionKey::from("tab-1"), state.into_entry());
    let editor = controller("tab-1");

    assert!(!editor.handle_content_updated(&mut store, "<foo></foo>"));
    assert!(!editor.is_dirty(&mut store));

    assert!(editor.handle_content_updated(&mut store, "<foo></foo>-bar"));
    assert!(editor.is_dirty(&mut store));
}

#[test]
fn test_deferred_import_discarded_after_unmount() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = deferred_controller("tab-1");

    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();
    assert!(editor.is_importing());

    editor.unmount(&mut store);
    assert_eq!(engine(&mut store, "tab-1").settle(), 1);
    assert_eq!(editor.pump(&mut store, &mut host), 0);

    assert!(host.imports.is_empty());
    assert!(store.get("tab-1").unwrap().last_imported.is_none());

    let mut remounted = deferred_controller("tab-1");
    remounted
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();
    assert!(remounted.is_importing());
}

#[test]
fn test_content_changed_during_import_is_picked_up() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = deferred_controller("tab-1");
    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();

    editor.update(&mut store, &mut host, EditorProps::new(RENAMED_DOCUMENT));
    assert_eq!(engine(&mut store, "tab-1").pending_count(), 1);

    engine(&mut store, "tab-1").settle();
    editor.pump(&mut store, &mut host);
    assert!(editor.is_importing());
    assert_eq!(
        store.get("tab-1").unwrap().last_imported.as_deref(),
        Some(DOCUMENT)
    );

    engine(&mut store, "tab-1").settle();
    editor.pump(&mut store, &mut host);
    assert!(!editor.is_importing());
    assert_eq!(host.imports.len(), 2);
    assert_eq!(
        store.get("tab-1").unwrap().last_imported.as_deref(),
        Some(RENAMED_DOCUMENT)
    );
}

#[test]
fn test_destroy_never_accessed_key_is_noop() {
    let mut store = EditorStore::new();
    let mut editor = controller("tab-1");

    assert!(!editor.destroy(&mut store));
    assert!(store.is_empty());
}

#[test]
fn test_destroy_tears_down_engine_once() {
    let tab = Tab::untitled("tab-1", "diagram_1.dmn");
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller(&tab.id);
    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();
    let probe = engine(&mut store, &tab.id).destroy_probe();

    assert!(editor.destroy(&mut store));
    assert!(!editor.destroy(&mut store));

    assert_eq!(probe.get(), 1);
    assert!(!store.has(&tab.id));
}

#[test]
fn test_attach_failure_leaves_no_listeners() {
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");
    let _ = editor.is_dirty(&mut store);
    engine(&mut store, "tab-1").destroy();

    let result = editor.mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT));

    assert!(result.is_err());
    assert!(!editor.is_mounted());
    assert_eq!(engine(&mut store, "tab-1").events().listener_count(), 0);
    assert!(host.imports.is_empty());
}

#[test]
fn test_import_opens_engine_initial_view() {
    const DOCUMENT_OPENING_ON_GUESTS: &str = r#"{
        "id": "dish",
        "initial": "guests",
        "decisions": [
            { "id": "season", "name": "Season", "logic": "decisionTable" },
            { "id": "guests", "name": "Guests", "logic": "literalExpression" }
        ]
    }"#;
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");

    editor
        .mount(
            &mut store,
            &mut host,
            mounts(),
            EditorProps::new(DOCUMENT_OPENING_ON_GUESTS),
        )
        .unwrap();

    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "guests");
    assert_eq!(host.last_active_sheet(), Some("guests"));
    assert!(!editor.is_dirty(&mut store));
    let engine = engine(&mut store, "tab-1");
    assert_eq!(engine.active_view().unwrap().id(), "guests");
    let panel = engine.viewer("guests").unwrap().properties_panel();
    assert_eq!(panel.map(|m| m.0.as_str()), Some("properties"));
}

#[test]
fn test_requested_sheet_wins_over_initial_view() {
    const DOCUMENT_OPENING_ON_GUESTS: &str = r#"{
        "id": "dish",
        "initial": "guests",
        "decisions": [{ "id": "guests", "logic": "literalExpression" }]
    }"#;
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = controller("tab-1");

    editor
        .mount(
            &mut store,
            &mut host,
            mounts(),
            EditorProps::new(DOCUMENT_OPENING_ON_GUESTS).with_active_sheet("dish"),
        )
        .unwrap();

    assert_eq!(editor.active_sheet(&mut store).unwrap().id, "dish");
    assert_eq!(engine(&mut store, "tab-1").active_view().unwrap().id(), "dish");
}
