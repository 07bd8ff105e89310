mod common;

use common::*;
use modeler_session::editor::{EditorController, EditorStore};
use modeler_session::{Config, EditorProps, ImageFormat, MemoryEngine, SessionError};
use std::io::Write;

#[test]
fn test_config_file_overrides_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
exporter_name = "Desktop Modeler"
export_formats = ["png", "svg"]
properties_panel_width = 320
fallback_sheet_name = "Source"
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.exporter_name, "Desktop Modeler");
    assert_eq!(config.export_formats, vec![ImageFormat::Png, ImageFormat::Svg]);
    assert_eq!(config.properties_panel_width, 320);
    assert_eq!(config.fallback_sheet_name, "Source");
    assert_eq!(config.forum_url, Config::default().forum_url);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = Config::from_file(dir.path().join("missing.toml"));

    assert!(matches!(result, Err(SessionError::Io(_))));
}

#[test]
fn test_malformed_config_file_is_toml_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "properties_panel_width = \"wide\"").unwrap();

    let result = Config::from_file(file.path());

    assert!(matches!(result, Err(SessionError::Toml(_))));
}

#[test]
fn test_configured_fallback_name_is_shown() {
    let config = Config {
        fallback_sheet_name: "Source".to_string(),
        ..Config::default()
    };
    let mut store = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = EditorController::new("tab-1", MemoryEngine::new, config);

    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(BROKEN_DOCUMENT))
        .unwrap();

    let active = editor.active_sheet(&mut store).unwrap();
    assert_eq!(active.id, "#fallback");
    assert_eq!(active.name, "Source");
}

#[test]
fn test_configured_export_formats_reach_snapshot() {
    let config = Config {
        export_formats: vec![ImageFormat::Svg],
        ..Config::default()
    };
    let mut store: EditorStore<MemoryEngine> = EditorStore::new();
    let mut host = RecordingHost::default();
    let mut editor = EditorController::new("tab-1", MemoryEngine::new, config);

    editor
        .mount(&mut store, &mut host, mounts(), EditorProps::new(DOCUMENT))
        .unwrap();

    assert_eq!(host.snapshots.last().unwrap().export_as, vec![ImageFormat::Svg]);
}
