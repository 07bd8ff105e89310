#![allow(dead_code)]

use modeler_session::editor::{
    ActionResult, EditorController, EditorSnapshot, EditorStore, Host, HostAction, Layout, Mounts,
};
use modeler_session::{Config, EngineError, MemoryEngine, SessionError, Sheet};

pub const DOCUMENT: &str = r#"{
    "id": "dish",
    "name": "Dish",
    "decisions": [
        { "id": "season", "name": "Season", "logic": "decisionTable" },
        { "id": "guests", "name": "Guests", "logic": "literalExpression" }
    ]
}"#;

pub const RENAMED_DOCUMENT: &str = r#"{
    "id": "dish",
    "name": "Dinner",
    "decisions": [
        { "id": "season", "name": "Season", "logic": "decisionTable" },
        { "id": "guests", "name": "Guests", "logic": "literalExpression" }
    ]
}"#;

pub const DRAFT_DOCUMENT: &str = r#"{
    "id": "dish",
    "decisions": [{ "id": "draft", "name": "Draft" }]
}"#;

pub const BROKEN_DOCUMENT: &str = "<foo></foo>";

/// Host that records every callback.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub imports: Vec<(Option<EngineError>, Vec<String>)>,
    /// Sheet ids and the active sheet id of every sheets update.
    pub sheet_updates: Vec<(Vec<String>, Option<String>)>,
    pub snapshots: Vec<EditorSnapshot>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub actions: Vec<HostAction>,
    pub layouts: Vec<Layout>,
    /// Reply to dialog requests.
    pub answer: ActionResult,
}

impl RecordingHost {
    pub fn answering(answer: ActionResult) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn last_active_sheet(&self) -> Option<&str> {
        self.sheet_updates
            .last()
            .and_then(|(_, active)| active.as_deref())
    }
}

impl Host for RecordingHost {
    fn on_import(&mut self, error: Option<&EngineError>, warnings: &[String]) {
        self.imports.push((error.cloned(), warnings.to_vec()));
    }

    fn on_sheets_changed(&mut self, sheets: &[Sheet], active_sheet: Option<&Sheet>) {
        self.sheet_updates.push((
            sheets.iter().map(|sheet| sheet.id.clone()).collect(),
            active_sheet.map(|sheet| sheet.id.clone()),
        ));
    }

    fn on_changed(&mut self, snapshot: &EditorSnapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn on_error(&mut self, error: &SessionError) {
        self.errors.push(error.to_string());
    }

    fn on_warning(&mut self, warning: &str) {
        self.warnings.push(warning.to_string());
    }

    fn on_action(&mut self, action: HostAction) -> ActionResult {
        let answer = match action {
            HostAction::ShowDialog(_) => self.answer,
            HostAction::OpenExternalUrl(_) => ActionResult::Done,
        };
        self.actions.push(action);
        answer
    }

    fn on_layout_changed(&mut self, layout: &Layout) {
        self.layouts.push(*layout);
    }
}

pub fn mounts() -> Mounts {
    Mounts::new("canvas", "properties")
}

pub fn controller(key: &str) -> EditorController<MemoryEngine> {
    EditorController::new(key, MemoryEngine::new, Config::default())
}

pub fn deferred_controller(key: &str) -> EditorController<MemoryEngine> {
    EditorController::new(key, MemoryEngine::deferred, Config::default())
}

pub fn engine<'s>(store: &'s mut EditorStore<MemoryEngine>, key: &str) -> &'s mut MemoryEngine {
    &mut store.get_mut(key).expect("session exists").engine
}

pub fn sheet_ids(sheets: &[Sheet]) -> Vec<&str> {
    sheets.iter().map(|sheet| sheet.id.as_str()).collect()
}
