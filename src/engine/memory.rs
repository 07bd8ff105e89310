//! In-memory reference engine.
//!
//! [`MemoryEngine`] implements [`Engine`] over a small JSON document model:
//! a decision requirements diagram plus its decisions, each decision carrying
//! a decision table or a literal expression. Each view gets its own viewer
//! with an independent command stack of rename edits.
//!
//! It backs the crate's tests and lets embedders exercise a host integration
//! without a rendering engine.
//!
//! # Document Format
//!
//! ```json
//! {
//!   "id": "dish",
//!   "name": "Dish",
//!   "initial": "season",
//!   "decisions": [
//!     { "id": "season", "name": "Season", "logic": "decisionTable" },
//!     { "id": "guests", "logic": "literalExpression", "order": 3 }
//!   ]
//! }
//! ```
//!
//! Element ids follow the XML name rules (a letter or `_` first, then letters,
//! digits, `_`, `-` or `.`). `initial` names the view opened after an import;
//! without it the diagram is opened.
//!
//! # Completion Modes
//!
//! An immediate engine completes import and export inside the call. A
//! deferred engine queues them until [`MemoryEngine::settle`], which models an
//! engine finishing on a later turn of the event loop.

use super::backend::{
    Callback, CommandStack, Element, Engine, ExportOptions, Exporter, ImageFormat, ImportOutcome,
    MountPoint, View, ViewKind, Viewer,
};
use super::events::{EngineEvent, EventBus};
use crate::domain::EngineError;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

/// Root of the JSON document model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Id of the element whose view opens after an import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    #[serde(default)]
    pub decisions: Vec<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exporter: Option<Exporter>,
}

/// A decision of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Decisions without logic have no view of their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<Logic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

/// Decision logic, determining the kind of view a decision gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Logic {
    DecisionTable,
    LiteralExpression,
}

/// One recorded rename.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Rename {
    element_id: String,
    name: String,
}

/// Linear undo/redo history of rename edits.
#[derive(Debug, Clone)]
pub struct MemoryCommandStack {
    edits: Vec<Rename>,
    index: i64,
}

impl Default for MemoryCommandStack {
    fn default() -> Self {
        Self {
            edits: Vec::new(),
            index: -1,
        }
    }
}

impl MemoryCommandStack {
    fn execute(&mut self, edit: Rename) {
        let keep = usize::try_from(self.index + 1).unwrap_or(0);
        self.edits.truncate(keep);
        self.edits.push(edit);
        self.index += 1;
    }

    /// Edits that are currently applied, oldest first.
    fn applied(&self) -> &[Rename] {
        let end = usize::try_from(self.index + 1).unwrap_or(0);
        &self.edits[..end.min(self.edits.len())]
    }
}

impl CommandStack for MemoryCommandStack {
    fn index(&self) -> i64 {
        self.index
    }

    fn can_undo(&self) -> bool {
        self.index >= 0
    }

    fn can_redo(&self) -> bool {
        usize::try_from(self.index + 1).map_or(false, |next| next < self.edits.len())
    }

    fn undo(&mut self) {
        if self.can_undo() {
            self.index -= 1;
        }
    }

    fn redo(&mut self) {
        if self.can_redo() {
            self.index += 1;
        }
    }
}

/// Viewer of one [`MemoryEngine`] view.
#[derive(Debug, Clone)]
pub struct MemoryViewer {
    kind: ViewKind,
    stack: MemoryCommandStack,
    selection: Vec<String>,
    properties_panel: Option<MountPoint>,
    triggered: Vec<(String, serde_json::Value)>,
    resize_count: u32,
}

impl MemoryViewer {
    fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            stack: MemoryCommandStack::default(),
            selection: Vec::new(),
            properties_panel: None,
            triggered: Vec::new(),
            resize_count: 0,
        }
    }

    /// Where the properties panel is rendered, if attached.
    #[must_use]
    pub const fn properties_panel(&self) -> Option<&MountPoint> {
        self.properties_panel.as_ref()
    }

    /// Editor actions received so far, with their context.
    #[must_use]
    pub fn triggered(&self) -> &[(String, serde_json::Value)] {
        &self.triggered
    }

    #[must_use]
    pub const fn resize_count(&self) -> u32 {
        self.resize_count
    }
}

impl Viewer for MemoryViewer {
    fn command_stack(&self) -> &dyn CommandStack {
        &self.stack
    }

    fn command_stack_mut(&mut self) -> &mut dyn CommandStack {
        &mut self.stack
    }

    fn selection_len(&self) -> usize {
        self.selection.len()
    }

    fn supports_svg(&self) -> bool {
        self.kind == ViewKind::Drd
    }

    fn trigger(&mut self, action: &str, context: &serde_json::Value) -> Result<(), EngineError> {
        if action.is_empty() {
            return Err(EngineError::new("empty editor action"));
        }
        self.triggered.push((action.to_string(), context.clone()));
        Ok(())
    }

    fn resized(&mut self) {
        self.resize_count += 1;
    }

    fn attach_properties_panel(&mut self, target: &MountPoint) {
        self.properties_panel = Some(target.clone());
    }
}

enum PendingOp {
    Import {
        content: String,
        done: Callback<ImportOutcome>,
    },
    ExportSource {
        options: ExportOptions,
        done: Callback<Result<String, EngineError>>,
    },
    ExportImage {
        format: ImageFormat,
        done: Callback<Result<Vec<u8>, EngineError>>,
    },
}

/// [`Engine`] over the JSON document model.
pub struct MemoryEngine {
    events: EventBus,
    document: Option<Document>,
    views: Vec<View>,
    viewers: Vec<MemoryViewer>,
    active: Option<usize>,
    attached: Option<MountPoint>,
    deferred: bool,
    pending: VecDeque<PendingOp>,
    destroy_count: Rc<Cell<u32>>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Creates an engine that completes operations immediately.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: EventBus::new(),
            document: None,
            views: Vec::new(),
            viewers: Vec::new(),
            active: None,
            attached: None,
            deferred: false,
            pending: VecDeque::new(),
            destroy_count: Rc::new(Cell::new(0)),
        }
    }

    /// Creates an engine that completes operations on [`Self::settle`].
    #[must_use]
    pub fn deferred() -> Self {
        Self {
            deferred: true,
            ..Self::new()
        }
    }

    /// Completes every queued operation, in order. Returns how many ran.
    pub fn settle(&mut self) -> usize {
        let mut completed = 0;
        while let Some(op) = self.pending.pop_front() {
            self.run(op);
            completed += 1;
        }
        completed
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Shared counter of `destroy` calls, readable after the engine is gone.
    #[must_use]
    pub fn destroy_probe(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.destroy_count)
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroy_count.get() > 0
    }

    #[must_use]
    pub const fn attached_to(&self) -> Option<&MountPoint> {
        self.attached.as_ref()
    }

    /// Viewer of the view showing element `id`.
    #[must_use]
    pub fn viewer(&self, id: &str) -> Option<&MemoryViewer> {
        self.views
            .iter()
            .position(|view| view.id() == id)
            .and_then(|index| self.viewers.get(index))
    }

    fn active_memory_viewer_mut(&mut self) -> Option<&mut MemoryViewer> {
        self.active.and_then(|index| self.viewers.get_mut(index))
    }

    /// Renames an element through the active viewer's command stack.
    ///
    /// # Errors
    ///
    /// Returns an error if no view is active.
    pub fn rename(&mut self, element_id: &str, name: &str) -> Result<(), EngineError> {
        let viewer = self
            .active_memory_viewer_mut()
            .ok_or_else(|| EngineError::new("no active view"))?;
        viewer.stack.execute(Rename {
            element_id: element_id.to_string(),
            name: name.to_string(),
        });
        self.events.fire(&EngineEvent::ContentChanged);
        Ok(())
    }

    /// Replaces the active viewer's selection.
    pub fn select(&mut self, ids: &[&str]) {
        if let Some(viewer) = self.active_memory_viewer_mut() {
            viewer.selection = ids.iter().map(|id| (*id).to_string()).collect();
            self.events.fire(&EngineEvent::SelectionChanged);
        }
    }

    /// Raises an engine error outside any explicit call.
    pub fn raise_error(&self, message: &str) {
        self.events.fire(&EngineEvent::Error(EngineError::new(message)));
    }

    fn dispatch(&mut self, op: PendingOp) {
        if self.deferred {
            self.pending.push_back(op);
        } else {
            self.run(op);
        }
    }

    fn run(&mut self, op: PendingOp) {
        match op {
            PendingOp::Import { content, done } => {
                let outcome = self.run_import(&content);
                done(outcome);
            }
            PendingOp::ExportSource { options, done } => {
                let result = self.run_export_source(&options);
                if result.is_ok() {
                    self.events.fire(&EngineEvent::Saved);
                }
                done(result);
            }
            PendingOp::ExportImage { format, done } => {
                done(self.run_export_image(format));
            }
        }
    }

    fn run_import(&mut self, content: &str) -> ImportOutcome {
        let _span = tracing::debug_span!("memory_engine_import", content_len = content.len()).entered();

        match Self::parse(content) {
            Ok((document, warnings)) => {
                self.load(document);
                tracing::debug!(views = self.views.len(), warnings = warnings.len(), "document imported");
                ImportOutcome::ok(warnings)
            }
            Err(error) => {
                tracing::debug!(error = %error, "import failed");
                self.document = None;
                self.views.clear();
                self.viewers.clear();
                self.active = None;
                self.fire_views_changed();
                ImportOutcome::failed(error)
            }
        }
    }

    fn parse(content: &str) -> Result<(Document, Vec<String>), EngineError> {
        let document: Document = serde_json::from_str(content)
            .map_err(|e| EngineError::new(format!("failed to parse document: {e}")))?;

        if !is_element_id(&document.id) {
            return Err(EngineError::new(format!("invalid element id '{}'", document.id)));
        }

        let mut seen = HashSet::from([document.id.as_str()]);
        let mut warnings = Vec::new();

        for decision in &document.decisions {
            if !is_element_id(&decision.id) {
                return Err(EngineError::new(format!("invalid element id '{}'", decision.id)));
            }
            if !seen.insert(decision.id.as_str()) {
                return Err(EngineError::new(format!("duplicate element id '{}'", decision.id)));
            }
            if decision.logic.is_none() {
                warnings.push(format!("decision '{}' has no decision logic", decision.id));
            }
        }

        Ok((document, warnings))
    }

    fn load(&mut self, document: Document) {
        let mut views = vec![View::new(
            Rc::new(Element {
                id: document.id.clone(),
                name: document.name.clone(),
            }),
            ViewKind::Drd,
        )];

        for decision in &document.decisions {
            let Some(logic) = decision.logic else {
                continue;
            };
            let kind = match logic {
                Logic::DecisionTable => ViewKind::DecisionTable,
                Logic::LiteralExpression => ViewKind::LiteralExpression,
            };
            let element = Rc::new(Element {
                id: decision.id.clone(),
                name: decision.name.clone(),
            });
            let view = View::new(element, kind);
            views.push(match decision.order {
                Some(order) => view.with_order(order),
                None => view,
            });
        }

        self.viewers = views.iter().map(|view| MemoryViewer::new(view.kind)).collect();
        self.views = views;
        self.document = Some(document);
        self.active = Some(0);
        self.fire_views_changed();
    }

    fn fire_views_changed(&self) {
        self.events.fire(&EngineEvent::ViewsChanged {
            views: self.views.clone(),
            active_view: self.active_view(),
        });
    }

    fn run_export_source(&self, options: &ExportOptions) -> Result<String, EngineError> {
        let mut document = self
            .document
            .clone()
            .ok_or_else(|| EngineError::new("no document imported"))?;

        for edit in self.viewers.iter().flat_map(|viewer| viewer.stack.applied()) {
            if document.id == edit.element_id {
                document.name = Some(edit.name.clone());
            } else if let Some(decision) = document
                .decisions
                .iter_mut()
                .find(|decision| decision.id == edit.element_id)
            {
                decision.name = Some(edit.name.clone());
            }
        }
        document.exporter = Some(options.exporter.clone());

        let serialized = if options.format {
            serde_json::to_string_pretty(&document)
        } else {
            serde_json::to_string(&document)
        };
        serialized.map_err(|e| EngineError::new(format!("failed to serialize document: {e}")))
    }

    fn run_export_image(&self, format: ImageFormat) -> Result<Vec<u8>, EngineError> {
        let (view, viewer) = self
            .active
            .and_then(|index| Some((self.views.get(index)?, self.viewers.get(index)?)))
            .ok_or_else(|| EngineError::new("no active view"))?;

        if !viewer.supports_svg() {
            return Err(EngineError::new(format!("{} views cannot be exported as images", view.kind)));
        }

        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" data-view=\"{}\"/>",
            view.id()
        );

        // Raster formats carry the SVG source behind a format tag.
        Ok(match format {
            ImageFormat::Svg => svg.into_bytes(),
            ImageFormat::Png | ImageFormat::Jpeg => format!("{format}:{svg}").into_bytes(),
        })
    }
}

/// Returns `true` if `id` is a valid element id.
fn is_element_id(id: &str) -> bool {
    let mut chars = id.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

impl Engine for MemoryEngine {
    fn events(&self) -> &EventBus {
        &self.events
    }

    fn import_source(&mut self, content: &str, done: Callback<ImportOutcome>) {
        self.dispatch(PendingOp::Import {
            content: content.to_string(),
            done,
        });
    }

    fn views(&self) -> Vec<View> {
        self.views.clone()
    }

    fn active_view(&self) -> Option<View> {
        self.active.and_then(|index| self.views.get(index)).cloned()
    }

    fn initial_view(&self) -> Option<View> {
        let initial = self
            .document
            .as_ref()
            .and_then(|document| document.initial.as_deref());

        initial
            .and_then(|id| self.views.iter().find(|view| view.id() == id))
            .or_else(|| self.views.first())
            .cloned()
    }

    fn open(&mut self, view: &View) {
        let Some(index) = self.views.iter().position(|candidate| candidate.is(view)) else {
            tracing::warn!(view_id = %view.id(), "cannot open view of another document");
            return;
        };

        if self.active != Some(index) {
            self.active = Some(index);
            self.fire_views_changed();
        }
    }

    fn stack_index_of(&self, view: &View) -> Option<i64> {
        self.views
            .iter()
            .position(|candidate| candidate.is(view))
            .and_then(|index| self.viewers.get(index))
            .map(|viewer| viewer.stack.index)
    }

    fn active_viewer(&self) -> Option<&dyn Viewer> {
        self.active
            .and_then(|index| self.viewers.get(index))
            .map(|viewer| viewer as &dyn Viewer)
    }

    fn active_viewer_mut(&mut self) -> Option<&mut dyn Viewer> {
        self.active_memory_viewer_mut()
            .map(|viewer| viewer as &mut dyn Viewer)
    }

    fn export_source(
        &mut self,
        options: &ExportOptions,
        done: Callback<Result<String, EngineError>>,
    ) {
        self.dispatch(PendingOp::ExportSource {
            options: options.clone(),
            done,
        });
    }

    fn export_image(
        &mut self,
        format: ImageFormat,
        done: Callback<Result<Vec<u8>, EngineError>>,
    ) {
        self.dispatch(PendingOp::ExportImage { format, done });
    }

    fn attach_to(&mut self, target: &MountPoint) -> Result<(), EngineError> {
        if self.is_destroyed() {
            return Err(EngineError::new("engine destroyed"));
        }
        self.attached = Some(target.clone());
        self.events.fire(&EngineEvent::Attached);
        Ok(())
    }

    fn detach(&mut self) {
        self.attached = None;
    }

    fn destroy(&mut self) {
        tracing::debug!("destroying memory engine");
        self.destroy_count.set(self.destroy_count.get() + 1);
        self.pending.clear();
        self.views.clear();
        self.viewers.clear();
        self.active = None;
        self.attached = None;
    }
}

impl fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("document", &self.document.as_ref().map(|d| &d.id))
            .field("views", &self.views.len())
            .field("active", &self.active)
            .field("deferred", &self.deferred)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
