//! Modeling engine abstraction.
//!
//! This module defines the [`Engine`] trait: the capability surface the session
//! layer consumes from a diagram modeling engine (import, export, views,
//! command stacks). The engine itself is opaque; rendering is its own business.
//!
//! # Asynchronous operations
//!
//! Import and export complete through a [`Callback`] that the engine invokes
//! exactly once, either synchronously or on a later turn of the host's event
//! loop. Callers must not assume either.

use super::events::EventBus;
use crate::domain::EngineError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Completion callback of an asynchronous engine operation.
pub type Callback<T> = Box<dyn FnOnce(T)>;

/// A structural document element that a view renders.
#[derive(Debug, PartialEq, Eq)]
pub struct Element {
    pub id: String,
    pub name: Option<String>,
}

/// Shared handle to an element.
///
/// Engines hand out the same `Rc` for as long as an element lives; a reimport
/// creates fresh elements, so pointer identity does not survive it.
pub type ElementRef = Rc<Element>;

/// The type of an engine view.
///
/// This is a closed set: every per-view-type behavior of the session layer
/// dispatches on it once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Decision requirements diagram, the document root.
    Drd,
    DecisionTable,
    LiteralExpression,
}

impl ViewKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drd => "drd",
            Self::DecisionTable => "decisionTable",
            Self::LiteralExpression => "literalExpression",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ViewKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One engine view over a document element.
#[derive(Debug, Clone)]
pub struct View {
    pub element: ElementRef,
    pub kind: ViewKind,
    /// Explicit ordering data, overriding the per-kind sort order.
    pub order: Option<i32>,
}

impl View {
    #[must_use]
    pub const fn new(element: ElementRef, kind: ViewKind) -> Self {
        Self {
            element,
            kind,
            order: None,
        }
    }

    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Id of the element behind this view.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.element.id
    }

    /// Returns `true` if both handles refer to the very same view.
    ///
    /// Compares element identity, not ids: a view from before a reimport is
    /// never `is` a view from after it.
    #[must_use]
    pub fn is(&self, other: &Self) -> bool {
        self.kind == other.kind && Rc::ptr_eq(&self.element, &other.element)
    }

    /// Returns `true` if this view renders exactly `element`.
    #[must_use]
    pub fn shows(&self, element: &ElementRef) -> bool {
        Rc::ptr_eq(&self.element, element)
    }
}

/// Result of an import, handed to the import callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Set when the content could not be imported.
    pub error: Option<EngineError>,
    /// Caveats reported for content that did import.
    pub warnings: Vec<String>,
}

impl ImportOutcome {
    #[must_use]
    pub const fn ok(warnings: Vec<String>) -> Self {
        Self {
            error: None,
            warnings,
        }
    }

    #[must_use]
    pub const fn failed(error: EngineError) -> Self {
        Self {
            error: Some(error),
            warnings: Vec::new(),
        }
    }
}

/// Host-side surface an engine or panel renders into.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountPoint(pub String);

impl From<&str> for MountPoint {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identification written into exported documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exporter {
    pub name: String,
    pub version: String,
}

/// Options for exporting the document source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Pretty-print the exported source.
    pub format: bool,
    pub exporter: Exporter,
}

/// Image formats a diagram can be exported as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Svg,
}

impl ImageFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Svg => "svg",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "svg" => Ok(Self::Svg),
            other => Err(format!("unsupported image format: {other}")),
        }
    }
}

/// Undo/redo history of one viewer.
///
/// Positions are assigned monotonically; `-1` marks an empty history. Equal
/// positions imply no net edit between them.
pub trait CommandStack {
    fn index(&self) -> i64;
    fn can_undo(&self) -> bool;
    fn can_redo(&self) -> bool;
    fn undo(&mut self);
    fn redo(&mut self);
}

/// The editor currently rendering the active view.
pub trait Viewer {
    fn command_stack(&self) -> &dyn CommandStack;

    fn command_stack_mut(&mut self) -> &mut dyn CommandStack;

    /// Number of selected elements, rows, or cells.
    fn selection_len(&self) -> usize;

    fn has_selection(&self) -> bool {
        self.selection_len() > 0
    }

    /// Whether this viewer can render itself as SVG.
    fn supports_svg(&self) -> bool;

    /// Runs a named editor action (zoom, select all, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the viewer does not know the action.
    fn trigger(&mut self, action: &str, context: &serde_json::Value) -> Result<(), EngineError>;

    /// Notifies the viewer that its canvas changed size.
    fn resized(&mut self);

    /// Renders the properties panel of this viewer into `target`.
    fn attach_properties_panel(&mut self, target: &MountPoint);
}

/// Capability surface of a modeling engine.
///
/// One engine instance serves one session for the session's whole lifetime.
/// All calls happen on the host's single UI thread.
pub trait Engine {
    /// Event bus on which the engine announces state changes.
    fn events(&self) -> &EventBus;

    /// Imports document source, replacing the current document.
    ///
    /// `done` is invoked exactly once.
    fn import_source(&mut self, content: &str, done: Callback<ImportOutcome>);

    /// All views of the current document, in discovery order.
    fn views(&self) -> Vec<View>;

    /// Returns the view rendering `element`, matched by identity.
    fn view(&self, element: &ElementRef) -> Option<View> {
        self.views().into_iter().find(|view| view.shows(element))
    }

    fn active_view(&self) -> Option<View>;

    /// The view the engine opens by default after an import.
    fn initial_view(&self) -> Option<View> {
        self.views().into_iter().next()
    }

    /// Activates `view`.
    fn open(&mut self, view: &View);

    fn active_viewer(&self) -> Option<&dyn Viewer>;

    fn active_viewer_mut(&mut self) -> Option<&mut dyn Viewer>;

    /// Command stack position of the active viewer, `-1` without one.
    fn stack_index(&self) -> i64 {
        self.active_viewer()
            .map_or(-1, |viewer| viewer.command_stack().index())
    }

    /// Command stack position of the viewer behind `view`, active or not.
    ///
    /// `None` if `view` is not part of the current document. The default only
    /// knows the active viewer.
    fn stack_index_of(&self, view: &View) -> Option<i64> {
        self.active_view()
            .filter(|active| active.is(view))
            .map(|_| self.stack_index())
    }

    /// Serializes the current document. `done` is invoked exactly once.
    fn export_source(
        &mut self,
        options: &ExportOptions,
        done: Callback<Result<String, EngineError>>,
    );

    /// Renders the active view as an image. `done` is invoked exactly once.
    fn export_image(
        &mut self,
        format: ImageFormat,
        done: Callback<Result<Vec<u8>, EngineError>>,
    );

    /// Starts rendering into `target`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot render (e.g. after `destroy`).
    fn attach_to(&mut self, target: &MountPoint) -> Result<(), EngineError>;

    fn detach(&mut self);

    /// Releases every engine resource. Called once, at session teardown.
    fn destroy(&mut self);
}
