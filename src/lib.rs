//! Modeler Session: editor-session cache and multi-sheet sync for diagram modelers.
//!
//! A diagram modeler shows each open document in a tab. Behind every tab sits
//! an expensive modeling engine instance, and the editor component rendering
//! that engine is mounted and unmounted as the user switches tabs. This crate
//! keeps the engine and its derived state alive across those remounts and
//! keeps the document, the engine and the host's tab in sync:
//! - A keyed session store that owns one engine per tab until the tab closes
//! - Import reconciliation that re-imports only when the source really changed
//! - Sheets derived from the engine's views, plus a fallback source sheet
//! - Dirty tracking across per-view command stacks
//! - A single-slot notice for import warnings
//!
//! # Architecture
//!
//! The crate follows a layered architecture pattern:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Host application (tabs, menus, dialogs, log)       │  ← Embedder
//! └─────────────────────────────────────────────────────┘
//!                        │  Host trait / props
//! ┌─────────────────────────────────────────────────────┐
//! │  Editor Layer (editor/)                             │  ← Controller
//! │  - Import reconciliation                            │
//! │  - Sheet switching and dirty tracking               │
//! │  - Capability snapshot and actions                  │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Cache Layer   │   │ Sheets        │   │ Engine Layer  │
//! │ (cache/)      │   │ (sheets/)     │   │ (engine/)     │
//! │ - Store       │   │ - Derivation  │   │ - Engine trait│
//! │ - Binding     │   │ - Ordering    │   │ - Event bus   │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain Layer (domain/)                             │
//! │  - Error types, sheets, notices, tabs               │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: Session store and per-key state binding
//! - [`domain`]: Core domain types (errors, sheets, notices, tabs)
//! - [`editor`]: Editor controller and its host interface
//! - [`engine`]: Modeling engine abstraction and in-memory engine
//! - [`sheets`]: Sheet derivation and ordering
//! - [`observability`]: Tracing subscriber setup
//!
//! # Configuration
//!
//! ```toml
//! exporter_name = "Diagram Modeler"
//! exporter_version = "5.0.0"
//! export_formats = ["png", "svg"]
//! properties_panel_width = 300
//! fallback_sheet_name = "XML"
//! trace_level = "debug"
//! ```
//!
//! # Examples
//!
//! ```rust
//! use modeler_session::editor::{EditorController, EditorStore};
//! use modeler_session::{Config, MemoryEngine};
//!
//! let mut store: EditorStore<MemoryEngine> = EditorStore::new();
//! let controller = EditorController::new("tab-1", MemoryEngine::new, Config::default());
//!
//! assert!(!controller.is_dirty(&mut store));
//! assert!(store.has("tab-1"));
//! ```
//!
//! # Threading
//!
//! Everything runs on the host's single UI thread. Engine completions may
//! arrive synchronously or on a later turn; the controller queues them and
//! applies them in order, and drops them once it is unmounted.

pub mod cache;
pub mod domain;
pub mod editor;
pub mod engine;
pub mod sheets;

pub mod observability;

pub use cache::{CacheEntry, CachedState, Merge, SessionKey, SessionStore};
pub use domain::{EngineError, Result, SessionError, Sheet};
pub use editor::{EditorController, EditorProps, EditorStore, Host};
pub use engine::{Engine, ImageFormat, MemoryEngine};

use engine::Exporter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const DEFAULT_FORUM_URL: &str = "https://forum.camunda.io/c/modeler/";

/// Session configuration.
///
/// Every field has a default, so an empty map or an empty TOML file yields
/// [`Config::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name written into exported documents.
    pub exporter_name: String,

    /// Version written into exported documents.
    pub exporter_version: String,

    /// Image formats offered by the capability snapshot.
    ///
    /// Default: `png`, `jpeg`, `svg`
    pub export_formats: Vec<ImageFormat>,

    /// Width the properties panel is reset to. Default: 250
    pub properties_panel_width: u32,

    /// Display name of the fallback source sheet. Default: `"XML"`
    pub fallback_sheet_name: String,

    /// Page opened when the user asks for help with an import error.
    pub forum_url: String,

    /// Default tracing filter.
    ///
    /// Options: `trace`, `debug`, `info`, `warn`, `error`. Default: `"info"`
    pub trace_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exporter_name: env!("CARGO_PKG_NAME").to_string(),
            exporter_version: env!("CARGO_PKG_VERSION").to_string(),
            export_formats: vec![ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Svg],
            properties_panel_width: editor::props::DEFAULT_PANEL_WIDTH,
            fallback_sheet_name: "XML".to_string(),
            forum_url: DEFAULT_FORUM_URL.to_string(),
            trace_level: None,
        }
    }
}

impl Config {
    /// Parses configuration from a flat string map.
    ///
    /// # Parsing Rules
    ///
    /// - `export_formats`: Comma-separated string (unknown formats are skipped)
    /// - `properties_panel_width`: String → `u32` (falls back to 250 on parse error)
    /// - Other keys are taken verbatim
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use modeler_session::{Config, ImageFormat};
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("export_formats".to_string(), "svg, jpg".to_string());
    /// map.insert("properties_panel_width".to_string(), "320".to_string());
    ///
    /// let config = Config::from_map(&map);
    /// assert_eq!(config.export_formats, vec![ImageFormat::Svg, ImageFormat::Jpeg]);
    /// assert_eq!(config.properties_panel_width, 320);
    /// ```
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();

        let export_formats = map
            .get("export_formats")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .filter_map(|f| {
                        f.parse::<ImageFormat>()
                            .map_err(|e| tracing::debug!(error = %e, "skipping export format"))
                            .ok()
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or(defaults.export_formats);

        let properties_panel_width = map
            .get("properties_panel_width")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.properties_panel_width);

        Self {
            exporter_name: map.get("exporter_name").cloned().unwrap_or(defaults.exporter_name),
            exporter_version: map
                .get("exporter_version")
                .cloned()
                .unwrap_or(defaults.exporter_version),
            export_formats,
            properties_panel_width,
            fallback_sheet_name: map
                .get("fallback_sheet_name")
                .cloned()
                .unwrap_or(defaults.fallback_sheet_name),
            forum_url: map.get("forum_url").cloned().unwrap_or(defaults.forum_url),
            trace_level: map.get("trace_level").cloned(),
        }
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Toml`] if the text is not valid TOML for this
    /// structure, or [`SessionError::Config`] if a value is out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Io`] if the file cannot be read, otherwise see
    /// [`Config::from_toml_str`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading config file");
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<()> {
        if self.properties_panel_width == 0 {
            return Err(SessionError::Config(
                "properties_panel_width must be positive".to_string(),
            ));
        }
        if self.fallback_sheet_name.trim().is_empty() {
            return Err(SessionError::Config(
                "fallback_sheet_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Exporter identification handed to engines.
    #[must_use]
    pub fn exporter(&self) -> Exporter {
        Exporter {
            name: self.exporter_name.clone(),
            version: self.exporter_version.clone(),
        }
    }
}
