//! Editor layer.
//!
//! This module holds the per-tab editor session: the cached [`EditorState`],
//! the [`EditorController`] that keeps it in sync with the host's props and
//! the engine, and the [`Host`] trait through which the controller reports
//! back.
//!
//! # Modules
//!
//! - [`state`]: Cached session entry and its patch type
//! - [`controller`]: Import reconciliation, sheet switching, source export
//! - [`host`]: Host callbacks, actions and dialogs
//! - [`props`]: Props and panel layout
//! - [`snapshot`]: Capability snapshot for menus
//! - [`actions`]: Editor actions
//!
//! Dirty and undo tracking lives in a private module extending [`EditorState`].

pub mod actions;
pub mod controller;
mod dirty;
pub mod host;
pub mod props;
pub mod snapshot;
pub mod state;

pub use actions::{ActionOutcome, EditorAction};
pub use controller::{EditorController, EditorStore, Mounts};
pub use host::{ActionResult, Dialog, DialogButton, DialogChoice, Host, HostAction};
pub use props::{EditorProps, Layout, PanelLayout};
pub use snapshot::{EditorSnapshot, SnapshotInputs, ViewCapabilities};
pub use state::{EditorPatch, EditorState};
