//! Tab domain model.
//!
//! A tab is one open document in the host application. Each tab owns exactly
//! one editor session for as long as it stays open.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The file a tab edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabFile {
    /// Display name, e.g. `diagram_1.dmn`.
    pub name: String,
    /// Location on disk, `None` until the file is first written.
    pub path: Option<PathBuf>,
}

/// An open document tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Stable tab identifier, used as the session key.
    pub id: String,
    pub file: TabFile,
}

impl Tab {
    /// Creates a tab for a file that has not been saved yet.
    ///
    /// # Examples
    ///
    /// ```
    /// use modeler_session::domain::Tab;
    ///
    /// let tab = Tab::untitled("tab-1", "diagram_1.dmn");
    /// assert!(tab.file.path.is_none());
    /// ```
    pub fn untitled(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: TabFile {
                name: name.into(),
                path: None,
            },
        }
    }
}

/// Returns `true` when the tab's file has never been written to disk.
#[must_use]
pub fn is_unsaved(tab: &Tab) -> bool {
    tab.file.path.is_none()
}
