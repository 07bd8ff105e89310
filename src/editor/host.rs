//! Host integration surface.
//!
//! The host is the application shell that owns tabs, menus, dialogs and the
//! log. A controller reports everything that happens in its session through
//! the [`Host`] trait and asks the host for user decisions through
//! [`Host::on_action`].

use super::props::Layout;
use super::snapshot::EditorSnapshot;
use crate::domain::{EngineError, SessionError, Sheet};
use serde::Serialize;

/// A decision the host may ask the user for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialog {
    pub title: String,
    pub message: String,
    pub detail: String,
    pub buttons: Vec<DialogButton>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogButton {
    pub choice: DialogChoice,
    pub label: String,
}

/// The answer to a [`Dialog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogChoice {
    ShowDetails,
    AskInForum,
    Dismissed,
}

impl Dialog {
    /// Dialog explaining why a document could not be displayed.
    #[must_use]
    pub fn import_error(error: &EngineError) -> Self {
        Self {
            title: "Import Error".to_string(),
            message: "Ooops, we could not display this diagram!".to_string(),
            detail: error.to_string(),
            buttons: vec![
                DialogButton {
                    choice: DialogChoice::ShowDetails,
                    label: "Show Details".to_string(),
                },
                DialogButton {
                    choice: DialogChoice::AskInForum,
                    label: "Ask in Forum".to_string(),
                },
            ],
        }
    }
}

/// Requests a controller dispatches to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    ShowDialog(Dialog),
    OpenExternalUrl(String),
}

/// The host's reply to a [`HostAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionResult {
    /// Handled, nothing to report back.
    #[default]
    Done,
    /// The user answered a dialog.
    Chosen(DialogChoice),
}

/// Callbacks from an editor controller into its host.
///
/// All methods run on the host's UI thread, synchronously inside the
/// controller call that caused them. Changes the engine starts on its own
/// reach the host from `EditorController::pump`, which the host calls in the
/// same turn.
pub trait Host {
    /// An import finished, successfully if `error` is `None`.
    fn on_import(&mut self, error: Option<&EngineError>, warnings: &[String]);

    /// The sheet list or the active sheet changed.
    fn on_sheets_changed(&mut self, sheets: &[Sheet], active_sheet: Option<&Sheet>);

    /// The editor's capability snapshot was recomputed.
    fn on_changed(&mut self, snapshot: &EditorSnapshot);

    fn on_error(&mut self, error: &SessionError);

    fn on_warning(&mut self, warning: &str);

    /// Dispatches a request that needs the host's cooperation.
    fn on_action(&mut self, action: HostAction) -> ActionResult;

    /// The editor asks for a different panel layout.
    fn on_layout_changed(&mut self, _layout: &Layout) {}

    /// Whether a text input currently has keyboard focus.
    fn input_active(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_error_dialog_offers_forum() {
        let dialog = Dialog::import_error(&EngineError::new("unparsable content"));

        assert_eq!(dialog.detail, "unparsable content");
        assert!(dialog
            .buttons
            .iter()
            .any(|button| button.choice == DialogChoice::AskInForum));
    }

    #[test]
    fn test_choice_serializes_kebab_case() {
        let json = serde_json::to_string(&DialogChoice::AskInForum).unwrap();
        assert_eq!(json, "\"ask-in-forum\"");
    }
}
