//! Editor actions triggered from menus and shortcuts.
//!
//! A few actions are handled by the session layer itself (resizing and the
//! properties panel layout). Zoom aliases are rewritten into the engine's
//! own commands. Everything else is forwarded to the active viewer unchanged.

use super::props::Layout;
use serde_json::{json, Value};
use std::str::FromStr;

/// An action requested by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    /// The canvas changed size.
    Resize,
    ToggleProperties,
    ResetProperties,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    ZoomFit,
    /// Any other action, forwarded as-is.
    Other { name: String, context: Value },
}

impl EditorAction {
    /// Creates an action from its name and context.
    #[must_use]
    pub fn new(name: &str, context: Value) -> Self {
        match name {
            "resize" => Self::Resize,
            "toggleProperties" => Self::ToggleProperties,
            "resetProperties" => Self::ResetProperties,
            "zoomIn" => Self::ZoomIn,
            "zoomOut" => Self::ZoomOut,
            "resetZoom" => Self::ResetZoom,
            "zoomFit" => Self::ZoomFit,
            other => Self::Other {
                name: other.to_string(),
                context,
            },
        }
    }

    /// The engine command this action translates to.
    ///
    /// Returns `None` for actions the session layer handles itself.
    #[must_use]
    pub fn engine_command(&self) -> Option<(&str, Value)> {
        match self {
            Self::Resize | Self::ToggleProperties | Self::ResetProperties => None,
            Self::ZoomIn => Some(("stepZoom", json!({ "value": 1 }))),
            Self::ZoomOut => Some(("stepZoom", json!({ "value": -1 }))),
            Self::ResetZoom => Some(("zoom", json!({ "value": 1 }))),
            Self::ZoomFit => Some(("zoom", json!({ "value": "fit-viewport" }))),
            Self::Other { name, context } => Some((name.as_str(), context.clone())),
        }
    }

    /// Layout after applying this action to `layout`, if it changes one.
    #[must_use]
    pub const fn apply_layout(&self, layout: Layout, default_width: u32) -> Option<Layout> {
        match self {
            Self::ToggleProperties => Some(layout.toggled_properties()),
            Self::ResetProperties => Some(layout.reset_properties(default_width)),
            _ => None,
        }
    }
}

impl FromStr for EditorAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s, Value::Null))
    }
}

/// What a triggered action did.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The active viewer was told about a resize.
    Resized,
    /// The action does not apply to the active view.
    Skipped,
    /// The host was asked to apply a new layout.
    LayoutChanged(Layout),
    /// The action was handed to the active viewer.
    Forwarded { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_aliases_map_to_engine_commands() {
        let cases = [
            ("zoomIn", "stepZoom", json!({ "value": 1 })),
            ("zoomOut", "stepZoom", json!({ "value": -1 })),
            ("resetZoom", "zoom", json!({ "value": 1 })),
            ("zoomFit", "zoom", json!({ "value": "fit-viewport" })),
        ];

        for (alias, command, context) in cases {
            let action: EditorAction = alias.parse().unwrap();
            assert_eq!(action.engine_command(), Some((command, context)), "{alias}");
        }
    }

    #[test]
    fn test_unknown_action_is_forwarded_with_context() {
        let action = EditorAction::new("selectAll", json!({ "scope": "rows" }));

        assert_eq!(
            action.engine_command(),
            Some(("selectAll", json!({ "scope": "rows" })))
        );
    }

    #[test]
    fn test_reset_properties_opens_panel_at_default_width() {
        let layout = Layout::default().toggled_properties().reset_properties(600);

        let reset = EditorAction::ResetProperties.apply_layout(layout, 250).unwrap();

        assert!(reset.properties_panel.open);
        assert_eq!(reset.properties_panel.width, 250);
        assert!(EditorAction::Resize.apply_layout(layout, 250).is_none());
    }
}
