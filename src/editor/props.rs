//! Inputs the host hands to an editor controller.

use serde::{Deserialize, Serialize};

/// Default width of the properties panel.
pub const DEFAULT_PANEL_WIDTH: u32 = 250;

/// Host-owned layout of the editor's panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub properties_panel: PanelLayout,
}

/// Visibility and size of one side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelLayout {
    pub open: bool,
    pub width: u32,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self {
            open: false,
            width: DEFAULT_PANEL_WIDTH,
        }
    }
}

impl Layout {
    /// Same layout with the properties panel toggled.
    #[must_use]
    pub const fn toggled_properties(self) -> Self {
        Self {
            properties_panel: PanelLayout {
                open: !self.properties_panel.open,
                width: self.properties_panel.width,
            },
        }
    }

    /// Same layout with the properties panel open at `width`.
    #[must_use]
    pub const fn reset_properties(self, width: u32) -> Self {
        Self {
            properties_panel: PanelLayout { open: true, width },
        }
    }
}

/// Properties of one editor render.
///
/// `content` is the document source the host wants shown. `active_sheet` is
/// the id of the sheet the host has selected, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorProps {
    pub content: String,
    pub active_sheet: Option<String>,
    pub layout: Layout,
}

impl EditorProps {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_active_sheet(mut self, id: impl Into<String>) -> Self {
        self.active_sheet = Some(id.into());
        self
    }

    #[must_use]
    pub const fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_keeps_width() {
        let layout = Layout::default().reset_properties(400).toggled_properties();

        assert!(!layout.properties_panel.open);
        assert_eq!(layout.properties_panel.width, 400);
    }

    #[test]
    fn test_layout_serializes_camel_case() {
        let json = serde_json::to_value(Layout::default()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "propertiesPanel": { "open": false, "width": 250 } })
        );
    }
}
