//! Editor capability snapshot.
//!
//! After every change that could affect what the user may do, the controller
//! derives an [`EditorSnapshot`] and hands it to the host, which uses it to
//! enable or disable menu entries and shortcuts. The base flags are the same
//! for every view; the rest is a [`ViewCapabilities`] variant chosen by the
//! active view's [`ViewKind`].
//!
//! Serialized, a snapshot is a single flat map of camelCase flags.

use crate::domain::Result;
use crate::engine::{ImageFormat, ViewKind};
use serde::{Serialize, Serializer};

/// Facts about the active viewer that the snapshot is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotInputs {
    pub dirty: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    /// A text input has keyboard focus.
    pub input_active: bool,
    pub selection_len: usize,
    pub has_selection: bool,
    pub supports_svg: bool,
}

/// Flags specific to the decision requirements diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrdCapabilities {
    pub default_copy_cut_paste: bool,
    pub default_undo_redo: bool,
    pub edit_label: bool,
    pub lasso_tool: bool,
    pub move_canvas: bool,
    pub move_selection: bool,
    pub remove_selected: bool,
    pub select_all: bool,
    pub zoom: bool,
}

/// Flags specific to decision tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionTableCapabilities {
    pub default_copy_cut_paste: bool,
    pub default_undo_redo: bool,
    pub has_selection: bool,
    pub remove_selected: bool,
    pub select_all: bool,
    pub dmn_rule_editing: bool,
    pub dmn_clause_editing: bool,
}

/// Flags specific to literal expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteralExpressionCapabilities {
    pub default_copy_cut_paste: bool,
    pub default_undo_redo: bool,
    pub remove_selected: bool,
    pub select_all: bool,
}

/// Per-view-kind capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ViewCapabilities {
    Drd(DrdCapabilities),
    DecisionTable(DecisionTableCapabilities),
    LiteralExpression(LiteralExpressionCapabilities),
}

impl ViewCapabilities {
    /// Derives the flags of `kind` from the viewer facts.
    #[must_use]
    pub const fn derive(kind: ViewKind, inputs: &SnapshotInputs) -> Self {
        let input_active = inputs.input_active;
        let selected = inputs.selection_len > 0;

        match kind {
            ViewKind::Drd => Self::Drd(DrdCapabilities {
                default_copy_cut_paste: input_active,
                default_undo_redo: input_active,
                edit_label: !input_active && selected,
                lasso_tool: !input_active,
                move_canvas: !input_active,
                move_selection: !input_active && selected,
                remove_selected: input_active || selected,
                select_all: true,
                zoom: true,
            }),
            ViewKind::DecisionTable => Self::DecisionTable(DecisionTableCapabilities {
                default_copy_cut_paste: true,
                default_undo_redo: true,
                has_selection: inputs.has_selection,
                remove_selected: input_active,
                select_all: input_active,
                dmn_rule_editing: selected,
                dmn_clause_editing: selected,
            }),
            ViewKind::LiteralExpression => {
                Self::LiteralExpression(LiteralExpressionCapabilities {
                    default_copy_cut_paste: true,
                    default_undo_redo: true,
                    remove_selected: true,
                    select_all: true,
                })
            }
        }
    }
}

/// What the user may do in the editor right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    pub close: bool,
    pub copy: bool,
    pub cut: bool,
    pub paste: bool,
    pub dirty: bool,
    /// Image formats offered for export; serialized as `false` when empty.
    #[serde(serialize_with = "serialize_formats")]
    pub export_as: Vec<ImageFormat>,
    pub input_active: bool,
    pub properties_panel: bool,
    pub redo: bool,
    pub save: bool,
    pub undo: bool,

    #[serde(flatten)]
    pub view: ViewCapabilities,

    pub active_editor: ViewKind,
    pub dmn: bool,
    pub editable: bool,
    pub elements_selected: bool,
    pub inactive_input: bool,
}

impl EditorSnapshot {
    /// Derives the snapshot for an active view of `kind`.
    ///
    /// `formats` are the image formats the host offers; they are only listed
    /// when the viewer can render itself as SVG.
    #[must_use]
    pub fn derive(kind: ViewKind, inputs: &SnapshotInputs, formats: &[ImageFormat]) -> Self {
        let export_as = if inputs.supports_svg {
            formats.to_vec()
        } else {
            Vec::new()
        };

        Self {
            close: true,
            copy: false,
            cut: false,
            paste: false,
            dirty: inputs.dirty,
            export_as,
            input_active: inputs.input_active,
            properties_panel: true,
            redo: inputs.can_redo,
            save: true,
            undo: inputs.can_undo,
            view: ViewCapabilities::derive(kind, inputs),
            active_editor: kind,
            dmn: true,
            editable: true,
            elements_selected: inputs.selection_len > 0,
            inactive_input: !inputs.input_active,
        }
    }

    /// Flattens the snapshot into a map of named flags.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_flags(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(flags) => Ok(flags),
            _ => Ok(serde_json::Map::new()),
        }
    }
}

fn serialize_formats<S: Serializer>(
    formats: &[ImageFormat],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if formats.is_empty() {
        serializer.serialize_bool(false)
    } else {
        formats.serialize(serializer)
    }
}
