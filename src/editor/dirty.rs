//! Dirty and undo/redo tracking.
//!
//! Dirtiness is never stored as ground truth. It is recomputed on every check
//! from the explicit flags and the distance between the engine's current
//! command stack position and the position recorded at the last checkpoint.
//!
//! Checkpoints are: a successful import, a successful source export, and the
//! boundary of every sheet switch. Each view may carry its own command stack,
//! so a switch first folds the drift of the outgoing view into the explicit
//! flag and then re-bases the position on the incoming view.

use super::state::EditorState;
use crate::engine::Engine;

impl<E: Engine> EditorState<E> {
    /// Returns `true` if there are edits since the last import or save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.source_dirty || self.is_engine_dirty()
    }

    /// Returns `true` if the engine holds edits not yet exported.
    #[must_use]
    pub fn is_engine_dirty(&self) -> bool {
        self.dirty || self.has_drift()
    }

    /// Returns `true` if the checkpoint's command stack moved since the checkpoint.
    ///
    /// Drift is read from the view the checkpoint was taken on, which is no
    /// longer the active one after the engine switched views by itself.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        self.checkpoint_position() != self.stack_index
    }

    /// Current position of the checkpoint view's stack, or of the active
    /// stack once that view is gone.
    fn checkpoint_position(&self) -> i64 {
        self.checkpoint_view
            .as_ref()
            .and_then(|view| self.engine.stack_index_of(view))
            .unwrap_or_else(|| self.engine.stack_index())
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.engine
            .active_viewer()
            .is_some_and(|viewer| viewer.command_stack().can_undo())
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.engine
            .active_viewer()
            .is_some_and(|viewer| viewer.command_stack().can_redo())
    }

    /// Folds command stack drift into the explicit dirty flag.
    pub fn fold_drift(&mut self) {
        self.dirty = self.is_engine_dirty();
    }

    /// Re-bases the checkpoint on the engine's current position.
    pub fn rebase_position(&mut self) {
        self.stack_index = self.engine.stack_index();
        self.checkpoint_view = self.engine.active_view();
    }

    /// Marks engine state as in sync with the last imported or exported source.
    pub fn mark_synced(&mut self) {
        self.dirty = false;
        self.rebase_position();
    }
}
