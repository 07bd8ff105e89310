//! Cached editor session state.
//!
//! [`EditorState`] is the session entry stored under a tab's key: the engine
//! instance plus everything derived from it that must survive the editor
//! being unmounted and mounted again.

use crate::cache::{CacheEntry, Merge};
use crate::domain::{NoticeSlot, Sheet};
use crate::engine::{Engine, View};

/// Session entry of one open document.
#[derive(Debug)]
pub struct EditorState<E> {
    /// Engine instance, alive for the whole tab lifetime.
    pub engine: E,

    /// Source the engine currently holds: set by a successful import or
    /// source export.
    pub last_imported: Option<String>,

    /// Newest known document source, including edits made outside the
    /// engine (e.g. in the fallback source view).
    pub latest_source: Option<String>,

    /// Command stack position at the last sync checkpoint.
    pub stack_index: i64,

    /// View whose command stack `stack_index` was read from.
    pub checkpoint_view: Option<View>,

    /// Explicit dirty flag for engine edits, folded in at sheet switches.
    pub dirty: bool,

    /// Source edited outside the engine and not saved since.
    pub source_dirty: bool,

    pub active_view: Option<View>,
    pub views: Vec<View>,

    /// Ordered sheets, fallback included.
    pub sheets: Vec<Sheet>,
    pub active_sheet: Option<Sheet>,

    pub notice: NoticeSlot,
}

impl<E: Engine> EditorState<E> {
    /// Creates the initial state around a fresh engine.
    pub fn new(engine: E) -> Self {
        let stack_index = engine.stack_index();
        let checkpoint_view = engine.active_view();
        Self {
            engine,
            last_imported: None,
            latest_source: None,
            stack_index,
            checkpoint_view,
            dirty: false,
            source_dirty: false,
            active_view: None,
            views: Vec::new(),
            sheets: Vec::new(),
            active_sheet: None,
            notice: NoticeSlot::default(),
        }
    }
}

impl<E: Engine + 'static> EditorState<E> {
    /// Wraps the state into a store entry that destroys the engine on teardown.
    #[must_use]
    pub fn into_entry(self) -> CacheEntry<Self> {
        CacheEntry::with_teardown(self, |state| state.engine.destroy())
    }
}

/// Partial update of an [`EditorState`].
#[derive(Debug, Default)]
pub struct EditorPatch {
    pub last_imported: Option<Option<String>>,
    pub latest_source: Option<Option<String>>,
    pub stack_index: Option<i64>,
    pub checkpoint_view: Option<Option<View>>,
    pub dirty: Option<bool>,
    pub source_dirty: Option<bool>,
    pub active_view: Option<Option<View>>,
    pub views: Option<Vec<View>>,
    pub sheets: Option<Vec<Sheet>>,
    pub active_sheet: Option<Option<Sheet>>,
}

impl<E> Merge for EditorState<E> {
    type Patch = EditorPatch;

    fn merge(&mut self, patch: EditorPatch) {
        if let Some(last_imported) = patch.last_imported {
            self.last_imported = last_imported;
        }
        if let Some(latest_source) = patch.latest_source {
            self.latest_source = latest_source;
        }
        if let Some(stack_index) = patch.stack_index {
            self.stack_index = stack_index;
        }
        if let Some(checkpoint_view) = patch.checkpoint_view {
            self.checkpoint_view = checkpoint_view;
        }
        if let Some(dirty) = patch.dirty {
            self.dirty = dirty;
        }
        if let Some(source_dirty) = patch.source_dirty {
            self.source_dirty = source_dirty;
        }
        if let Some(active_view) = patch.active_view {
            self.active_view = active_view;
        }
        if let Some(views) = patch.views {
            self.views = views;
        }
        if let Some(sheets) = patch.sheets {
            self.sheets = sheets;
        }
        if let Some(active_sheet) = patch.active_sheet {
            self.active_sheet = active_sheet;
        }
    }
}
