//! Editor controller: import reconciliation and sheet synchronization.
//!
//! An [`EditorController`] is the short-lived half of an editor session. It
//! is created when a tab's editor is mounted and dropped when it unmounts,
//! while the engine and everything derived from it live on in the
//! [`EditorStore`] under the controller's session key.
//!
//! # Completion Flow
//!
//! Engine events and operation completions never touch session state
//! directly. They are queued in the controller's mailbox and applied, in
//! arrival order, by [`EditorController::pump`], which every public operation
//! runs before returning:
//!
//! ```text
//! engine ──event/callback──▶ mailbox ──pump──▶ views_changed / handle_import / ...
//!                              ▲
//!                   dropped unless mounted
//! ```
//!
//! A host whose engine completes on a later turn calls `pump` itself once the
//! engine has settled. The same goes for events the engine fires on its own,
//! such as a drill-down into another view: the host pumps in the turn the
//! event fired, which is when the properties panel follows the new view. Completions issued before an unmount are discarded;
//! the one exception is a caller's export reply, which is still delivered so
//! no caller waits forever.
//!
//! # Import Reconciliation
//!
//! Content is imported on mount and whenever new props carry different
//! content, but only if it differs from what the engine last imported. While
//! an import is in flight no other import starts; if the content changed in
//! the meantime, the check runs again once the import completes.

use super::actions::{ActionOutcome, EditorAction};
use super::host::{ActionResult, Dialog, DialogChoice, Host, HostAction};
use super::props::EditorProps;
use super::snapshot::{EditorSnapshot, SnapshotInputs};
use super::state::{EditorPatch, EditorState};
use crate::cache::{CachedState, SessionKey, SessionStore};
use crate::domain::{
    EngineError, Notice, NoticeKind, Result, SessionError, Sheet, FALLBACK_SHEET_ID,
};
use crate::engine::{
    Callback, Engine, EngineEvent, EngineEventKind, ExportOptions, ImageFormat, ImportOutcome,
    MountPoint, Subscription, View, ViewKind,
};
use crate::sheets::{find_sheet, sort_sheets, SheetRegistry};
use crate::Config;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Store of editor sessions, keyed by tab.
pub type EditorStore<E> = SessionStore<EditorState<E>>;

/// Events that change views, content, or report errors.
const STRUCTURAL_EVENTS: [EngineEventKind; 3] = [
    EngineEventKind::ViewsChanged,
    EngineEventKind::ContentChanged,
    EngineEventKind::Error,
];

/// Host surfaces the engine and its properties panel render into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mounts {
    pub canvas: MountPoint,
    pub properties_panel: MountPoint,
}

impl Mounts {
    #[must_use]
    pub fn new(canvas: &str, properties_panel: &str) -> Self {
        Self {
            canvas: MountPoint::from(canvas),
            properties_panel: MountPoint::from(properties_panel),
        }
    }
}

/// Who receives an exported document source.
enum SourceTarget {
    Reply(Callback<Result<String>>),
    /// Hand the source to the fallback sheet and show it.
    Fallback,
}

enum Completion {
    Event(EngineEvent),
    Imported(ImportOutcome),
    SourceExported {
        result: std::result::Result<String, EngineError>,
        checkpoint: Checkpoint,
        target: SourceTarget,
    },
    ImageExported {
        result: std::result::Result<Vec<u8>, EngineError>,
        reply: Callback<Result<Vec<u8>>>,
    },
}

impl Completion {
    /// Drops a completion that arrived after unmount.
    fn discard(self) {
        match self {
            Self::SourceExported {
                result,
                target: SourceTarget::Reply(reply),
                ..
            } => reply(result.map_err(SessionError::Export)),
            Self::ImageExported { result, reply } => reply(result.map_err(SessionError::Export)),
            Self::Event(_)
            | Self::Imported(_)
            | Self::SourceExported {
                target: SourceTarget::Fallback,
                ..
            } => tracing::debug!("discarding completion of unmounted editor"),
        }
    }
}

type Mailbox = Rc<RefCell<VecDeque<Completion>>>;

/// Command stack position read when an export started, and the view it was read from.
struct Checkpoint {
    stack_index: i64,
    view: Option<View>,
}

/// Mounted editor of one session.
///
/// # Examples
///
/// ```rust
/// use modeler_session::editor::{EditorController, EditorStore, Mounts};
/// use modeler_session::{Config, EditorProps, MemoryEngine};
/// # use modeler_session::editor::{ActionResult, EditorSnapshot, Host, HostAction};
/// # use modeler_session::{EngineError, SessionError, Sheet};
/// # struct Quiet;
/// # impl Host for Quiet {
/// #     fn on_import(&mut self, _: Option<&EngineError>, _: &[String]) {}
/// #     fn on_sheets_changed(&mut self, _: &[Sheet], _: Option<&Sheet>) {}
/// #     fn on_changed(&mut self, _: &EditorSnapshot) {}
/// #     fn on_error(&mut self, _: &SessionError) {}
/// #     fn on_warning(&mut self, _: &str) {}
/// #     fn on_action(&mut self, _: HostAction) -> ActionResult { ActionResult::Done }
/// # }
/// # let mut host = Quiet;
///
/// let mut store: EditorStore<MemoryEngine> = EditorStore::new();
/// let mut editor = EditorController::new("tab-1", MemoryEngine::new, Config::default());
///
/// let props = EditorProps::new(r#"{ "id": "dish", "name": "Dish" }"#);
/// editor.mount(&mut store, &mut host, Mounts::new("canvas", "panel"), props)?;
///
/// let active = editor.active_sheet(&mut store).map(|sheet| sheet.name);
/// assert_eq!(active.as_deref(), Some("Diagram"));
/// assert!(!editor.is_dirty(&mut store));
/// # Ok::<(), modeler_session::SessionError>(())
/// ```
pub struct EditorController<E> {
    cached: CachedState<EditorState<E>>,
    config: Config,
    registry: SheetRegistry,
    props: EditorProps,
    mounts: Option<Mounts>,
    /// Content of the import in flight.
    importing: Option<String>,
    mounted: Rc<Cell<bool>>,
    mailbox: Mailbox,
    subscription: Option<Subscription>,
}

impl<E: Engine + 'static> EditorController<E> {
    /// Creates a controller for the session under `key`.
    ///
    /// `factory` builds the engine the first time the session is accessed.
    pub fn new(
        key: impl Into<SessionKey>,
        factory: impl Fn() -> E + 'static,
        config: Config,
    ) -> Self {
        Self {
            cached: CachedState::new(key, move || EditorState::new(factory()).into_entry()),
            registry: SheetRegistry::new(config.fallback_sheet_name.clone()),
            config,
            props: EditorProps::default(),
            mounts: None,
            importing: None,
            mounted: Rc::new(Cell::new(false)),
            mailbox: Rc::new(RefCell::new(VecDeque::new())),
            subscription: None,
        }
    }

    pub const fn key(&self) -> &SessionKey {
        self.cached.key()
    }

    pub const fn props(&self) -> &EditorProps {
        &self.props
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    #[must_use]
    pub const fn is_importing(&self) -> bool {
        self.importing.is_some()
    }

    /// Mounts the editor: attaches the engine and imports `props.content` if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Engine`] if the engine cannot attach to
    /// `mounts.canvas`. No listener stays registered in that case.
    pub fn mount(
        &mut self,
        store: &mut EditorStore<E>,
        host: &mut dyn Host,
        mounts: Mounts,
        props: EditorProps,
    ) -> Result<()> {
        let _span = tracing::info_span!("editor_mount", key = %self.cached.key()).entered();

        if self.is_mounted() {
            self.unmount(store);
        }

        self.props = props;
        self.mounted.set(true);

        let forward = self.forwarder();
        let state = self.cached.get_cached(store);
        let mut subscription = state.engine.events().subscribe();
        subscription
            .on_each(&EngineEventKind::REFRESH, forward.clone())
            .on_each(&STRUCTURAL_EVENTS, forward);

        if let Err(error) = state.engine.attach_to(&mounts.canvas) {
            tracing::warn!(error = %error, "failed to attach engine");
            self.retire_mount_flag();
            self.mailbox.borrow_mut().clear();
            return Err(SessionError::Engine(error));
        }

        if let Some(viewer) = state.engine.active_viewer_mut() {
            viewer.attach_properties_panel(&mounts.properties_panel);
        }

        tracing::debug!(listeners = subscription.len(), "editor mounted");
        self.subscription = Some(subscription);
        self.mounts = Some(mounts);

        self.check_import(store, host, None);
        self.pump(store, host);
        Ok(())
    }

    /// Unmounts the editor. The session and its engine stay in the store.
    pub fn unmount(&mut self, store: &mut EditorStore<E>) {
        let _span = tracing::info_span!("editor_unmount", key = %self.cached.key()).entered();

        self.retire_mount_flag();
        self.subscription = None;
        self.importing = None;
        self.mounts = None;

        let pending: Vec<Completion> = self.mailbox.borrow_mut().drain(..).collect();
        for completion in pending {
            completion.discard();
        }

        if let Some(state) = store.get_mut(self.cached.key().as_str()) {
            state.engine.detach();
        }
    }

    /// Applies new props: imports changed content or switches sheets.
    pub fn update(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host, props: EditorProps) {
        let previous = std::mem::replace(&mut self.props, props);
        if !self.is_mounted() {
            return;
        }

        self.check_import(store, host, Some(&previous));
        self.pump(store, host);
    }

    /// Retires the session: unmounts and tears down the cached engine.
    ///
    /// Returns `false` if the session was already gone.
    pub fn destroy(&mut self, store: &mut EditorStore<E>) -> bool {
        self.unmount(store);
        let destroyed = self.cached.destroy(store);
        tracing::info!(key = %self.cached.key(), destroyed, "session destroyed");
        destroyed
    }

    /// Applies queued engine events and completions. Returns how many ran.
    ///
    /// Hosts call this in the same turn the engine fires an event of its own,
    /// so sheets and the properties panel never lag behind the active view.
    pub fn pump(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host) -> usize {
        let mut applied = 0;
        loop {
            let next = self.mailbox.borrow_mut().pop_front();
            let Some(completion) = next else {
                break;
            };
            self.apply(store, host, completion);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host, completion: Completion) {
        match completion {
            Completion::Event(event) => self.handle_event(store, host, event),
            Completion::Imported(outcome) => self.handle_import(store, host, outcome),
            Completion::SourceExported {
                result,
                checkpoint,
                target,
            } => self.source_ready(store, host, result, Some(checkpoint), target),
            Completion::ImageExported { result, reply } => match result {
                Ok(image) => reply(Ok(image)),
                Err(error) => {
                    tracing::warn!(error = %error, "image export failed");
                    host.on_error(&SessionError::Export(error.clone()));
                    reply(Err(SessionError::Export(error)));
                }
            },
        }
    }

    fn handle_event(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host, event: EngineEvent) {
        match event {
            EngineEvent::ViewsChanged { views, active_view } => {
                self.views_changed(store, host, views, active_view);
            }
            EngineEvent::Error(error) => self.handle_error(host, error),
            EngineEvent::ContentChanged
            | EngineEvent::Saved
            | EngineEvent::Attached
            | EngineEvent::SelectionChanged
            | EngineEvent::DirectEditingChanged
            | EngineEvent::PanelFocusIn
            | EngineEvent::PanelFocusOut => {
                self.handle_changed(store, host);
            }
        }
    }

    /// Returns `true` if `props.content` must be (re)imported.
    ///
    /// Never while an import is in flight, and never when the content did not
    /// change since `previous` props.
    pub fn is_import_needed(&self, store: &mut EditorStore<E>, previous: Option<&EditorProps>) -> bool {
        if self.importing.is_some() {
            tracing::debug!("import in flight, not starting another");
            return false;
        }

        if previous.is_some_and(|previous| previous.content == self.props.content) {
            return false;
        }

        let state = self.cached.get_cached(store);
        state.last_imported.as_deref() != Some(self.props.content.as_str())
    }

    fn check_import(
        &mut self,
        store: &mut EditorStore<E>,
        host: &mut dyn Host,
        previous: Option<&EditorProps>,
    ) {
        if self.is_import_needed(store, previous) {
            self.start_import(store);
        } else {
            self.check_sheet_change(store, host, previous);
        }
    }

    fn start_import(&mut self, store: &mut EditorStore<E>) {
        let content = self.props.content.clone();
        tracing::info!(key = %self.cached.key(), content_len = content.len(), "importing document");

        self.importing = Some(content.clone());
        let done = self.deliver(Completion::Imported);
        self.cached.get_cached(store).engine.import_source(&content, done);
    }

    /// Applies the outcome of an import.
    ///
    /// On success the session is marked in sync with the imported content and
    /// the requested sheet (or the engine's initial view) is opened. On
    /// failure the fallback sheet is shown and the user is offered help.
    pub fn handle_import(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host, outcome: ImportOutcome) {
        let imported = self
            .importing
            .take()
            .unwrap_or_else(|| self.props.content.clone());

        let _span = tracing::info_span!(
            "handle_import",
            key = %self.cached.key(),
            failed = outcome.error.is_some(),
            warnings = outcome.warnings.len()
        )
        .entered();

        host.on_import(outcome.error.as_ref(), &outcome.warnings);

        if !outcome.warnings.is_empty() {
            for warning in &outcome.warnings {
                host.on_warning(warning);
            }
            self.cached
                .get_cached(store)
                .notice
                .set(NoticeKind::Warnings, outcome.warnings.clone());
        }

        match outcome.error {
            None => {
                self.cached.get_cached(store).mark_synced();
                self.cached.set_cached(
                    store,
                    EditorPatch {
                        last_imported: Some(Some(imported.clone())),
                        latest_source: Some(Some(imported.clone())),
                        ..EditorPatch::default()
                    },
                );
                tracing::info!("document imported");

                self.open_requested_sheet(store, host);
            }
            Some(error) => {
                tracing::warn!(error = %error, "import failed");
                host.on_error(&SessionError::Import(error.clone()));
                self.open_fallback(store, host);
                self.show_import_error_dialog(host, &error);
            }
        }

        if self.is_mounted() && imported != self.props.content {
            tracing::debug!("content changed during import");
            self.check_import(store, host, None);
        }
    }

    fn open_requested_sheet(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host) {
        let requested = self.props.active_sheet.clone();
        if requested.as_deref() == Some(FALLBACK_SHEET_ID) {
            self.open_fallback(store, host);
            return;
        }

        let state = self.cached.get_cached(store);
        let target = requested
            .as_deref()
            .and_then(|id| {
                find_sheet(&state.sheets, id)
                    .and_then(|sheet| sheet.view.clone())
                    .or_else(|| state.engine.views().into_iter().find(|view| view.id() == id))
            })
            .or_else(|| state.engine.initial_view());

        if let Some(view) = target {
            self.open(store, host, &view);
        }
    }

    fn check_sheet_change(
        &mut self,
        store: &mut EditorStore<E>,
        host: &mut dyn Host,
        previous: Option<&EditorProps>,
    ) {
        let Some(requested) = self.props.active_sheet.clone() else {
            return;
        };

        if previous.is_some_and(|previous| previous.active_sheet.as_deref() == Some(requested.as_str())) {
            return;
        }

        let state = self.cached.get_cached(store);
        if state.active_sheet.as_ref().is_some_and(|sheet| sheet.id == requested) {
            return;
        }

        if let Err(error) = self.switch_sheet(store, host, &requested) {
            tracing::warn!(error = %error, "cannot switch sheet");
        }
    }

    /// Activates the sheet with `id`.
    ///
    /// Switching to the fallback sheet first exports the engine's content so
    /// the source view shows every edit.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownSheet`] if no sheet has that id.
    pub fn switch_sheet(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host, id: &str) -> Result<()> {
        let _span = tracing::debug_span!("switch_sheet", sheet_id = %id).entered();

        if id == FALLBACK_SHEET_ID {
            self.request_source(store, host, SourceTarget::Fallback);
            self.pump(store, host);
            return Ok(());
        }

        let state = self.cached.get_cached(store);
        let view = find_sheet(&state.sheets, id)
            .and_then(|sheet| sheet.view.clone())
            .ok_or_else(|| SessionError::UnknownSheet(id.to_string()))?;

        self.open(store, host, &view);
        self.pump(store, host);
        Ok(())
    }

    /// Makes `target` the engine's active view.
    ///
    /// The view is resolved by element identity first and by element id
    /// second, since a reimport replaces every element. Pending edits of the
    /// outgoing view are folded into the dirty flag before switching, and the
    /// sync checkpoint is re-based on the incoming view afterwards.
    ///
    /// Returns `true` if the engine switched views.
    pub fn open(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host, target: &View) -> bool {
        let _span = tracing::debug_span!("open_view", view_id = %target.id(), kind = %target.kind).entered();

        let state = self.cached.get_cached(store);
        let resolved = state.engine.view(&target.element).or_else(|| {
            state
                .engine
                .views()
                .into_iter()
                .find(|view| view.id() == target.id() && view.kind == target.kind)
        });

        let Some(view) = resolved else {
            tracing::debug!("view not found");
            return false;
        };

        if state.engine.active_view().is_some_and(|active| active.is(&view)) {
            // Already active in the engine; the session may still show the fallback.
            if state.active_sheet.as_ref().map_or(true, |sheet| sheet.id != view.id()) {
                state.active_sheet = find_sheet(&state.sheets, view.id()).cloned();
                host.on_sheets_changed(&state.sheets, state.active_sheet.as_ref());
            }
            return false;
        }

        state.fold_drift();
        state.engine.open(&view);
        state.rebase_position();
        true
    }

    fn views_changed(
        &mut self,
        store: &mut EditorStore<E>,
        host: &mut dyn Host,
        views: Vec<View>,
        active_view: Option<View>,
    ) {
        let _span = tracing::debug_span!("views_changed", views = views.len()).entered();

        let importing = self.importing.is_some();
        let state = self.cached.get_cached(store);
        let recomputed = self
            .registry
            .recompute(&views, active_view.as_ref(), state.active_view.as_ref());

        if recomputed.reattach {
            if let (Some(mounts), Some(viewer)) = (&self.mounts, state.engine.active_viewer_mut()) {
                tracing::debug!("reattaching properties panel");
                viewer.attach_properties_panel(&mounts.properties_panel);
            }
        }

        // An import re-bases positions once it completes. Drift is read from
        // the checkpoint's own view, so a switch the engine made by itself
        // does not count as an edit.
        if !importing {
            state.fold_drift();
            if recomputed.reattach {
                state.rebase_position();
            }
        }

        let keep_fallback = importing && state.active_sheet.as_ref().is_some_and(Sheet::is_fallback);
        self.cached.set_cached(
            store,
            EditorPatch {
                views: Some(views),
                active_view: Some(active_view),
                sheets: Some(recomputed.sheets),
                active_sheet: (!keep_fallback).then_some(recomputed.active_sheet),
                ..EditorPatch::default()
            },
        );

        let state = self.cached.get_cached(store);
        host.on_sheets_changed(&state.sheets, state.active_sheet.as_ref());
        self.handle_changed(store, host);
    }

    /// Shows the fallback sheet.
    pub fn open_fallback(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host) {
        let fallback = self.registry.fallback().clone();
        let state = self.cached.get_cached(store);

        if !state.sheets.iter().any(Sheet::is_fallback) {
            state.sheets.push(fallback.clone());
            sort_sheets(&mut state.sheets);
        }
        state.active_sheet = Some(fallback);

        tracing::debug!("fallback sheet opened");
        host.on_sheets_changed(&state.sheets, state.active_sheet.as_ref());
    }

    /// Asks the host to explain an import error.
    ///
    /// If the user chooses to ask in the forum, a second action opens the
    /// forum page.
    pub fn show_import_error_dialog(&self, host: &mut dyn Host, error: &EngineError) -> ActionResult {
        let answer = host.on_action(HostAction::ShowDialog(Dialog::import_error(error)));

        if answer == ActionResult::Chosen(DialogChoice::AskInForum) {
            host.on_action(HostAction::OpenExternalUrl(self.config.forum_url.clone()));
        }

        answer
    }

    /// Records source text edited outside the engine.
    ///
    /// Returns `true` if it differs from the known source, which marks the
    /// session dirty.
    pub fn handle_content_updated(&self, store: &mut EditorStore<E>, content: &str) -> bool {
        let state = self.cached.get_cached(store);
        let known = state
            .latest_source
            .as_deref()
            .or(state.last_imported.as_deref());

        if known == Some(content) {
            return false;
        }

        tracing::debug!(content_len = content.len(), "source updated outside the engine");
        state.latest_source = Some(content.to_string());
        state.source_dirty = true;
        true
    }

    /// Delivers the current document source to `reply`.
    ///
    /// Without pending engine edits this is the known source. Otherwise the
    /// engine exports, the sync checkpoint is re-based, and export failures
    /// are reported to the host before `reply` receives them.
    pub fn get_source(
        &mut self,
        store: &mut EditorStore<E>,
        host: &mut dyn Host,
        reply: impl FnOnce(Result<String>) + 'static,
    ) {
        self.request_source(store, host, SourceTarget::Reply(Box::new(reply)));
        self.pump(store, host);
    }

    fn request_source(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host, target: SourceTarget) {
        let state = self.cached.get_cached(store);

        if !state.is_engine_dirty() {
            let source = state
                .latest_source
                .clone()
                .or_else(|| state.last_imported.clone())
                .unwrap_or_else(|| self.props.content.clone());
            self.source_ready(store, host, Ok(source), None, target);
            return;
        }

        let checkpoint = Checkpoint {
            stack_index: state.engine.stack_index(),
            view: state.engine.active_view(),
        };
        let options = ExportOptions {
            format: true,
            exporter: self.config.exporter(),
        };
        let done = self.deliver(move |result: std::result::Result<String, EngineError>| {
            Completion::SourceExported {
                result,
                checkpoint,
                target,
            }
        });
        state.engine.export_source(&options, done);
    }

    fn source_ready(
        &mut self,
        store: &mut EditorStore<E>,
        host: &mut dyn Host,
        result: std::result::Result<String, EngineError>,
        checkpoint: Option<Checkpoint>,
        target: SourceTarget,
    ) {
        let source = match result {
            Ok(source) => source,
            Err(error) => {
                tracing::warn!(error = %error, "source export failed");
                host.on_error(&SessionError::Export(error.clone()));
                match target {
                    SourceTarget::Reply(reply) => reply(Err(SessionError::Export(error))),
                    SourceTarget::Fallback => self.open_fallback(store, host),
                }
                return;
            }
        };

        if let Some(checkpoint) = checkpoint {
            let replying = matches!(target, SourceTarget::Reply(_));
            self.cached.set_cached(
                store,
                EditorPatch {
                    dirty: Some(false),
                    stack_index: Some(checkpoint.stack_index),
                    checkpoint_view: Some(checkpoint.view),
                    last_imported: Some(Some(source.clone())),
                    latest_source: replying.then(|| Some(source.clone())),
                    ..EditorPatch::default()
                },
            );
        }

        match target {
            SourceTarget::Reply(reply) => reply(Ok(source)),
            SourceTarget::Fallback => {
                self.handle_content_updated(store, &source);
                self.open_fallback(store, host);
            }
        }
    }

    /// Renders the active view as an image and delivers it to `reply`.
    pub fn export_as(
        &mut self,
        store: &mut EditorStore<E>,
        host: &mut dyn Host,
        format: ImageFormat,
        reply: impl FnOnce(Result<Vec<u8>>) + 'static,
    ) {
        let state = self.cached.get_cached(store);
        let supported = state
            .engine
            .active_viewer()
            .is_some_and(|viewer| viewer.supports_svg());

        if !supported {
            let error = EngineError::new(format!("active view cannot be exported as {format}"));
            host.on_error(&SessionError::Export(error.clone()));
            reply(Err(SessionError::Export(error)));
            return;
        }

        let reply: Callback<Result<Vec<u8>>> = Box::new(reply);
        let done = self.deliver(move |result: std::result::Result<Vec<u8>, EngineError>| {
            Completion::ImageExported { result, reply }
        });
        state.engine.export_image(format, done);
        self.pump(store, host);
    }

    /// Marks the session saved: no edits remain pending anywhere.
    pub fn mark_saved(&self, store: &mut EditorStore<E>) {
        let state = self.cached.get_cached(store);
        state.mark_synced();
        state.source_dirty = false;
    }

    /// Runs an editor action.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Engine`] if the active viewer rejects a
    /// forwarded action.
    pub fn trigger_action(
        &mut self,
        store: &mut EditorStore<E>,
        host: &mut dyn Host,
        action: &EditorAction,
    ) -> Result<ActionOutcome> {
        let _span = tracing::debug_span!("trigger_action", action = ?action).entered();

        if let Some(layout) = action.apply_layout(self.props.layout, self.config.properties_panel_width) {
            host.on_layout_changed(&layout);
            return Ok(ActionOutcome::LayoutChanged(layout));
        }

        let state = self.cached.get_cached(store);

        if matches!(action, EditorAction::Resize) {
            let on_diagram = state
                .engine
                .active_view()
                .is_some_and(|view| view.kind == ViewKind::Drd);
            return Ok(match state.engine.active_viewer_mut() {
                Some(viewer) if on_diagram => {
                    viewer.resized();
                    ActionOutcome::Resized
                }
                _ => ActionOutcome::Skipped,
            });
        }

        let Some((name, context)) = action.engine_command() else {
            return Ok(ActionOutcome::Skipped);
        };
        let Some(viewer) = state.engine.active_viewer_mut() else {
            tracing::debug!(action = %name, "no active viewer");
            return Ok(ActionOutcome::Skipped);
        };

        viewer.trigger(name, &context)?;
        Ok(ActionOutcome::Forwarded {
            name: name.to_string(),
        })
    }

    pub fn undo(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host) {
        if let Some(viewer) = self.cached.get_cached(store).engine.active_viewer_mut() {
            viewer.command_stack_mut().undo();
        }
        self.handle_changed(store, host);
    }

    pub fn redo(&mut self, store: &mut EditorStore<E>, host: &mut dyn Host) {
        if let Some(viewer) = self.cached.get_cached(store).engine.active_viewer_mut() {
            viewer.command_stack_mut().redo();
        }
        self.handle_changed(store, host);
    }

    /// Recomputes the capability snapshot and reports it to the host.
    ///
    /// Returns `None` while no view is active.
    pub fn handle_changed(&self, store: &mut EditorStore<E>, host: &mut dyn Host) -> Option<EditorSnapshot> {
        let input_active = host.input_active();
        let state = self.cached.get_cached(store);
        let kind = state.engine.active_view()?.kind;
        let viewer = state.engine.active_viewer()?;

        let inputs = SnapshotInputs {
            dirty: state.is_dirty(),
            can_undo: viewer.command_stack().can_undo(),
            can_redo: viewer.command_stack().can_redo(),
            input_active,
            selection_len: viewer.selection_len(),
            has_selection: viewer.has_selection(),
            supports_svg: viewer.supports_svg(),
        };

        let snapshot = EditorSnapshot::derive(kind, &inputs, &self.config.export_formats);
        host.on_changed(&snapshot);
        Some(snapshot)
    }

    /// Routes an engine error to the host.
    pub fn handle_error(&self, host: &mut dyn Host, error: EngineError) {
        tracing::warn!(error = %error, "engine error");
        host.on_error(&SessionError::Engine(error));
    }

    pub fn set_notice(&self, store: &mut EditorStore<E>, kind: NoticeKind, payload: Vec<String>) {
        self.cached.get_cached(store).notice.set(kind, payload);
    }

    pub fn clear_notice(&self, store: &mut EditorStore<E>) {
        self.cached.get_cached(store).notice.clear();
    }

    #[must_use]
    pub fn notice(&self, store: &mut EditorStore<E>) -> Option<Notice> {
        self.cached.get_cached(store).notice.current().cloned()
    }

    #[must_use]
    pub fn is_dirty(&self, store: &mut EditorStore<E>) -> bool {
        self.cached.get_cached(store).is_dirty()
    }

    #[must_use]
    pub fn can_undo(&self, store: &mut EditorStore<E>) -> bool {
        self.cached.get_cached(store).can_undo()
    }

    #[must_use]
    pub fn can_redo(&self, store: &mut EditorStore<E>) -> bool {
        self.cached.get_cached(store).can_redo()
    }

    #[must_use]
    pub fn sheets(&self, store: &mut EditorStore<E>) -> Vec<Sheet> {
        self.cached.get_cached(store).sheets.clone()
    }

    #[must_use]
    pub fn active_sheet(&self, store: &mut EditorStore<E>) -> Option<Sheet> {
        self.cached.get_cached(store).active_sheet.clone()
    }

    /// Newest known document source.
    #[must_use]
    pub fn current_source(&self, store: &mut EditorStore<E>) -> Option<String> {
        let state = self.cached.get_cached(store);
        state
            .latest_source
            .clone()
            .or_else(|| state.last_imported.clone())
    }

    /// Wraps a completion so it is queued only while this mount lasts.
    fn deliver<T: 'static>(&self, wrap: impl FnOnce(T) -> Completion + 'static) -> Callback<T> {
        let mounted = Rc::clone(&self.mounted);
        let mailbox = Rc::downgrade(&self.mailbox);

        Box::new(move |value| {
            let completion = wrap(value);
            match mailbox.upgrade() {
                Some(mailbox) if mounted.get() => mailbox.borrow_mut().push_back(completion),
                _ => completion.discard(),
            }
        })
    }

    fn forwarder(&self) -> impl Fn(&EngineEvent) + Clone + 'static {
        let mounted = Rc::clone(&self.mounted);
        let mailbox = Rc::downgrade(&self.mailbox);

        move |event: &EngineEvent| {
            if !mounted.get() {
                return;
            }
            if let Some(mailbox) = mailbox.upgrade() {
                mailbox.borrow_mut().push_back(Completion::Event(event.clone()));
            }
        }
    }

    fn retire_mount_flag(&mut self) {
        self.mounted.set(false);
        // Callbacks issued under the old flag keep seeing it cleared.
        self.mounted = Rc::new(Cell::new(false));
    }
}

impl<E> fmt::Debug for EditorController<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorController")
            .field("key", self.cached.key())
            .field("mounted", &self.mounted.get())
            .field("importing", &self.importing.is_some())
            .field("pending", &self.mailbox.borrow().len())
            .finish_non_exhaustive()
    }
}
