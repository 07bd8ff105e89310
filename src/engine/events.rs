//! Engine event bus and scoped subscriptions.
//!
//! Engines announce changes on an [`EventBus`]. Listeners are registered per
//! [`EngineEventKind`] and identified by a [`ListenerId`]. A [`Subscription`]
//! collects the listeners a controller registers and removes all of them when
//! dropped, so every exit path (including a failed setup) unsubscribes.

use super::backend::View;
use crate::domain::EngineError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Identifier of a registered listener.
pub type ListenerId = u64;

/// Discriminant of an [`EngineEvent`], used for subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EngineEventKind {
    Saved,
    Attached,
    SelectionChanged,
    DirectEditingChanged,
    PanelFocusIn,
    PanelFocusOut,
    ViewsChanged,
    ContentChanged,
    Error,
}

impl EngineEventKind {
    /// Events after which only the capability snapshot needs refreshing.
    pub const REFRESH: [Self; 6] = [
        Self::Saved,
        Self::Attached,
        Self::SelectionChanged,
        Self::DirectEditingChanged,
        Self::PanelFocusIn,
        Self::PanelFocusOut,
    ];
}

/// Something that happened inside the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The document source was exported.
    Saved,
    /// The engine was attached to a mount point.
    Attached,
    SelectionChanged,
    DirectEditingChanged,
    PanelFocusIn,
    PanelFocusOut,
    /// The set of views or the active view changed.
    ViewsChanged {
        views: Vec<View>,
        active_view: Option<View>,
    },
    /// The content of the active view was edited.
    ContentChanged,
    /// An error raised outside an explicit call, e.g. while rendering.
    Error(EngineError),
}

impl EngineEvent {
    #[must_use]
    pub const fn kind(&self) -> EngineEventKind {
        match self {
            Self::Saved => EngineEventKind::Saved,
            Self::Attached => EngineEventKind::Attached,
            Self::SelectionChanged => EngineEventKind::SelectionChanged,
            Self::DirectEditingChanged => EngineEventKind::DirectEditingChanged,
            Self::PanelFocusIn => EngineEventKind::PanelFocusIn,
            Self::PanelFocusOut => EngineEventKind::PanelFocusOut,
            Self::ViewsChanged { .. } => EngineEventKind::ViewsChanged,
            Self::ContentChanged => EngineEventKind::ContentChanged,
            Self::Error(_) => EngineEventKind::Error,
        }
    }
}

type Listener = Rc<dyn Fn(&EngineEvent)>;

#[derive(Default)]
struct Listeners {
    next_id: ListenerId,
    entries: BTreeMap<ListenerId, (EngineEventKind, Listener)>,
}

/// Cloneable handle to an engine's listener registry.
///
/// Clones share the same registry. Dispatch snapshots the matching listeners
/// first, so listeners may register or remove listeners while being called.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Listeners>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`.
    pub fn on(&self, kind: EngineEventKind, listener: impl Fn(&EngineEvent) + 'static) -> ListenerId {
        self.on_shared(kind, Rc::new(listener))
    }

    fn on_shared(&self, kind: EngineEventKind, listener: Listener) -> ListenerId {
        let mut listeners = self.listeners.borrow_mut();
        listeners.next_id = listeners.next_id.saturating_add(1);
        let id = listeners.next_id;
        listeners.entries.insert(id, (kind, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().entries.remove(&id).is_some()
    }

    /// Delivers `event` to every listener registered for its kind.
    pub fn fire(&self, event: &EngineEvent) {
        let kind = event.kind();
        let targets: Vec<Listener> = self
            .listeners
            .borrow()
            .entries
            .values()
            .filter(|(registered, _)| *registered == kind)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        tracing::trace!(kind = ?kind, listeners = targets.len(), "firing engine event");

        for listener in targets {
            listener(event);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    /// Starts an empty scoped subscription on this bus.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            bus: self.clone(),
            ids: Vec::new(),
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Listeners registered together and removed together on drop.
pub struct Subscription {
    bus: EventBus,
    ids: Vec<ListenerId>,
}

impl Subscription {
    /// Registers `listener` for `kind` as part of this subscription.
    pub fn on(&mut self, kind: EngineEventKind, listener: impl Fn(&EngineEvent) + 'static) -> &mut Self {
        self.ids.push(self.bus.on(kind, listener));
        self
    }

    /// Registers one shared listener for several kinds.
    pub fn on_each(&mut self, kinds: &[EngineEventKind], listener: impl Fn(&EngineEvent) + 'static) -> &mut Self {
        let listener: Listener = Rc::new(listener);
        for kind in kinds {
            self.ids.push(self.bus.on_shared(*kind, Rc::clone(&listener)));
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            self.bus.off(id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("listeners", &self.ids)
            .finish_non_exhaustive()
    }
}
