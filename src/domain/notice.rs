//! Single-slot user-facing notices.
//!
//! A session shows at most one notice at a time (for example the warnings
//! reported by an import). Setting a notice replaces whatever was shown before;
//! notices are never queued.

use serde::{Deserialize, Serialize};

/// The kind of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeKind {
    /// Content imported, but the engine reported caveats.
    Warnings,
    /// An operation failed.
    Error,
}

/// A transient message for in-interface display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// What the notice reports.
    pub kind: NoticeKind,
    /// Ordered message lines, e.g. one entry per import warning.
    pub payload: Vec<String>,
    /// Unix timestamp at which the notice was raised.
    pub raised_at: i64,
}

impl Notice {
    /// Creates a notice stamped with the current time.
    #[must_use]
    pub fn new(kind: NoticeKind, payload: Vec<String>) -> Self {
        Self {
            kind,
            payload,
            raised_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Holder for the single live notice of a session.
///
/// # Examples
///
/// ```
/// use modeler_session::domain::{NoticeKind, NoticeSlot};
///
/// let mut slot = NoticeSlot::default();
/// slot.set(NoticeKind::Warnings, vec!["w1".into(), "w2".into()]);
/// slot.set(NoticeKind::Error, vec!["boom".into()]);
/// assert_eq!(slot.current().map(|n| n.payload.len()), Some(1));
///
/// slot.clear();
/// assert!(slot.current().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoticeSlot {
    current: Option<Notice>,
}

impl NoticeSlot {
    /// Replaces the current notice.
    pub fn set(&mut self, kind: NoticeKind, payload: Vec<String>) {
        tracing::debug!(kind = ?kind, lines = payload.len(), "notice set");
        self.current = Some(Notice::new(kind, payload));
    }

    /// Empties the slot.
    pub fn clear(&mut self) {
        if self.current.take().is_some() {
            tracing::debug!("notice cleared");
        }
    }

    /// Returns the live notice, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Notice> {
        self.current.as_ref()
    }
}
