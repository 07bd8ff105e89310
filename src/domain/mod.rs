//! Domain layer for editor sessions.
//!
//! This module contains the core domain types of a session, independent of any
//! concrete modeling engine or host application.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`notice`]: Single-slot notices
//! - [`sheet`]: Sheet model and ordering constants
//! - [`tab`]: Open document tabs

pub mod error;
pub mod notice;
pub mod sheet;
pub mod tab;

pub use error::{EngineError, Result, SessionError};
pub use notice::{Notice, NoticeKind, NoticeSlot};
pub use sheet::{Sheet, FALLBACK_SHEET_ID};
pub use tab::{is_unsaved, Tab, TabFile};
