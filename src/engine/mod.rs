//! Modeling engine integration.
//!
//! The engine is an external collaborator. This module describes what the
//! session layer needs from it and ships one in-memory implementation.
//!
//! # Modules
//!
//! - [`backend`]: `Engine`, `Viewer` and `CommandStack` traits plus view types
//! - [`events`]: Event bus and scoped subscriptions
//! - [`memory`]: JSON-backed in-memory engine

pub mod backend;
pub mod events;
pub mod memory;

pub use backend::{
    Callback, CommandStack, Element, ElementRef, Engine, ExportOptions, Exporter, ImageFormat,
    ImportOutcome, MountPoint, View, ViewKind, Viewer,
};
pub use events::{EngineEvent, EngineEventKind, EventBus, ListenerId, Subscription};
pub use memory::MemoryEngine;
