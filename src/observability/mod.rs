//! Tracing setup for embedders.
//!
//! The crate logs through `tracing` spans and events. This module installs a
//! `tracing-subscriber` pipeline for embedders that do not bring their own.
//!
//! # Configuration
//!
//! The filter is resolved from:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` in [`crate::Config`]
//! 3. Default: `"info"`
//!
//! # Usage
//!
//! ```rust
//! use modeler_session::observability::init_tracing;
//! use modeler_session::Config;
//!
//! init_tracing(&Config::default());
//!
//! tracing::debug!("session layer initialized");
//! ```
//!
//! # Modules
//!
//! - [`init`]: Subscriber construction and installation

pub mod init;

pub use init::{filter_for, init_tracing};
