//! Sheet registry.
//!
//! - [`registry`]: Derives ordered sheets from engine views

pub mod registry;

pub use registry::{find_sheet, sheet_for, sheet_name, sort_order, sort_sheets, Recomputed, SheetRegistry};
