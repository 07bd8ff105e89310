//! Sheet domain model.
//!
//! A sheet is a named, selectable sub-view over one document. Sheets are never
//! created independently: they are derived from the engine's views by the
//! [`crate::sheets`] registry, plus one fallback sheet that renders the raw
//! source when the engine cannot import it.

use crate::engine::View;

/// Sort order of the document-root sheet (the primary diagram).
pub const ROOT_ORDER: i32 = -2;

/// Sort order of structurally primary alternate views (tables, expressions).
pub const PRIMARY_ORDER: i32 = -1;

/// Sort order of the fallback sheet; it always sorts last.
pub const FALLBACK_ORDER: i32 = i32::MAX;

/// Id of the fallback sheet.
///
/// `#` cannot occur in an element id, so no view's sheet ever shares it.
pub const FALLBACK_SHEET_ID: &str = "#fallback";

/// A selectable view over the document.
///
/// # Identity
///
/// A sheet's `id` is the id of the engine element behind its view. It stays
/// stable across reimports of unchanged content, which is what lets the
/// previously active sheet be found again after a fresh import invalidated
/// element references.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub id: String,
    pub name: String,
    pub order: i32,
    /// Engine view backing this sheet, `None` for the fallback sheet.
    pub view: Option<View>,
}

impl Sheet {
    /// Creates the fallback sheet with the given display name.
    #[must_use]
    pub fn fallback(name: impl Into<String>) -> Self {
        Self {
            id: FALLBACK_SHEET_ID.to_string(),
            name: name.into(),
            order: FALLBACK_ORDER,
            view: None,
        }
    }

    /// Returns `true` for the fallback (raw source) sheet.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.view.is_none() && self.id == FALLBACK_SHEET_ID
    }
}

impl PartialEq for Sheet {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name && self.order == other.order
    }
}
