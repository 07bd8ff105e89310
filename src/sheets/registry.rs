//! Sheet derivation and ordering.
//!
//! Sheets are recomputed from the engine's views every time the engine reports
//! that its view set changed. The document root sorts first, then primary
//! alternate views, then everything else; the fallback sheet always sorts last.
//! The sort is stable, so equal orders keep their discovery order.

use crate::domain::sheet::{PRIMARY_ORDER, ROOT_ORDER};
use crate::domain::Sheet;
use crate::engine::{View, ViewKind};

/// Output of [`SheetRegistry::recompute`].
#[derive(Debug, Clone)]
pub struct Recomputed {
    /// All sheets, ordered for presentation.
    pub sheets: Vec<Sheet>,
    /// Sheet of the engine's active view.
    pub active_sheet: Option<Sheet>,
    /// The active view changed identity; panels rendering into the previous
    /// view's target must be reattached in the same turn.
    pub reattach: bool,
}

/// Derives sheets from engine views.
#[derive(Debug, Clone)]
pub struct SheetRegistry {
    fallback: Sheet,
}

impl SheetRegistry {
    pub fn new(fallback_name: impl Into<String>) -> Self {
        Self {
            fallback: Sheet::fallback(fallback_name),
        }
    }

    /// The sheet shown when the document cannot be imported.
    #[must_use]
    pub const fn fallback(&self) -> &Sheet {
        &self.fallback
    }

    /// Builds the ordered sheet list for `views`.
    ///
    /// The view identical to `active_view` becomes the active sheet.
    /// `previous` is the view that was active before this change.
    #[must_use]
    pub fn recompute(
        &self,
        views: &[View],
        active_view: Option<&View>,
        previous: Option<&View>,
    ) -> Recomputed {
        let _span = tracing::debug_span!("recompute_sheets", views = views.len()).entered();

        let mut active_sheet = None;
        let mut sheets: Vec<Sheet> = views
            .iter()
            .map(|view| {
                let sheet = sheet_for(view);
                if active_view.is_some_and(|active| active.is(view)) {
                    active_sheet = Some(sheet.clone());
                }
                sheet
            })
            .collect();
        sheets.push(self.fallback.clone());
        sort_sheets(&mut sheets);

        let reattach = match (active_view, previous) {
            (Some(active), Some(previous)) => !active.is(previous),
            (Some(_), None) => true,
            (None, _) => false,
        };

        tracing::debug!(
            sheets = sheets.len(),
            active_sheet = ?active_sheet.as_ref().map(|s| &s.id),
            reattach,
            "sheets recomputed"
        );

        Recomputed {
            sheets,
            active_sheet,
            reattach,
        }
    }
}

/// Derives the sheet record of one view.
#[must_use]
pub fn sheet_for(view: &View) -> Sheet {
    Sheet {
        id: view.id().to_string(),
        name: sheet_name(view),
        order: sort_order(view),
        view: Some(view.clone()),
    }
}

/// Display name of a view's sheet.
///
/// The root diagram is always `Diagram`; other views use their element's name
/// and fall back to a per-kind default.
#[must_use]
pub fn sheet_name(view: &View) -> String {
    match view.kind {
        ViewKind::Drd => "Diagram".to_string(),
        ViewKind::DecisionTable => named_or(view, "Decision Table"),
        ViewKind::LiteralExpression => named_or(view, "Literal Expression"),
    }
}

fn named_or(view: &View, default: &str) -> String {
    view.element
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Sort order of a view's sheet; explicit ordering data wins.
#[must_use]
pub fn sort_order(view: &View) -> i32 {
    view.order.unwrap_or(match view.kind {
        ViewKind::Drd => ROOT_ORDER,
        ViewKind::DecisionTable | ViewKind::LiteralExpression => PRIMARY_ORDER,
    })
}

/// Stable sort by `order`; ties keep their relative position.
pub fn sort_sheets(sheets: &mut [Sheet]) {
    sheets.sort_by_key(|sheet| sheet.order);
}

/// Finds a sheet by id.
#[must_use]
pub fn find_sheet<'a>(sheets: &'a [Sheet], id: &str) -> Option<&'a Sheet> {
    sheets.iter().find(|sheet| sheet.id == id)
}
