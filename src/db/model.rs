//! Database entity and view models used by repositories.
//!
//! Keep these structs focused on the data returned by queries. Display
//! concerns (id formatting, barcode markup) live in the table layer.

use crate::model::{Locale, LocaleError, SortDirection};
use chrono::{DateTime, Utc};

/// Product as stored, without any locale projection.
#[derive(Debug, Clone)]
pub struct Product {
    pub id_product: i64,
    pub sku: String,
    pub created_at: DateTime<Utc>,
}

/// One grid query result: native product columns plus the locale-specific
/// `name` projected as a computed column by the join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id_product: i64,
    pub sku: String,
    pub name: String,
}

/// Unexecuted grid query: products inner-joined to their localized
/// attributes for a single locale. Products without a localized-attributes
/// row for that locale are excluded. Construction has no side effects;
/// `repo::run_grid_query` executes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductGridQuery {
    id_locale: i64,
}

impl ProductGridQuery {
    /// Fails before any SQL is built when the locale has no identifier.
    pub fn for_locale(locale: &Locale) -> Result<Self, LocaleError> {
        Ok(Self {
            id_locale: locale.require_id_locale()?,
        })
    }

    pub fn id_locale(&self) -> i64 {
        self.id_locale
    }
}

/// Columns the grid runner may sort by. A closed set, so ORDER BY fragments
/// are fixed strings and never caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    IdProduct,
    Name,
    Sku,
}

impl SortColumn {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::IdProduct => "p.id_product",
            SortColumn::Name => "a.name",
            SortColumn::Sku => "p.sku",
        }
    }
}

/// Page slice applied on top of a grid query: limit/offset, a sort already
/// validated against the table configuration, and the search term scoped to
/// the searchable columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pub limit: i64,
    pub offset: i64,
    pub order: Option<(SortColumn, SortDirection)>,
    pub search: Option<String>,
}

/// Row counts the runner reports alongside a page: `total` is the join
/// without the search filter, `filtered` with it applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub total: i64,
    pub filtered: i64,
}
