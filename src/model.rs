use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a locale reaches the query builder without an identifier.
/// This is a configuration problem, not a data problem: the render aborts
/// before any query is constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocaleError {
    #[error("locale {0:?} has no id_locale")]
    MissingIdLocale(String),
}

/// Active store locale, resolved once per grid render and immutable for the
/// duration of the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Locale {
    pub id_locale: Option<i64>,
    pub locale_name: String,
}

impl Locale {
    pub fn require_id_locale(&self) -> Result<i64, LocaleError> {
        self.id_locale
            .ok_or_else(|| LocaleError::MissingIdLocale(self.locale_name.clone()))
    }
}

/// Minimal product reference sent to the barcode service. Carries only the
/// SKU; the service does not need anything else to encode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRef {
    pub sku: String,
}

impl ProductRef {
    pub fn new(sku: impl Into<String>) -> Self {
        Self { sku: sku.into() }
    }
}

/// What the barcode service hands back: an image encoding identifier and the
/// encoded payload. Computed fresh per request, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BarcodeResponse {
    pub encoding: String,
    pub code: String,
}

/// One display-ready grid row. The barcode field is pre-rendered markup and
/// is declared raw in the table configuration, so it bypasses escaping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridRow {
    pub id_product: String,
    pub sku: String,
    pub name: String,
    pub barcode: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}
