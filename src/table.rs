//! The product barcode grid itself: column declarations, per-locale query
//! preparation, and the row mapping that turns query results into
//! display-ready records with an inline barcode image per row.

use crate::barcode::BarcodeService;
use crate::db::{self, PageSelection, ProductGridQuery, ProductRow, SortColumn};
use crate::locale::LocaleService;
use crate::model::{GridRow, Locale, LocaleError, ProductRef, SortDirection};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

pub const COL_ID_PRODUCT: &str = "id_product";
pub const COL_PRODUCT_NAME: &str = "name";
pub const COL_PRODUCT_SKU: &str = "sku";
pub const COL_BARCODE: &str = "barcode";

/// Column declarations the hosting framework consumes: ordered headers,
/// which columns respond to search and sort, and which carry trusted
/// generated markup that bypasses escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableConfiguration {
    headers: Vec<(&'static str, &'static str)>,
    searchable: Vec<&'static str>,
    sortable: Vec<&'static str>,
    raw_columns: Vec<&'static str>,
}

impl TableConfiguration {
    pub fn set_header(&mut self, headers: Vec<(&'static str, &'static str)>) {
        self.headers = headers;
    }

    pub fn set_searchable(&mut self, columns: Vec<&'static str>) {
        self.searchable = columns;
    }

    pub fn set_sortable(&mut self, columns: Vec<&'static str>) {
        self.sortable = columns;
    }

    pub fn set_raw_columns(&mut self, columns: Vec<&'static str>) {
        self.raw_columns = columns;
    }

    pub fn headers(&self) -> &[(&'static str, &'static str)] {
        &self.headers
    }

    pub fn is_searchable(&self, column: &str) -> bool {
        self.searchable.iter().any(|c| *c == column)
    }

    pub fn is_sortable(&self, column: &str) -> bool {
        self.sortable.iter().any(|c| *c == column)
    }

    pub fn is_raw(&self, column: &str) -> bool {
        self.raw_columns.iter().any(|c| *c == column)
    }
}

/// One page request as the hosting framework passes it through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub offset: i64,
    pub limit: i64,
    pub sort_column: Option<String>,
    pub sort_direction: SortDirection,
    pub search: Option<String>,
}

impl Default for TableRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
            sort_column: None,
            sort_direction: SortDirection::Asc,
            search: None,
        }
    }
}

/// Rendered page: display rows plus the framework's count pair.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TableResponse {
    pub rows: Vec<GridRow>,
    pub total: i64,
    pub filtered: i64,
}

pub struct ProductBarcodeTable {
    pool: db::Pool,
    barcode: Arc<dyn BarcodeService>,
    locale: Arc<dyn LocaleService>,
}

impl ProductBarcodeTable {
    pub fn new(
        pool: db::Pool,
        barcode: Arc<dyn BarcodeService>,
        locale: Arc<dyn LocaleService>,
    ) -> Self {
        Self {
            pool,
            barcode,
            locale,
        }
    }

    /// Column declarations for this grid. Barcode is derived, not stored, so
    /// it is neither searchable nor sortable, and its markup is raw.
    pub fn configure() -> TableConfiguration {
        let mut config = TableConfiguration::default();
        config.set_header(vec![
            (COL_ID_PRODUCT, "Product ID"),
            (COL_PRODUCT_NAME, "Product Name"),
            (COL_PRODUCT_SKU, "SKU"),
            (COL_BARCODE, "Barcode"),
        ]);
        config.set_searchable(vec![COL_ID_PRODUCT, COL_PRODUCT_NAME, COL_PRODUCT_SKU]);
        config.set_sortable(vec![COL_ID_PRODUCT, COL_PRODUCT_NAME, COL_PRODUCT_SKU]);
        config.set_raw_columns(vec![COL_BARCODE]);
        config
    }

    fn prepare_table_query(locale: &Locale) -> Result<ProductGridQuery, LocaleError> {
        ProductGridQuery::for_locale(locale)
    }

    /// Resolve what the runner will apply, restricted to the declared
    /// sortable set. A sort request for an undeclared column falls back to
    /// the default id-ascending order.
    fn page_selection(config: &TableConfiguration, request: &TableRequest) -> PageSelection {
        let order = request
            .sort_column
            .as_deref()
            .filter(|column| config.is_sortable(column))
            .and_then(sort_column)
            .map(|column| (column, request.sort_direction));
        let search = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_string);
        PageSelection {
            limit: request.limit,
            offset: request.offset,
            order,
            search,
        }
    }

    /// Render one grid page: resolve the locale, build the per-locale query,
    /// run it with the request's page selection, then map every row.
    #[instrument(skip_all)]
    pub async fn render(&self, request: &TableRequest) -> Result<TableResponse> {
        let config = Self::configure();
        let locale = self.locale.current_locale().await?;
        let query = Self::prepare_table_query(&locale)?;
        let selection = Self::page_selection(&config, request);
        let (rows, counts) = db::run_grid_query(&self.pool, &query, &selection).await?;

        // One barcode call per visible row, strictly in row order.
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(self.generate_item(row).await?);
        }

        Ok(TableResponse {
            rows: records,
            total: counts.total,
            filtered: counts.filtered,
        })
    }

    async fn generate_item(&self, row: ProductRow) -> Result<GridRow> {
        let barcode = self.barcode_image_by_sku(&row.sku).await?;
        Ok(GridRow {
            id_product: format_int(row.id_product),
            sku: row.sku,
            name: row.name,
            barcode,
        })
    }

    /// Ask the barcode collaborator to encode this SKU and wrap the result
    /// in an inline image tag. A failure here fails the whole page render.
    async fn barcode_image_by_sku(&self, sku: &str) -> Result<String> {
        let response = self.barcode.generate_barcode(&ProductRef::new(sku)).await?;
        Ok(format!(
            "<img src=\"{},{}\">",
            response.encoding, response.code
        ))
    }
}

fn sort_column(key: &str) -> Option<SortColumn> {
    match key {
        COL_ID_PRODUCT => Some(SortColumn::IdProduct),
        COL_PRODUCT_NAME => Some(SortColumn::Name),
        COL_PRODUCT_SKU => Some(SortColumn::Sku),
        _ => None,
    }
}

/// Product ids render as plain decimal strings, no thousands separators.
fn format_int(value: i64) -> String {
    value.to_string()
}
