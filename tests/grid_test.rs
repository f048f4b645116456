use anyhow::Result;
use async_trait::async_trait;
use barcode_grid::barcode::{BarcodeError, BarcodeService};
use barcode_grid::db;
use barcode_grid::locale::LocaleService;
use barcode_grid::model::{BarcodeResponse, GridRow, Locale, LocaleError, ProductRef, SortDirection};
use barcode_grid::table::{ProductBarcodeTable, TableRequest, COL_BARCODE, COL_PRODUCT_SKU};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

async fn setup_pool() -> db::Pool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

/// Barcode fake: queued responses are handed out first; once drained it
/// derives a stable payload from the SKU. Records every call in order.
#[derive(Clone, Default)]
struct RecordingBarcode {
    responses: Arc<Mutex<VecDeque<Result<BarcodeResponse, BarcodeError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingBarcode {
    fn with_responses(responses: Vec<Result<BarcodeResponse, BarcodeError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Default::default()
        }
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl BarcodeService for RecordingBarcode {
    async fn generate_barcode(
        &self,
        product: &ProductRef,
    ) -> Result<BarcodeResponse, BarcodeError> {
        self.calls.lock().await.push(product.sku.clone());
        if let Some(next) = self.responses.lock().await.pop_front() {
            return next;
        }
        Ok(BarcodeResponse {
            encoding: "image/png;base64".into(),
            code: format!("{}-code", product.sku),
        })
    }
}

struct FixedLocale(Locale);

#[async_trait]
impl LocaleService for FixedLocale {
    async fn current_locale(&self) -> Result<Locale> {
        Ok(self.0.clone())
    }
}

fn grid(pool: &db::Pool, barcode: &RecordingBarcode, id_locale: Option<i64>) -> ProductBarcodeTable {
    ProductBarcodeTable::new(
        pool.clone(),
        Arc::new(barcode.clone()),
        Arc::new(FixedLocale(Locale {
            id_locale,
            locale_name: "en_US".into(),
        })),
    )
}

async fn seed_product(pool: &db::Pool, sku: &str, id_locale: i64, name: &str) -> i64 {
    let id = db::insert_product(pool, sku).await.unwrap();
    db::upsert_localized_attributes(pool, id, id_locale, name)
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn display_record_matches_collaborator_values() {
    let pool = setup_pool().await;
    let en = db::get_or_create_locale(&pool, "en_US").await.unwrap();
    // Pin the product id so the formatted output is predictable.
    sqlx::query("INSERT INTO products (id_product, sku) VALUES (10, 'ABC-1')")
        .execute(&pool)
        .await
        .unwrap();
    db::upsert_localized_attributes(&pool, 10, en, "Red Shirt")
        .await
        .unwrap();

    let barcode = RecordingBarcode::with_responses(vec![Ok(BarcodeResponse {
        encoding: "image/png;base64".into(),
        code: "iVBORw0KG...".into(),
    })]);
    let table = grid(&pool, &barcode, Some(en));

    let page = table.render(&TableRequest::default()).await.unwrap();
    assert_eq!(
        page.rows,
        vec![GridRow {
            id_product: "10".into(),
            sku: "ABC-1".into(),
            name: "Red Shirt".into(),
            barcode: "<img src=\"image/png;base64,iVBORw0KG...\">".into(),
        }]
    );
    assert_eq!(page.total, 1);
    assert_eq!(page.filtered, 1);
    assert_eq!(barcode.calls().await, vec!["ABC-1"]);
}

#[tokio::test]
async fn unlocalized_products_are_excluded() {
    let pool = setup_pool().await;
    let en = db::get_or_create_locale(&pool, "en_US").await.unwrap();
    let de = db::get_or_create_locale(&pool, "de_DE").await.unwrap();

    seed_product(&pool, "ABC-1", en, "Red Shirt").await;
    // Product B is localized for German only.
    seed_product(&pool, "ABC-2", de, "Rotes Hemd").await;

    let barcode = RecordingBarcode::default();
    let page = grid(&pool, &barcode, Some(en))
        .render(&TableRequest::default())
        .await
        .unwrap();
    let skus: Vec<&str> = page.rows.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["ABC-1"]);
    assert_eq!(page.total, 1);

    let page = grid(&pool, &barcode, Some(de))
        .render(&TableRequest::default())
        .await
        .unwrap();
    let skus: Vec<&str> = page.rows.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["ABC-2"]);
}

#[tokio::test]
async fn pagination_bounds_rows_but_not_counts() {
    let pool = setup_pool().await;
    let en = db::get_or_create_locale(&pool, "en_US").await.unwrap();
    for i in 0..5 {
        seed_product(&pool, &format!("SKU-{}", i), en, &format!("Item {}", i)).await;
    }

    let barcode = RecordingBarcode::default();
    let request = TableRequest {
        offset: 2,
        limit: 2,
        ..TableRequest::default()
    };
    let page = grid(&pool, &barcode, Some(en)).render(&request).await.unwrap();
    let skus: Vec<&str> = page.rows.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["SKU-2", "SKU-3"]);
    assert_eq!(page.total, 5);
    assert_eq!(page.filtered, 5);
    // Barcode service is only called for the visible rows.
    assert_eq!(barcode.calls().await, vec!["SKU-2", "SKU-3"]);
}

#[tokio::test]
async fn sorting_permutes_rows_without_rewriting_them() {
    let pool = setup_pool().await;
    let en = db::get_or_create_locale(&pool, "en_US").await.unwrap();
    seed_product(&pool, "C-3", en, "Gamma").await;
    seed_product(&pool, "A-1", en, "Alpha").await;
    seed_product(&pool, "B-2", en, "Beta").await;

    let barcode = RecordingBarcode::default();
    let table = grid(&pool, &barcode, Some(en));

    let by_default = table.render(&TableRequest::default()).await.unwrap();
    let request = TableRequest {
        sort_column: Some(COL_PRODUCT_SKU.into()),
        sort_direction: SortDirection::Desc,
        ..TableRequest::default()
    };
    let by_sku_desc = table.render(&request).await.unwrap();

    let skus: Vec<&str> = by_sku_desc.rows.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["C-3", "B-2", "A-1"]);

    // Same records either way, only the order differs.
    let mut sorted_default = by_default.rows.clone();
    let mut sorted_desc = by_sku_desc.rows.clone();
    sorted_default.sort_by(|a, b| a.sku.cmp(&b.sku));
    sorted_desc.sort_by(|a, b| a.sku.cmp(&b.sku));
    assert_eq!(sorted_default, sorted_desc);

    // Barcode is not sortable; asking for it falls back to the default order.
    let request = TableRequest {
        sort_column: Some(COL_BARCODE.into()),
        sort_direction: SortDirection::Desc,
        ..TableRequest::default()
    };
    let by_barcode = table.render(&request).await.unwrap();
    assert_eq!(by_barcode.rows, by_default.rows);
}

#[tokio::test]
async fn search_never_matches_barcode_content() {
    let pool = setup_pool().await;
    let en = db::get_or_create_locale(&pool, "en_US").await.unwrap();
    seed_product(&pool, "SHIRT-R", en, "Red Shirt").await;
    seed_product(&pool, "HAT-1", en, "Green Hat").await;

    let barcode = RecordingBarcode::default();
    let table = grid(&pool, &barcode, Some(en));

    let request = TableRequest {
        search: Some("Shirt".into()),
        ..TableRequest::default()
    };
    let page = table.render(&request).await.unwrap();
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].sku, "SHIRT-R");
    assert_eq!(page.total, 2);
    assert_eq!(page.filtered, 1);

    // Every rendered barcode contains "image/png", but searching for it must
    // not match: barcode is derived, not stored, and not searchable.
    let request = TableRequest {
        search: Some("image/png".into()),
        ..TableRequest::default()
    };
    let page = table.render(&request).await.unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.total, 2);
    assert_eq!(page.filtered, 0);
}

#[tokio::test]
async fn barcode_failure_fails_the_whole_page() {
    let pool = setup_pool().await;
    let en = db::get_or_create_locale(&pool, "en_US").await.unwrap();
    seed_product(&pool, "SKU-0", en, "Item 0").await;
    seed_product(&pool, "SKU-1", en, "Item 1").await;
    seed_product(&pool, "SKU-2", en, "Item 2").await;

    let barcode = RecordingBarcode::with_responses(vec![
        Ok(BarcodeResponse {
            encoding: "image/png;base64".into(),
            code: "ok".into(),
        }),
        Err(BarcodeError::Incomplete("code")),
    ]);
    let table = grid(&pool, &barcode, Some(en));

    let err = table.render(&TableRequest::default()).await.unwrap_err();
    assert!(err.downcast_ref::<BarcodeError>().is_some());
    // The render stopped at the failing row; no partial table was produced.
    assert_eq!(barcode.calls().await, vec!["SKU-0", "SKU-1"]);
}

#[tokio::test]
async fn missing_locale_id_aborts_before_any_work() {
    let pool = setup_pool().await;
    let en = db::get_or_create_locale(&pool, "en_US").await.unwrap();
    seed_product(&pool, "ABC-1", en, "Red Shirt").await;

    let barcode = RecordingBarcode::default();
    let table = grid(&pool, &barcode, None);

    let err = table.render(&TableRequest::default()).await.unwrap_err();
    assert!(err.downcast_ref::<LocaleError>().is_some());
    assert!(barcode.calls().await.is_empty());
}
