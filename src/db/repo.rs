use super::model::{PageSelection, Product, ProductGridQuery, ProductRow, SortColumn, TableCounts};
use crate::model::{Locale, SortDirection};
use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// Expand a leading `~/` in file-backed SQLite URLs and make sure the parent
/// directory exists. In-memory and non-sqlite URLs pass through untouched.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let (path, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path.is_empty() {
        return url.to_string();
    }
    let path = match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path.to_string(),
    };
    if let Some(parent) = std::path::Path::new(&path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
    match query {
        Some(q) => format!("sqlite://{}?{}", path, q),
        None => format!("sqlite://{}", path),
    }
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn get_or_create_locale(pool: &Pool, locale_name: &str) -> Result<i64> {
    if let Some(id) =
        sqlx::query_scalar::<_, i64>("SELECT id_locale FROM locales WHERE locale_name = ?")
            .bind(locale_name)
            .fetch_optional(pool)
            .await?
    {
        return Ok(id);
    }

    let rec = sqlx::query("INSERT INTO locales (locale_name) VALUES (?) RETURNING id_locale")
        .bind(locale_name)
        .fetch_one(pool)
        .await?;
    Ok(rec.get::<i64, _>("id_locale"))
}

#[instrument(skip_all)]
pub async fn locale_by_name(pool: &Pool, locale_name: &str) -> Result<Option<Locale>> {
    let id = sqlx::query_scalar::<_, i64>("SELECT id_locale FROM locales WHERE locale_name = ?")
        .bind(locale_name)
        .fetch_optional(pool)
        .await?;
    Ok(id.map(|id| Locale {
        id_locale: Some(id),
        locale_name: locale_name.to_string(),
    }))
}

#[instrument(skip_all)]
pub async fn insert_product(pool: &Pool, sku: &str) -> Result<i64> {
    let rec = sqlx::query("INSERT INTO products (sku) VALUES (?) RETURNING id_product")
        .bind(sku)
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to insert product {}", sku))?;
    Ok(rec.get::<i64, _>("id_product"))
}

#[instrument(skip_all)]
pub async fn product_by_sku(pool: &Pool, sku: &str) -> Result<Option<Product>> {
    let row = sqlx::query("SELECT id_product, sku, created_at FROM products WHERE sku = ?")
        .bind(sku)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| Product {
        id_product: row.get("id_product"),
        sku: row.get("sku"),
        created_at: row.get("created_at"),
    }))
}

#[instrument(skip_all)]
pub async fn upsert_localized_attributes(
    pool: &Pool,
    id_product: i64,
    id_locale: i64,
    name: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO product_localized_attributes (fk_product, fk_locale, name) VALUES (?, ?, ?) \
         ON CONFLICT (fk_product, fk_locale) DO UPDATE SET name = excluded.name",
    )
    .bind(id_product)
    .bind(id_locale)
    .bind(name)
    .execute(pool)
    .await
    .context("failed to upsert localized attributes")?;
    Ok(())
}

const FROM_JOIN: &str = "FROM products p \
     INNER JOIN product_localized_attributes a \
     ON a.fk_product = p.id_product AND a.fk_locale = ?";

const SEARCH_WHERE: &str =
    " WHERE (CAST(p.id_product AS TEXT) LIKE ? OR a.name LIKE ? OR p.sku LIKE ?)";

/// Execute a grid query with the given page selection. Returns the page rows
/// in order, plus the unfiltered/filtered counts computed against the same
/// join. The search term only ever reaches SQL as a bound parameter.
#[instrument(skip_all, fields(id_locale = query.id_locale()))]
pub async fn run_grid_query(
    pool: &Pool,
    query: &ProductGridQuery,
    selection: &PageSelection,
) -> Result<(Vec<ProductRow>, TableCounts)> {
    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM_JOIN}"))
        .bind(query.id_locale())
        .fetch_one(pool)
        .await?;

    let pattern = selection.search.as_ref().map(|term| format!("%{}%", term));

    let filtered: i64 = match &pattern {
        Some(pattern) => {
            sqlx::query_scalar(&format!("SELECT COUNT(*) {FROM_JOIN}{SEARCH_WHERE}"))
                .bind(query.id_locale())
                .bind(pattern.as_str())
                .bind(pattern.as_str())
                .bind(pattern.as_str())
                .fetch_one(pool)
                .await?
        }
        None => total,
    };

    let (order_col, order_dir) = match selection.order {
        Some((col, dir)) => (col.as_sql(), dir.as_str()),
        None => (SortColumn::IdProduct.as_sql(), SortDirection::Asc.as_str()),
    };
    let mut sql = format!("SELECT p.id_product, p.sku, a.name {FROM_JOIN}");
    if pattern.is_some() {
        sql.push_str(SEARCH_WHERE);
    }
    sql.push_str(&format!(" ORDER BY {order_col} {order_dir} LIMIT ? OFFSET ?"));

    let mut page = sqlx::query(&sql).bind(query.id_locale());
    if let Some(pattern) = &pattern {
        page = page
            .bind(pattern.as_str())
            .bind(pattern.as_str())
            .bind(pattern.as_str());
    }
    let rows = page
        .bind(selection.limit)
        .bind(selection.offset)
        .fetch_all(pool)
        .await?;

    let rows = rows
        .into_iter()
        .map(|row| ProductRow {
            id_product: row.get("id_product"),
            sku: row.get("sku"),
            name: row.get("name"),
        })
        .collect();

    Ok((rows, TableCounts { total, filtered }))
}
