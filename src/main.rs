use anyhow::Result;
use barcode_grid::model::SortDirection;
use barcode_grid::{barcode, config, db, locale, table};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Row offset of the rendered page
    #[arg(long, default_value_t = 0)]
    offset: i64,
    /// Page size; defaults to app.page_size from the config
    #[arg(long)]
    limit: Option<i64>,
    /// Sort column (id_product, name, sku)
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending instead of ascending
    #[arg(long)]
    desc: bool,
    /// Search term applied across the searchable columns
    #[arg(long)]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    let barcode_client = barcode::BarcodeClient::from_config(&cfg)?;
    let locale_service = locale::ConfiguredLocale::new(pool.clone(), cfg.store.locale.clone());
    let grid = table::ProductBarcodeTable::new(
        pool,
        Arc::new(barcode_client),
        Arc::new(locale_service),
    );

    let request = table::TableRequest {
        offset: args.offset,
        limit: args.limit.unwrap_or(cfg.app.page_size as i64),
        sort_column: args.sort,
        sort_direction: if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        },
        search: args.search,
    };

    info!(
        offset = request.offset,
        limit = request.limit,
        "rendering product barcode grid"
    );
    let page = grid.render(&request).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);

    Ok(())
}
