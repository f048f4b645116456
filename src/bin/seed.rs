//! Dev fixture tool: seeds the configured locale and a handful of demo
//! products with localized names so the grid has something to render.
use anyhow::Result;
use barcode_grid::{config, db};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
    /// Number of demo products to insert
    #[arg(long, default_value_t = 12)]
    count: u32,
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

    let id_locale = db::get_or_create_locale(&pool, &cfg.store.locale).await?;
    for i in 1..=args.count {
        let sku = format!("DEMO-{:03}", i);
        if db::product_by_sku(&pool, &sku).await?.is_some() {
            continue;
        }
        let id_product = db::insert_product(&pool, &sku).await?;
        db::upsert_localized_attributes(
            &pool,
            id_product,
            id_locale,
            &format!("Demo Product {}", i),
        )
        .await?;
        info!(%sku, id_product, "seeded product");
    }

    Ok(())
}
