//! Service entry point

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use opsdesk_common::config::{database_path, ensure_root_folder, resolve_root_folder};
use opsdesk_common::events::EventBus;
use opsdesk_mt::config::{DATABASE_FILE, EVENT_BUS_CAPACITY, ROOT_FOLDER_ENV_VAR, SERVICE_PORT};
use opsdesk_mt::db::catalog::{load_catalog, seed_default_catalog};
use opsdesk_mt::db::init_database_pool;
use opsdesk_mt::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(
        "Starting OpsDesk Model Trainer v{}",
        env!("CARGO_PKG_VERSION")
    );

    let cli_root = std::env::args().nth(1);
    let root_folder = resolve_root_folder(cli_root.as_deref(), ROOT_FOLDER_ENV_VAR)?;
    ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let db_path = database_path(&root_folder, DATABASE_FILE);
    let pool = init_database_pool(&db_path).await?;
    info!("Database ready at {}", db_path.display());

    seed_default_catalog(&pool).await?;
    let catalog = Arc::new(load_catalog(&pool).await?);
    info!(
        "Catalog cache loaded: {} sub-products, {} sub-services",
        catalog.products.len(),
        catalog.services.len()
    );

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let state = AppState::new(pool, event_bus, catalog);
    let app = build_router(state);

    let bind_address = format!("127.0.0.1:{}", SERVICE_PORT);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Model Trainer listening on {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
