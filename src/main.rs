//! Paperhost Delivery - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paperhost_delivery::{
    api, config::Config, db, error::Result, storage, store,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paperhost_delivery=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!("Starting Paperhost Delivery");

    // Select the store once at startup. Everything downstream holds the
    // trait object; no per-request demo branching.
    let content_store: Arc<dyn store::ContentStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(store::PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, serving synthetic demo content");
            Arc::new(store::DemoStore::new())
        }
    };

    let object_storage: Arc<dyn storage::StorageBackend> =
        if config.database_url.is_none() || config.storage_backend == "demo" {
            Arc::new(storage::DemoStorage::new())
        } else {
            Arc::new(storage::FilesystemStorage::new(config.storage_path.clone()))
        };

    let state = Arc::new(api::AppState::new(
        config.clone(),
        content_store,
        object_storage,
    )?);

    // Anonymous read-only surface, so permissive CORS is fine.
    let app = api::routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
