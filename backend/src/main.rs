use photo_gallery::{
    AppState, Credentials,
    config::{AppConfig, Env},
    create_router,
    repository::{RepositoryState, SqliteRepository},
    storage::{LocalBlobStore, StorageState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the database, blob storage and the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production settings)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins, otherwise debug for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "photo_gallery=debug,tower_http=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if let Some(ttl) = config.token_ttl_secs {
        tracing::info!("Session tokens expire after {}s", ttl);
    }

    // 3. Database (SQLite, migrations applied on connect)
    let repo = SqliteRepository::connect(&config.db_url)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");
    let repo = Arc::new(repo) as RepositoryState;

    // 4. Blob storage on local disk
    let blob_store = LocalBlobStore::new(&config.upload_dir);
    blob_store
        .ensure_root_exists()
        .await
        .expect("FATAL: Cannot create the upload directory. Check UPLOAD_DIR.");
    let storage = Arc::new(blob_store) as StorageState;

    // 5. Unified state
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        storage,
        credentials: Credentials::new(),
        config,
    };

    // 6. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Cannot bind BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
