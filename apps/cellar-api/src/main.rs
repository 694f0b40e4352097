// Binary entry point. Router, state and handlers live in lib.rs.
use cellar_api::{AppState, config::Settings, create_app, seed::seed_demo};
use cellar_core::adapters::{MIGRATOR, PostgresStore};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, process::ExitCode, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// Connects to Postgres and applies the embedded migrations
async fn connect_store(
    db_url: &str,
    max_connections: u32,
) -> Result<PostgresStore, Box<dyn std::error::Error + Send + Sync>> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(db_url)
        .await?;
    info!("Connected to Postgres");

    info!("Applying database migrations...");
    MIGRATOR.run(&pool).await?;
    info!("Migrations applied successfully.");

    Ok(PostgresStore::new(pool))
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment (.env) if present
    dotenv().ok();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // RUST_LOG wins over CELLAR_LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.as_str()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }

    info!("Starting Cellar API v{}...", env!("CARGO_PKG_VERSION"));

    let app_state = match settings.database_url.as_deref() {
        Some(url) => match connect_store(url, settings.db_max_connections).await {
            Ok(store) => AppState::from_store(Arc::new(store)),
            Err(e) => {
                error!("Database setup failed: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            warn!("DATABASE_URL not set, data is kept in memory and lost on exit");
            AppState::in_memory()
        }
    };

    if settings.seed_demo {
        if let Err(e) = seed_demo(&app_state).await {
            error!("Seeding demo data failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let app = create_app(app_state);

    let addr = SocketAddr::new(settings.host, settings.port);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };
    info!("Cellar API listening on {}", addr);

    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("Server failed to run: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
