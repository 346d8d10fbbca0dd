//! Foodgram server entry point.

mod cli;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use clap::Parser;
use foodgram_api::{AppState, auth_middleware, router as api_router};
use foodgram_common::{Config, LocalStorage};
use foodgram_core::{CreateTagInput, IngredientService, LoadOutcome, TagService};
use foodgram_db::repositories::{IngredientRepository, TagRepository};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodgram=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    // Connect to database
    let db = foodgram_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    foodgram_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::Migrate => Ok(()),
        Command::LoadIngredients { path } => {
            let file = std::fs::File::open(&path)?;
            let service = IngredientService::new(IngredientRepository::new(db));
            match service.load_csv(file).await? {
                LoadOutcome::Skipped => info!("Ingredient catalog is not empty, nothing loaded"),
                LoadOutcome::Loaded(n) => info!(path = %path.display(), "Loaded {} ingredients", n),
            }
            Ok(())
        }
        Command::CreateTag { name, color, slug } => {
            let service = TagService::new(TagRepository::new(db));
            let tag = service.create(CreateTagInput { name, color, slug }).await?;
            info!(id = %tag.id, "Created tag '{}'", tag.name);
            Ok(())
        }
    }
}

async fn serve(
    config: Config,
    db: Arc<sea_orm::DatabaseConnection>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting foodgram server...");

    tokio::fs::create_dir_all(&config.media.path).await?;
    let storage = Arc::new(LocalStorage::new(
        config.media.path.clone(),
        config.media.url.clone(),
    ));

    let state = AppState::new(db, storage, config.pagination.clone());

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .nest_service(&config.media.url, ServeDir::new(&config.media.path))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
