// Main entry point for the lobby server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use lobby_core::config::CandidateSource;
use lobby_core::domains::auth::JwtService;
use lobby_core::kernel::{
    BaseCandidateSupplier, CatalogCandidateSupplier, HttpCandidateSupplier, PgLobbyStore,
    PgVisitStore, ServerDeps,
};
use lobby_core::server::{build_app, AxumAppState};
use lobby_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,lobby_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting lobby server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let candidates: Arc<dyn BaseCandidateSupplier> = match &config.candidate_source {
        CandidateSource::Service(url) => {
            tracing::info!(endpoint = %url, "Using candidate service");
            Arc::new(
                HttpCandidateSupplier::new(url.clone(), config.candidate_timeout())
                    .context("Failed to create candidate client")?,
            )
        }
        CandidateSource::Catalog(path) => Arc::new(
            CatalogCandidateSupplier::from_path(path).context("Failed to load restaurant catalog")?,
        ),
    };

    let server_deps = ServerDeps::new(
        Arc::new(PgLobbyStore::new(pool.clone())),
        Arc::new(PgVisitStore::new(pool.clone())),
        candidates,
        config.lobby_settings(),
    );

    // Drop SSE channels whose subscribers have all gone away
    let stream_hub = server_deps.stream_hub.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            stream_hub.cleanup().await;
        }
    });

    let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_issuer.clone());
    let state = AxumAppState::new(server_deps, jwt_service, Some(pool));
    let app = build_app(state, &config).context("Failed to build application")?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
