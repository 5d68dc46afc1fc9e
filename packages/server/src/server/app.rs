//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{auth, health_handler, lobby, stream_handler, visits};
use crate::Config;

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub server_deps: Arc<ServerDeps>,
    pub jwt_service: Arc<JwtService>,
    /// `None` when running against in-memory stores.
    pub db_pool: Option<PgPool>,
}

impl AxumAppState {
    pub fn new(server_deps: ServerDeps, jwt_service: JwtService, db_pool: Option<PgPool>) -> Self {
        Self {
            server_deps: Arc::new(server_deps),
            jwt_service: Arc::new(jwt_service),
            db_pool,
        }
    }
}

/// All routes with auth and tracing, without CORS or rate limiting.
pub fn router(state: AxumAppState) -> Router {
    let jwt_service_for_middleware = state.jwt_service.clone();

    Router::new()
        // Lobby lifecycle
        .route("/lobby/create", post(lobby::create_lobby_handler))
        .route("/lobby/join", post(lobby::join_lobby_handler))
        .route("/lobby/:id", get(lobby::get_lobby_handler))
        .route("/lobby/:id/start-matching", post(lobby::start_matching_handler))
        .route(
            "/lobby/:id/vibe-check",
            get(lobby::vibe_status_handler).post(lobby::submit_vibe_handler),
        )
        .route("/lobby/:id/restaurants", get(lobby::restaurants_handler))
        .route("/lobby/:id/swipe", post(lobby::swipe_handler))
        .route("/lobby/:id/swipes", get(lobby::swipe_progress_handler))
        .route("/lobby/:id/voting", get(lobby::voting_handler))
        .route("/lobby/:id/vote", post(lobby::vote_handler))
        .route("/lobby/:id/revote", post(lobby::revote_handler))
        .route("/lobby/:id/reset", post(lobby::reset_handler))
        .route("/lobby/:id/leave", post(lobby::leave_handler))
        // Push channel (polling above stays authoritative)
        .route("/lobby/:id/events", get(stream_handler))
        // Identity and history
        .route("/auth/guest", post(auth::guest_handler))
        .route("/me/visits", get(visits::my_visits_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

/// Build the Axum application router with CORS and per-IP rate limiting.
pub fn build_app(state: AxumAppState, config: &Config) -> Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&config.allowed_origins)?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    // Keyed on X-Forwarded-For / X-Real-IP, falling back to the peer address
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .use_headers()
            .finish()
            .ok_or_else(|| anyhow!("Invalid rate limit configuration"))?,
    );

    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    Ok(router(state).layer(rate_limit_layer).layer(cors))
}

fn allowed_origins(origins: &[String]) -> Result<AllowOrigin> {
    if origins.is_empty() {
        return Ok(AllowOrigin::from(Any));
    }

    let values = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AllowOrigin::list(values))
}
