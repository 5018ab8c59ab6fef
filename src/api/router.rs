use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_auth;
use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Public routes — no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes — require a Bearer token or signed Telegram
    // init data when API_TOKEN is set
    let protected = Router::new()
        // Market
        .route("/api/coins", get(handlers::coins::list))
        .route("/api/coins/:name/history", get(handlers::coins::history))
        // Account
        .route("/api/account", get(handlers::account::summary))
        .route(
            "/api/account/settings",
            put(handlers::account::update_settings),
        )
        // Positions
        .route(
            "/api/positions",
            get(handlers::positions::list).post(handlers::positions::open),
        )
        .route("/api/positions/:id/close", post(handlers::positions::close))
        // Trade history + leaderboard
        .route("/api/history", get(handlers::history::list))
        .route("/api/leaderboard", get(handlers::leaderboard::list))
        // Control
        .route("/api/reset", post(handlers::control::reset))
        .route("/api/status", get(handlers::control::status))
        .route("/api/pause", post(handlers::control::pause))
        .route("/api/resume", post(handlers::control::resume))
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn(require_auth));

    // CORS: the Mini App is served from Telegram's origin, so allow any
    let cors = CorsLayer::new()
        .allow_origin(Any) // direct API access still needs a token
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
