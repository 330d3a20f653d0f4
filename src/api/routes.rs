//! Route definitions for the delivery surface.

use axum::routing::get;
use axum::Router;

use super::handlers;
use super::SharedState;

/// Create the main router.
///
/// Static segments (`/health`, `/api`, `/p`) take priority over the
/// parameterized page and asset routes, so system paths can never be
/// shadowed by content slugs.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/healthz", get(handlers::health::health_check))
        .route("/api/openapi.json", get(super::openapi::serve))
        .merge(handlers::domains::router())
        .merge(handlers::webhooks::router())
        .nest("/p", handlers::links::router())
        .merge(handlers::pages::router())
        .merge(handlers::assets::router())
        .with_state(state)
}
