pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use rollup_core::MetricsEngine;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(engine: MetricsEngine) -> Router {
    let app_state = state::AppState::new(engine);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Rollups
        .route("/api/analytics", get(routes::analytics::get_analytics))
        .route(
            "/api/analytics/indicators",
            get(routes::analytics::get_indicator_metrics),
        )
        .route(
            "/api/analytics/products",
            get(routes::analytics::get_product_metrics),
        )
        .route("/api/check-ins", get(routes::analytics::get_check_ins))
        .fallback(routes::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the rollup API server.
pub async fn serve(engine: MetricsEngine, port: u16, open_browser: bool) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(engine, listener, open_browser).await
}

/// Start the rollup API server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    engine: MetricsEngine,
    listener: tokio::net::TcpListener,
    open_browser: bool,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(engine);

    tracing::info!("rollup API listening on http://localhost:{actual_port}");

    if open_browser {
        let url = format!("http://localhost:{actual_port}/api/analytics");
        let _ = open::that(&url);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
