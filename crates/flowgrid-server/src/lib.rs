pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use flowgrid_core::config::Config;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: state::AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health))
        // Catalog
        .route("/api/actions", get(routes::actions::list_actions))
        .route("/api/actions/{code}", get(routes::actions::get_action))
        // Scenarios
        .route(
            "/api/scenarios",
            get(routes::scenarios::list_scenarios).post(routes::scenarios::save_scenario),
        )
        .route("/api/scenarios/{id}", get(routes::scenarios::get_scenario))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Start the backend on the configured bind address and port.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(config, listener).await
}

/// Start the backend on a pre-bound listener.
///
/// The caller can read the actual port before starting, which matters when
/// `port = 0` and the OS picks a free one.
pub async fn serve_on(config: Config, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app_state = state::AppState::new(config)?;
    let app = build_router(app_state);

    tracing::info!("flowgrid server listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
