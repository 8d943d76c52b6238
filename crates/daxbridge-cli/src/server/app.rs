//! Axum application setup.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration for browser front ends
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Questions
        .route("/powerbi/query-natural", post(handlers::query_natural))
        .route("/powerbi/ask", post(handlers::ask))
        .route("/powerbi/suggest-questions", get(handlers::suggest_questions))
        // DAX
        .route("/powerbi/execute-dax", post(handlers::execute_dax))
        .route("/powerbi/clean-dax", post(handlers::clean_dax))
        // Schema
        .route("/schema", get(handlers::get_schema))
        .route("/schema/refresh", post(handlers::refresh_schema))
        // Liveness
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the web server and run until Ctrl+C.
pub async fn run_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await?;

    Ok(())
}
