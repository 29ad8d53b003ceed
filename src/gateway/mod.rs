pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use middleware::AuthenticatedAccount;
pub use state::AppState;

/// Full application router, without a listener.
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // Public Routes
    // ==========================================================================
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/accounts", post(handlers::register_account));

    // ==========================================================================
    // Caller Routes (X-Account-Id required)
    // ==========================================================================
    let caller_routes = Router::new()
        .route("/account/profile", get(handlers::get_profile))
        .route("/account/balance", get(handlers::get_balance))
        .route("/account/transactions", get(handlers::get_history))
        .route("/transactions/deposit", post(handlers::deposit))
        .route("/transactions/withdraw", post(handlers::withdraw))
        .route("/transactions/{id}", get(handlers::get_transaction))
        .route(
            "/transactions/{id}/cancel",
            post(handlers::cancel_transaction),
        )
        .layer(from_fn(middleware::account_identity_middleware));

    Router::new()
        .nest("/api/v1", public_routes.merge(caller_routes))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until the listener fails.
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(addr = %addr, error = %e, "Failed to bind");
    })?;

    tracing::info!(addr = %addr, "Gateway listening");
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, build_router(state)).await
}
