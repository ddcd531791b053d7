//! RuleLens API Server
//!
//! Read-only REST API over the evaluated dataset: rules, transactions,
//! the per-transaction inspector and step debugger, the hit matrix,
//! summary stats, and the dashboard selection state.

pub mod config;
pub mod error;
pub mod handlers;
pub mod selection;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use selection::{Selection, SelectionAction};
pub use state::AppState;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/summary", get(handlers::get_summary))
        // Rules
        .route("/api/rules", get(handlers::list_rules))
        .route("/api/rules/:rule_id", get(handlers::get_rule))
        // Transactions
        .route("/api/transactions", get(handlers::list_transactions))
        .route("/api/transactions/:id", get(handlers::get_transaction))
        .route(
            "/api/transactions/:id/rules/:rule_id/steps/:step",
            get(handlers::get_step),
        )
        // Matrix
        .route("/api/matrix", get(handlers::get_matrix))
        // Selection
        .route(
            "/api/selection",
            get(handlers::get_selection).post(handlers::update_selection),
        )
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}
