//! Signoff API - annotation persistence and document finalization
//!
//! Library surface shared by the server binary and the integration tests.
//! Provides REST endpoints for:
//! - Document registration and delivery
//! - Whole-set annotation load/replace
//! - Flattening a document into a finalized artifact

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

use state::AppState;

/// Build the application router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Document endpoints
        .route("/api/documents", post(handlers::create_document))
        .route("/api/documents/:id", get(handlers::get_document))
        .route("/api/documents/:id/file", get(handlers::get_document_file))
        // Annotation load/replace
        .route(
            "/api/documents/:id/annotations",
            get(handlers::get_annotations).post(handlers::replace_annotations),
        )
        // Finalization
        .route(
            "/api/documents/:id/finalize",
            post(handlers::finalize_document),
        )
        .route("/api/artifacts/:id", get(handlers::get_artifact))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
