use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::summary::Dispatcher;

pub mod handlers;
pub mod types;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Public HTTP surface, CORS open to any origin (the dashboard lives elsewhere).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/summarise", post(handlers::summarise))
        .route("/health", get(handlers::health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state)
}
