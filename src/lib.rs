//! # Logistics API Library
//!
//! Exposes the Axum router and modules so integration tests can create
//! an in-process server without requiring `cargo run` in another terminal.

pub mod config;
pub mod db;
pub mod error;
pub mod handler_registry;
pub mod handlers;
pub mod models;
pub mod queue;
pub mod routes;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::queue::JobQueue;
use crate::store::Store;

/// Collaborators shared by every route handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub queue: Arc<dyn JobQueue>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, queue: Arc<dyn JobQueue>) -> Self {
        Self { store, queue }
    }
}

/// Build the Axum router with all route modules and middleware.
///
/// This function does NOT start a server or bootstrap the Tasker worker.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::orders::router())
        .merge(routes::recipients::router())
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
