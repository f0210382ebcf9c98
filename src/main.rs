//! # Logistics API
//!
//! REST API for a delivery company: orders, recipients and the deliverymen
//! orders are assigned to. Creating an order queues a "new order" e-mail for
//! the deliveryman as a Tasker task.
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and request/response lifecycle
//! - SQLx manages the application database (orders, recipients, deliverymen)
//! - Tasker orchestration receives queued jobs over its REST API
//! - Tasker worker runs in the background and executes the job steps

use std::sync::Arc;

use tracing::info;

use logistics_api::config::AppConfig;
use logistics_api::handler_registry::LogisticsHandlerRegistry;
use logistics_api::queue::OrchestrationQueue;
use logistics_api::store::PgStore;
use logistics_api::{create_app, db, AppState};
use tasker_worker::worker::handlers::{HandlerDispatchConfig, HandlerDispatchService, NoOpCallback};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logistics_api=debug,tasker_worker=info,tower_http=debug".into()),
        )
        .init();

    info!("Starting logistics API");

    let config = AppConfig::from_env()?;
    let app_db = db::connect(&config).await?;

    // Bootstrap the Tasker worker in the background. Axum provides the HTTP
    // server, so the worker's own web and gRPC servers stay disabled.
    let mut worker_handle = tasker_worker::WorkerBootstrap::bootstrap().await?;
    info!("Tasker worker bootstrapped");

    // WorkerBootstrap only creates infrastructure; the registry routes
    // dispatched steps to our handler functions.
    let registry = Arc::new(LogisticsHandlerRegistry::new());
    info!(
        "Handler registry initialized with {} handlers",
        registry.handler_count()
    );

    if let Some(dispatch_handles) = worker_handle.take_dispatch_handles() {
        let dispatch_config = HandlerDispatchConfig::default();
        let (dispatch_service, _capacity_checker) = HandlerDispatchService::with_callback(
            dispatch_handles.dispatch_receiver,
            dispatch_handles.completion_sender,
            registry,
            dispatch_config,
            Arc::new(NoOpCallback),
        );

        tokio::spawn(async move {
            dispatch_service.run().await;
        });
        info!("Handler dispatch service started");
    }

    let state = AppState::new(
        Arc::new(PgStore::new(app_db)),
        Arc::new(OrchestrationQueue::new(config.orchestration_url.clone())),
    );
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
