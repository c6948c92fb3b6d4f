//! Lead Alert API Server
//!
//! REST surface for the lead alert engine: alert intake from the CRM,
//! acknowledgment and response recording, roster sync, and response-time
//! reporting for sales managers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod rate_limit;
mod routes;

pub use rate_limit::RateLimitConfig;

use alert_service::AlertService;
use team_directory::InMemoryDirectory;

/// Application state shared across handlers
pub struct AppState {
    /// Engine front door
    pub service: Arc<AlertService>,
    /// Roster the engine assigns from
    pub directory: Arc<InMemoryDirectory>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(service: Arc<AlertService>, directory: Arc<InMemoryDirectory>) -> Self {
        Self {
            service,
            directory,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub engine: EngineStatus,
}

/// Live engine counters
#[derive(Debug, Serialize)]
pub struct EngineStatus {
    pub active_alerts: usize,
    pub roster_size: usize,
    pub escalation_workers: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/alerts",
            post(routes::alerts::create).get(routes::alerts::get_active),
        )
        .route("/api/v1/alerts/:id", get(routes::alerts::get_by_id))
        .route(
            "/api/v1/alerts/:id/acknowledge",
            post(routes::alerts::acknowledge),
        )
        .route("/api/v1/alerts/:id/respond", post(routes::alerts::respond))
        .route("/api/v1/metrics/responses", get(routes::metrics::get_report))
        .route(
            "/api/v1/team",
            put(routes::team::upsert_member).get(routes::team::get_roster),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        engine: EngineStatus {
            active_alerts: state.service.active_alerts().await.len(),
            roster_size: state.directory.len().await,
            escalation_workers: state.service.config().workers,
        },
    };

    Json(response)
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server
///
/// Rate limiting keys on the peer IP, which is why the router is served
/// with connect info attached.
pub async fn run_server(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let governor = rate_limit::create_governor_config(&RateLimitConfig::default());
    let app = create_router(state).layer(GovernorLayer { config: governor });

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
