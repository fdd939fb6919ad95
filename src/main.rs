//! Rockfall Monitor Server
//!
//! Ingests slope sensor readings, runs risk assessments when enough recent
//! data has arrived, and raises alerts for HIGH and CRITICAL risk.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ROCKFALL MONITOR                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Trigger  │  │  Assessment Pipeline    │ │
//! │  │  (Axum)   │─▶│  + Gate   │─▶│  model ─▶ level ─▶ alert│ │
//! │  └─────┬─────┘  └───────────┘  └────────────┬────────────┘ │
//! │        └──────────────┬─────────────────────┘              │
//! │                       ▼                                     │
//! │             ┌──────────────────┐                           │
//! │             │ PostgreSQL/Memory│                           │
//! │             └──────────────────┘                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod pipeline;
mod risk;
mod store;

#[cfg(test)]
mod testing;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, StorageBackend};
use crate::pipeline::{AssessmentPipeline, Ingestor, LogNotifier, Notifier, PipelineSettings};
use crate::risk::{RiskModel, StochasticRiskModel};
use crate::store::{AlertStore, AssessmentStore, MemoryStore, PgStore, ReadingStore, RunRecorder};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rockfall_monitor=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Load configuration
    let config = Config::from_env();
    config.validate().map_err(anyhow::Error::msg).context("Invalid configuration")?;
    let settings = PipelineSettings::from_config(&config).map_err(anyhow::Error::msg)?;

    tracing::info!("Rockfall Monitor starting...");

    let model: Arc<dyn RiskModel> = Arc::new(StochasticRiskModel::new(
        config.site_lat,
        config.site_lng,
        settings.thresholds,
    ));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let backend = config.backend().map_err(anyhow::Error::msg)?;
    let state = match backend {
        StorageBackend::Postgres => {
            tracing::info!("Database: {}", config.database_url.split('@').last().unwrap_or("***"));

            let pool = db::create_pool(&config.database_url).await
                .context("Failed to create database pool")?;

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool).await
                .context("Failed to run migrations")?;

            AppState::build(config.clone(), Arc::new(PgStore::new(pool)), model, notifier, settings)
        }
        StorageBackend::Memory => {
            if config.is_production() {
                tracing::warn!("In-memory storage in production, data is lost on restart");
            } else {
                tracing::info!("Using in-memory storage");
            }
            AppState::build(config.clone(), Arc::new(MemoryStore::new()), model, notifier, settings)
        }
    };

    if config.assessment_interval_secs > 0 {
        let every = Duration::from_secs(config.assessment_interval_secs);
        tracing::info!("Scheduled assessment every {:?}", every);
        pipeline::scheduler::spawn(state.pipeline.clone(), every);
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub assessments: Arc<dyn AssessmentStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub model: Arc<dyn RiskModel>,
    pub pipeline: Arc<AssessmentPipeline>,
    pub ingestor: Arc<Ingestor>,
}

impl AppState {
    /// Wire one store backend into every component
    pub fn build<S>(
        config: Config,
        store: Arc<S>,
        model: Arc<dyn RiskModel>,
        notifier: Arc<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self
    where
        S: ReadingStore + AssessmentStore + AlertStore + RunRecorder + 'static,
    {
        let pipeline = Arc::new(AssessmentPipeline::new(
            store.clone(),
            store.clone(),
            model.clone(),
            notifier,
            settings,
        ));

        Self {
            config,
            assessments: store.clone(),
            alerts: store,
            model,
            ingestor: Arc::new(Ingestor::new(pipeline.clone())),
            pipeline,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(handlers::health::check))

        // Ingestion
        .route("/api/sensor-data", post(handlers::readings::submit))

        // Assessments
        .route("/api/risk-assessment", get(handlers::assessments::latest))
        .route("/api/risk-assessment/run", post(handlers::assessments::run))
        .route("/api/risk-map", get(handlers::risk_map::get))
        .route("/api/forecast", get(handlers::forecast::get))

        // Alerts
        .route("/api/alerts", get(handlers::alerts::list))
        .route("/api/alerts/:id/status", put(handlers::alerts::update_status));

    Router::new()
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
