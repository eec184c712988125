//! # Mail Canvas Server Library
//!
//! Shared types and the HTTP router for the Mail Canvas service.
//! This library is used by both the binary and integration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use mailcanvas_core::TemplateStore;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod design;
pub mod error;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod validation;

pub use config::{CliArgs, LlmConfig, ServerConfig};
pub use design::{DesignClient, DesignError};
pub use error::ApiError;

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Saved templates.
    pub store: TemplateStore,
    /// AI design client, present when an API key is configured.
    pub design: Option<DesignClient>,
    design_busy: Arc<AtomicBool>,
}

impl AppState {
    /// Create state around a store and an optional design client.
    #[must_use]
    pub fn new(store: TemplateStore, design: Option<DesignClient>) -> Self {
        Self {
            store,
            design,
            design_busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build state from configuration, opening the data directory if one is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be opened or the design
    /// client cannot be built.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let store = match &config.data_dir {
            Some(dir) => TemplateStore::with_data_dir(dir)?,
            None => TemplateStore::new(),
        };
        let design = config.llm.as_ref().map(DesignClient::new).transpose()?;
        Ok(Self::new(store, design))
    }

    /// Claim the single AI generation slot.
    ///
    /// Returns `None` while another generation holds it. The slot is released
    /// when the returned permit is dropped.
    #[must_use]
    pub fn try_begin_design(&self) -> Option<DesignPermit> {
        self.design_busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DesignPermit {
                busy: Arc::clone(&self.design_busy),
            })
    }
}

/// Holds the AI generation slot until dropped.
#[derive(Debug)]
pub struct DesignPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for DesignPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Build the API router with request-id, tracing and metrics layers.
///
/// CORS and the `/metrics` endpoint are added by the binary.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoints (Kubernetes probes)
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route(
            "/api/templates",
            get(routes::list_templates).post(routes::create_template),
        )
        .route(
            "/api/templates/{id}",
            get(routes::get_template)
                .put(routes::update_template)
                .delete(routes::delete_template),
        )
        .route("/api/templates/{id}/save-as", post(routes::save_template_as))
        .route("/api/templates/{id}/export", get(routes::export_template))
        .route("/api/render", post(routes::render))
        .route("/api/import", post(routes::import_html))
        .route("/api/design", post(routes::design))
        .route("/get-template", get(routes::get_template_by_shortcode))
        .layer(middleware::from_fn(metrics::track_http))
        // Request ID for distributed tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // Structured request tracing with timing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
