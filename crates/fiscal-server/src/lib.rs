//! Fiscal Web Server
//!
//! Axum-based JSON API for the Fiscal budget dashboard.
//!
//! - Read-only budget queries over a store loaded once at startup
//! - Assistant endpoints (503 when no model backend is configured)
//! - Restrictive CORS policy and security headers
//! - Sanitized error responses

use std::path::Path;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use fiscal_core::{AIBackend, Assistant, BudgetStore, LoadReport};

mod handlers;

/// Maximum accepted question length in characters
pub const MAX_QUESTION_LEN: usize = 2000;

/// Maximum conversation messages accepted with a question
pub const MAX_HISTORY_MESSAGES: usize = 50;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    /// Read `FISCAL_ALLOWED_ORIGINS` (comma-separated)
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("FISCAL_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { allowed_origins }
    }
}

/// Shared application state
pub struct AppState {
    pub store: Arc<BudgetStore>,
    pub report: LoadReport,
    pub assistant: Option<Assistant>,
}

impl AppState {
    pub fn new(store: BudgetStore, report: LoadReport, assistant: Option<Assistant>) -> Self {
        Self {
            store: Arc::new(store),
            report,
            assistant,
        }
    }

    /// The configured assistant, or 503
    pub(crate) fn assistant(&self) -> Result<&Assistant, AppError> {
        self.assistant
            .as_ref()
            .ok_or_else(|| AppError::unavailable("Assistant is not configured"))
    }
}

/// Headers set on every response. The dashboard loads its charts as data: URLs.
const SECURITY_HEADERS: [(header::HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'self'; img-src 'self' data:; style-src 'self' 'unsafe-inline'; frame-ancestors 'none'",
    ),
];

/// Same-origin only unless origins are configured
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    if origins.is_empty() {
        cors
    } else {
        cors.allow_origin(origins)
    }
}

/// Build the router: JSON API under `/api`, optional static UI as fallback
pub fn create_router(state: Arc<AppState>, static_dir: Option<&Path>, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        // Status
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::get_status))
        // Years
        .route("/years", get(handlers::list_years))
        .route("/years/:year/summary", get(handlers::get_summary))
        .route("/years/:year/overview", get(handlers::get_overview))
        .route("/years/:year/split", get(handlers::get_split))
        // Ministries
        .route("/years/:year/ministries", get(handlers::list_ministries))
        .route("/years/:year/ministries/:name", get(handlers::get_ministry))
        // Comparison
        .route("/compare", get(handlers::compare_years))
        // Insights and search
        .route("/insights", get(handlers::get_insights))
        .route("/search", get(handlers::search))
        // Assistant
        .route("/suggestions", get(handlers::get_suggestions))
        .route("/ask", post(handlers::ask))
        .route(
            "/years/:year/speech-analysis",
            post(handlers::analyze_speech),
        );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config));

    for (name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server
pub async fn serve(
    state: AppState,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_assistant(state.assistant.as_ref()).await;

    let app = create_router(Arc::new(state), static_dir, &config);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("📊 Fiscal API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Log whether the model backend answers
async fn check_assistant(assistant: Option<&Assistant>) {
    match assistant {
        Some(assistant) => {
            let client = assistant.client();
            if assistant.is_available().await {
                info!(
                    "✅ Assistant connected: {} ({} at {})",
                    client.backend_name(),
                    client.model(),
                    client.host()
                );
            } else {
                warn!(
                    "⚠️  Assistant configured but not responding: {} ({})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  Assistant not configured (set GEMINI_API_KEY or AI_BACKEND to enable /api/ask)");
        }
    }
}

/// Handler error: status plus a message that is safe to show clients
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    /// Logged, never returned
    internal: Option<fiscal_core::Error>,
}

impl AppError {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            internal: None,
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unavailable(message: &str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, status = %self.status, "Request failed");
        }
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

impl From<fiscal_core::Error> for AppError {
    fn from(err: fiscal_core::Error) -> Self {
        use fiscal_core::Error;

        match err {
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::InvalidData(msg) => Self::bad_request(&msg),
            Error::AssistantUnavailable(msg) => {
                warn!("Assistant unavailable: {}", msg);
                Self::unavailable("The assistant is currently unavailable")
            }
            other => Self {
                internal: Some(other),
                ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            },
        }
    }
}

#[cfg(test)]
mod tests;
