//! Sentinel Web Server
//!
//! Axum-based REST API behind the Sentinel dashboard.
//!
//! Every request belongs to a session, picked by the `x-sentinel-session`
//! header (`default` when absent). Sessions own their ledger and their Plaid
//! access token, so clients never see each other's data.
//!
//! Security features:
//! - Restrictive CORS policy
//! - Security headers (CSP, nosniff, frame denial)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use sentinel_core::{Config, Ledger, ProviderClient, Session, SessionManager, Snapshot};

mod handlers;

/// Header carrying the client's session id
pub const SESSION_HEADER: &str = "x-sentinel-session";

/// Longest accepted session id; longer values fall back to the default session
const MAX_SESSION_ID_LEN: usize = 128;

/// Shared application state
pub struct AppState {
    pub sessions: SessionManager,
    pub config: Config,
    /// Read-only aggregator, if configured
    pub simplefin: Option<ProviderClient>,
    /// Bank-link provider, if configured
    pub plaid: Option<ProviderClient>,
}

impl AppState {
    /// Build state from config, seeding every new session from `seed`
    pub fn from_config(config: Config, seed: Option<Snapshot>) -> sentinel_core::Result<Self> {
        let simplefin = ProviderClient::simplefin_from_config(&config)?;
        let plaid = ProviderClient::plaid_from_config(&config)?;
        Ok(Self::new(config, seed, simplefin, plaid))
    }

    /// Build state with explicit providers (for testing)
    pub fn new(
        config: Config,
        seed: Option<Snapshot>,
        simplefin: Option<ProviderClient>,
        plaid: Option<ProviderClient>,
    ) -> Self {
        let template = Ledger::from_snapshot(seed.unwrap_or_default())
            .with_yearly_threshold(config.runway.yearly_threshold);
        let sessions = SessionManager::new(template, config.server.session_ttl());

        Self {
            sessions,
            config,
            simplefin,
            plaid,
        }
    }

    /// Session for this request, created on first use
    pub async fn session(&self, headers: &HeaderMap) -> Arc<Mutex<Session>> {
        self.sessions.get_or_create(&get_session_id(headers)).await
    }
}

/// Extract the session id from request headers
pub fn get_session_id(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_SESSION_ID_LEN)
        .unwrap_or(sentinel_core::DEFAULT_SESSION)
        .to_string()
}

/// Success response
#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, static_dir: Option<&str>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/dashboard", get(handlers::get_dashboard))
        // Inbox
        .route("/transactions", get(handlers::list_transactions))
        .route(
            "/transactions/:id/approve",
            post(handlers::approve_transaction),
        )
        // Approved subscriptions
        .route("/subscriptions", get(handlers::list_subscriptions))
        .route(
            "/subscriptions/:id",
            delete(handlers::delete_subscription),
        )
        .route(
            "/subscriptions/:id/notes",
            put(handlers::update_subscription_notes),
        )
        .route(
            "/subscriptions/:id/unapprove",
            post(handlers::unapprove_subscription),
        )
        // Runway
        .route("/income", get(handlers::list_income))
        .route(
            "/estimates",
            get(handlers::list_estimates).post(handlers::create_estimate),
        )
        .route("/estimates/:id", delete(handlers::delete_estimate))
        .route("/runway", get(handlers::get_runway))
        // Providers
        .route("/create-link-token", post(handlers::create_link_token))
        .route(
            "/exchange-public-token",
            post(handlers::exchange_public_token),
        )
        .route("/sync/plaid", post(handlers::sync_plaid))
        .route("/sync/simplefin", post(handlers::sync_simplefin));

    let allowed_origins = &state.config.server.allowed_origins;
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [
        header::CONTENT_TYPE,
        HeaderName::from_static(SESSION_HEADER),
    ];

    // Build CORS layer
    let cors = if allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new().allow_methods(methods).allow_headers(headers)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    };

    // CSP: same-origin scripts, inline styles for the dashboard, Plaid Link in a frame
    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self' https://cdn.plaid.com; style-src 'self' 'unsafe-inline'; img-src 'self' data:; connect-src 'self'; frame-src https://cdn.plaid.com; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve static files if directory provided
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
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    log_providers(&state);

    let app = create_router(Arc::new(state), static_dir);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn log_providers(state: &AppState) {
    match &state.simplefin {
        Some(_) => info!("SimpleFIN configured"),
        None => info!("SimpleFIN not configured (set SIMPLEFIN_BASE_URL, SIMPLEFIN_USERNAME, SIMPLEFIN_PASSWORD)"),
    }
    match &state.plaid {
        Some(_) => info!(
            environment = state.config.plaid.environment.as_str(),
            "Plaid configured"
        ),
        None => info!("Plaid not configured (set PLAID_CLIENT_ID, PLAID_SECRET)"),
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, status = %self.status, "Request failed");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<sentinel_core::Error> for AppError {
    fn from(err: sentinel_core::Error) -> Self {
        use sentinel_core::Error;

        let status = match &err {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidFrequency(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::MalformedRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotConnected => StatusCode::UNAUTHORIZED,
            Error::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_client_error() {
            return Self {
                status,
                message: err.to_string(),
                internal: None,
            };
        }

        let message = if status == StatusCode::BAD_GATEWAY {
            "Bank provider unavailable"
        } else {
            // Return generic message to client
            "An internal error occurred"
        };
        Self {
            status,
            message: message.to_string(),
            // Keep full error for logging
            internal: Some(anyhow::Error::new(err)),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}
