pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use portal_core::middleware::{
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::PortalConfig;
use crate::services::{
    AllowlistCache, AuthService, ContentRepository, EmailProvider, SessionService,
    VerificationStore,
};
use portal_core::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub content: Arc<dyn ContentRepository>,
    pub email: Arc<dyn EmailProvider>,
    pub allowlist: AllowlistCache,
    pub codes: VerificationStore,
    pub sessions: SessionService,
    pub auth: AuthService,
    pub send_code_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    // Code issuance sits behind its own per-IP limiter
    let send_code_limiter = state.send_code_rate_limiter.clone();
    let send_code_route = Router::new()
        .route("/api/auth/send-code", post(handlers::auth::send_code))
        .layer(from_fn_with_state(
            send_code_limiter,
            ip_rate_limit_middleware,
        ));

    // Create global IP rate limiter
    let ip_limiter = state.ip_rate_limiter.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/login", get(handlers::pages::login_page))
        .route("/api/auth/verify-code", post(handlers::auth::verify_code))
        .route("/api/logout", get(handlers::auth::logout))
        .merge(send_code_route)
        // Gated portal content
        .route("/", get(handlers::content::dashboard))
        .route("/api/events", get(handlers::content::list_events))
        .route("/api/agendas", get(handlers::content::list_agendas))
        .route("/api/contacts", get(handlers::content::list_contacts))
        .route("/api/members", get(handlers::content::member_roster))
        // The session gate wraps every route; public prefixes are classified
        // inside so it is a true gate, not a per-page check
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth::session_gate,
        ))
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(ip_limiter, ip_rate_limit_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add security headers middleware
        .layer(from_fn(security_headers_middleware))
        // Add CORS layer
        .layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .map(|o| {
                            o.parse::<axum::http::HeaderValue>().unwrap_or_else(|e| {
                                tracing::error!(
                                    "Invalid CORS origin '{}': {}. Using fallback.",
                                    o,
                                    e
                                );
                                axum::http::HeaderValue::from_static("*")
                            })
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        )
}

/// Service health check
pub async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.content.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Content repository health check failed");
        AppError::BadGateway("content repository unreachable".to_string())
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "content_repository": "up"
        }
    })))
}
