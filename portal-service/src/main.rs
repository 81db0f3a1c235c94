use portal_core::middleware::rate_limit::create_ip_rate_limiter;
use portal_core::observability::logging::init_tracing;
use portal_service::{
    build_router,
    config::PortalConfig,
    services::{
        AllowlistCache, AuthService, ContentRepository, DirectusClient, EmailProvider,
        EmailService, SessionService, VerificationStore,
    },
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), portal_core::error::AppError> {
    // Load configuration - fail fast if invalid
    let config = PortalConfig::from_env()?;

    // Initialize tracing/logging using shared logic
    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting committee portal service"
    );

    // Initialize the content repository client
    let content =
        Arc::new(DirectusClient::new(&config.content)?) as Arc<dyn ContentRepository>;
    tracing::info!(url = %config.content.url, "Content repository client initialized");

    // Initialize email service
    let email = Arc::new(EmailService::new(&config.smtp)?) as Arc<dyn EmailProvider>;

    // Initialize auth state
    let allowlist = AllowlistCache::new(content.clone());
    let codes = VerificationStore::new();
    let sessions = SessionService::new(&config.session);
    let auth = AuthService::new(content.clone(), email.clone(), codes.clone());

    // Initialize rate limiters using shared logic
    let send_code_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.send_code_attempts,
        config.rate_limit.send_code_window_seconds,
    );
    let ip_rate_limiter = create_ip_rate_limiter(
        config.rate_limit.global_ip_limit,
        config.rate_limit.global_ip_window_seconds,
    );
    tracing::info!("Rate limiters initialized: Send Code and Global IP");

    // Create application state
    let state = AppState {
        config: config.clone(),
        content,
        email,
        allowlist,
        codes,
        sessions,
        auth,
        send_code_rate_limiter,
        ip_rate_limiter,
    };

    // Build application router
    let app = build_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
