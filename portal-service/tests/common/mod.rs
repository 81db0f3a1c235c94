//! Test helper module for committee-portal integration tests.
//!
//! Builds the real router with mock collaborators and drives it through
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use portal_core::middleware::rate_limit::create_ip_rate_limiter;
use portal_service::{
    build_router,
    config::{
        ContentRepositoryConfig, Environment, PortalConfig, RateLimitConfig, SecurityConfig,
        SessionConfig, SmtpConfig,
    },
    services::{
        AllowlistCache, AuthService, ContentRepository, EmailProvider, MockContentRepository,
        MockEmailService, SessionService, SessionUser, VerificationStore,
    },
    AppState,
};
use secrecy::Secret;
use std::sync::Arc;
use tower::util::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub content: Arc<MockContentRepository>,
    pub email: Arc<MockEmailService>,
}

impl TestApp {
    /// Spawn the app with a single authorized member, alice@example.com.
    pub fn spawn() -> Self {
        Self::spawn_with_members(&["alice@example.com"])
    }

    /// Spawn the app with mock collaborators and the given authorized members.
    pub fn spawn_with_members(emails: &[&str]) -> Self {
        Self::build(emails, (100, 60))
    }

    /// Spawn with a tight per-IP limit on the send-code endpoint.
    pub fn spawn_with_send_code_limit(
        emails: &[&str],
        attempts: u32,
        window_seconds: u64,
    ) -> Self {
        Self::build(emails, (attempts, window_seconds))
    }

    fn build(emails: &[&str], send_code_limit: (u32, u64)) -> Self {
        let content = Arc::new(MockContentRepository::with_member_emails(emails));
        let email = Arc::new(MockEmailService::new());
        let config = create_test_config();

        let content_dyn = content.clone() as Arc<dyn ContentRepository>;
        let email_dyn = email.clone() as Arc<dyn EmailProvider>;

        let allowlist = AllowlistCache::new(content_dyn.clone());
        let codes = VerificationStore::new();
        let sessions = SessionService::new(&config.session);
        let auth = AuthService::new(content_dyn.clone(), email_dyn.clone(), codes.clone());

        let state = AppState {
            config,
            content: content_dyn,
            email: email_dyn,
            allowlist,
            codes,
            sessions,
            auth,
            send_code_rate_limiter: create_ip_rate_limiter(send_code_limit.0, send_code_limit.1),
            ip_rate_limiter: create_ip_rate_limiter(1000, 60),
        };

        let router = build_router(state.clone());

        TestApp {
            router,
            state,
            content,
            email,
        }
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// POST carrying an `x-forwarded-for` header, for rate-limit tests.
    pub async fn post_json_from_ip(
        &self,
        uri: &str,
        body: serde_json::Value,
        ip: &str,
    ) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("x-forwarded-for", ip)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request_with_cookie(uri, None).await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response {
        self.request_with_cookie(uri, Some(cookie)).await
    }

    async fn request_with_cookie(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        self.router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    /// A valid session cookie header value for the given email.
    pub fn session_cookie_for(&self, email: &str) -> String {
        let token = self
            .state
            .sessions
            .encode(&SessionUser {
                email: email.to_string(),
            })
            .unwrap();
        format!("committee_auth={}", token)
    }
}

/// Create a test configuration.
pub fn create_test_config() -> PortalConfig {
    PortalConfig {
        common: portal_core::config::Config { port: 0 },
        environment: Environment::Dev,
        service_name: "portal-service-test".to_string(),
        service_version: "0.1.0".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        content: ContentRepositoryConfig {
            url: "http://localhost:8055".to_string(),
            token: Secret::new("test-token".to_string()),
        },
        smtp: SmtpConfig {
            relay: "smtp.example.org".to_string(),
            user: "portal@example.org".to_string(),
            password: Secret::new("test-password".to_string()),
            from_address: "Committee Portal <noreply@example.org>".to_string(),
        },
        session: SessionConfig {
            secret: Secret::new("test-session-secret".to_string()),
            max_age_days: 30,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            send_code_attempts: 100,
            send_code_window_seconds: 60,
            global_ip_limit: 1000,
            global_ip_window_seconds: 60,
        },
    }
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The Set-Cookie header value, if any.
pub fn set_cookie_header(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
