use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::services::session::{SessionService, SessionUser, SESSION_COOKIE};
use crate::AppState;

/// Route prefixes reachable without a session.
const PUBLIC_PREFIXES: &[&str] = &["/login", "/api/auth", "/api/logout", "/health"];

fn is_public(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// Session gate: every request passes through here before any handler runs.
///
/// Public prefixes fall through untouched. Everything else needs a session
/// cookie that parses, verifies, and names an email currently on the
/// allow-list; any failure clears the cookie and redirects to the login page.
pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Redirect::to("/login").into_response();
    };

    let user = match state.sessions.decode(cookie.value()) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting invalid session cookie");
            return clear_session_and_redirect(jar);
        }
    };

    // Authorization is re-checked against the allow-list on every request,
    // so removing a member locks them out within the cache TTL.
    let authorized = state.allowlist.authorized_emails().await;
    if !authorized.contains(&user.email.to_lowercase()) {
        tracing::warn!(email = %user.email, "Session email no longer authorized");
        return clear_session_and_redirect(jar);
    }

    req.extensions_mut().insert(user);
    next.run(req).await
}

fn clear_session_and_redirect(jar: CookieJar) -> Response {
    let jar = jar.remove(SessionService::removal());
    (jar, Redirect::to("/login")).into_response()
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Extractor to easily get the session identity in handlers
pub struct AuthUser(pub SessionUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<SessionUser>().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Session identity missing from request extensions".to_string(),
            }),
        ))?;

        Ok(AuthUser(user.clone()))
    }
}
