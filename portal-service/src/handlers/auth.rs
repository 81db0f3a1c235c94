//! Authentication handlers: one-time-code issuance, verification, logout.

use axum::{
    extract::{Json, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::services::session::SessionService;
use crate::AppState;
use portal_core::error::AppError;

/// Request to send a one-time code.
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    #[serde(default)]
    pub email: String,
}

/// Request to verify a one-time code.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

/// Acknowledgement for both auth endpoints.
#[derive(Debug, Serialize)]
pub struct AuthSuccessResponse {
    pub success: bool,
}

/// Send a one-time code to a committee member's email.
///
/// POST /api/auth/send-code
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<AuthSuccessResponse>, AppError> {
    state.auth.issue_code(&req.email).await?;
    Ok(Json(AuthSuccessResponse { success: true }))
}

/// Verify a one-time code and establish the session cookie.
///
/// POST /api/auth/verify-code
pub async fn verify_code(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<(CookieJar, Json<AuthSuccessResponse>), AppError> {
    let user = state.auth.verify_code(&req.email, &req.code).await?;
    let cookie = state.sessions.issue(&user)?;

    tracing::info!(email = %user.email, "Session established");

    Ok((jar.add(cookie), Json(AuthSuccessResponse { success: true })))
}

/// Clear the session cookie and return to the login page.
///
/// GET /api/logout
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    (jar.remove(SessionService::removal()), Redirect::to("/login"))
}
