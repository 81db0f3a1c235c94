//! Gated portal content endpoints, backed by the content repository.

use axum::{extract::State, Json};
use serde_json::json;

use crate::middleware::AuthUser;
use crate::models::{Agenda, Contact, Event, RosterMember};
use crate::AppState;
use portal_core::error::AppError;

/// Dashboard summary for the signed-in member.
///
/// GET /
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let globals = state
        .content
        .site_globals()
        .await
        .map_err(content_error)?;

    Ok(Json(json!({
        "site": globals,
        "user": { "email": user.email },
    })))
}

/// GET /api/events
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.content.list_events().await.map_err(content_error)?;
    Ok(Json(events))
}

/// GET /api/agendas
pub async fn list_agendas(State(state): State<AppState>) -> Result<Json<Vec<Agenda>>, AppError> {
    let agendas = state.content.list_agendas().await.map_err(content_error)?;
    Ok(Json(agendas))
}

/// GET /api/contacts
pub async fn list_contacts(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, AppError> {
    let contacts = state.content.list_contacts().await.map_err(content_error)?;
    Ok(Json(contacts))
}

/// GET /api/members
pub async fn member_roster(
    State(state): State<AppState>,
) -> Result<Json<Vec<RosterMember>>, AppError> {
    let roster = state.content.member_roster().await.map_err(content_error)?;
    Ok(Json(roster))
}

fn content_error(e: anyhow::Error) -> AppError {
    tracing::error!(error = %e, "Content repository request failed");
    AppError::BadGateway("content repository unavailable".to_string())
}
