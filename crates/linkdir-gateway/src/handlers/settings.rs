use super::with_etag;
use crate::error::Result;
use crate::extract::{AppJson, IfMatch};
use crate::model::SuccessResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use linkdir_core::Settings;
use tracing::warn;

pub async fn get_settings_handler(State(state): State<AppState>) -> Result<Response> {
    let (settings, revision) = state.directory.settings().await?;
    Ok(with_etag(revision, settings))
}

pub async fn replace_settings_handler(
    State(state): State<AppState>,
    IfMatch(expected): IfMatch,
    AppJson(settings): AppJson<Settings>,
) -> Result<Response> {
    let revision = state
        .directory
        .replace_settings(settings.clone(), expected)
        .await?;
    Ok(with_etag(revision, settings))
}

/// Wipes every collection and restores the settings template.
pub async fn reset_handler(State(state): State<AppState>) -> Result<Json<SuccessResponse>> {
    warn!("resetting all directory data");
    state.directory.reset_all().await?;
    Ok(Json(SuccessResponse::ok()))
}
