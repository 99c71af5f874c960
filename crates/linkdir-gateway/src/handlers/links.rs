use super::with_etag;
use crate::error::Result;
use crate::extract::{AppJson, IfMatch};
use crate::model::SuccessResponse;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use linkdir_core::{Link, LinkPatch};

pub async fn list_links_handler(State(state): State<AppState>) -> Result<Response> {
    let snapshot = state.directory.list_links().await?;
    Ok(with_etag(snapshot.revision, snapshot.items))
}

pub async fn create_link_handler(
    State(state): State<AppState>,
    AppJson(link): AppJson<Link>,
) -> Result<(StatusCode, Json<Link>)> {
    let created = state.directory.create_link(link).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_link_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    IfMatch(expected): IfMatch,
    AppJson(patch): AppJson<LinkPatch>,
) -> Result<Json<Link>> {
    let updated = state.directory.update_link(&name, patch, expected).await?;
    Ok(Json(updated))
}

pub async fn delete_link_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    IfMatch(expected): IfMatch,
) -> Result<Json<SuccessResponse>> {
    state.directory.delete_link(&name, expected).await?;
    Ok(Json(SuccessResponse::ok()))
}
