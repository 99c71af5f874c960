use super::with_etag;
use crate::error::Result;
use crate::extract::{AppJson, AppQuery, DeleteParams, IfMatch};
use crate::model::DeleteResponse;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use linkdir_core::{Tag, TagPatch};

pub async fn list_tags_handler(State(state): State<AppState>) -> Result<Response> {
    let snapshot = state.directory.list_tags().await?;
    Ok(with_etag(snapshot.revision, snapshot.items))
}

pub async fn create_tag_handler(
    State(state): State<AppState>,
    AppJson(tag): AppJson<Tag>,
) -> Result<(StatusCode, Json<Tag>)> {
    let created = state.directory.create_tag(tag).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn edit_tag_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    IfMatch(expected): IfMatch,
    AppJson(patch): AppJson<TagPatch>,
) -> Result<Json<Tag>> {
    let updated = state.directory.edit_tag(&name, patch, expected).await?;
    Ok(Json(updated))
}

pub async fn delete_tag_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    IfMatch(expected): IfMatch,
    AppQuery(params): AppQuery<DeleteParams>,
) -> Result<Json<DeleteResponse>> {
    let affected_links = state
        .directory
        .delete_tag(&name, params.delete_links, expected)
        .await?;
    Ok(Json(DeleteResponse {
        success: true,
        affected_links,
    }))
}
