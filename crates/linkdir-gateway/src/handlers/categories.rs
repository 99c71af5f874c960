use super::with_etag;
use crate::error::Result;
use crate::extract::{AppJson, AppQuery, DeleteParams, IfMatch};
use crate::model::DeleteResponse;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use linkdir_core::{Category, CategoryPatch};

pub async fn list_categories_handler(State(state): State<AppState>) -> Result<Response> {
    let snapshot = state.directory.list_categories().await?;
    Ok(with_etag(snapshot.revision, snapshot.items))
}

pub async fn create_category_handler(
    State(state): State<AppState>,
    AppJson(category): AppJson<Category>,
) -> Result<(StatusCode, Json<Category>)> {
    let created = state.directory.create_category(category).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn edit_category_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    IfMatch(expected): IfMatch,
    AppJson(patch): AppJson<CategoryPatch>,
) -> Result<Json<Category>> {
    let updated = state.directory.edit_category(&name, patch, expected).await?;
    Ok(Json(updated))
}

pub async fn delete_category_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    IfMatch(expected): IfMatch,
    AppQuery(params): AppQuery<DeleteParams>,
) -> Result<Json<DeleteResponse>> {
    let affected_links = state
        .directory
        .delete_category(&name, params.delete_links, expected)
        .await?;
    Ok(Json(DeleteResponse {
        success: true,
        affected_links,
    }))
}
