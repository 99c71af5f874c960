use crate::error::Result;
use crate::extract::{AppQuery, ImportParams};
use crate::state::AppState;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use linkdir_core::query::group_by_category;
use linkdir_directory::{DuplicatePolicy, ImportOptions, ImportResult};
use linkdir_interchange::{
    export_bookmarks_html, export_csv, parse_bookmarks_html, parse_csv, Parsed,
};

fn options(params: &ImportParams) -> ImportOptions {
    let duplicates = if params.overwrite {
        DuplicatePolicy::Overwrite
    } else {
        DuplicatePolicy::Skip
    };
    ImportOptions::builder().duplicates(duplicates).build()
}

async fn import(state: &AppState, parsed: Parsed, params: &ImportParams) -> Result<Json<ImportResult>> {
    let mut result = state
        .directory
        .import_links(parsed.links, options(params))
        .await?;
    result.dropped = parsed.dropped;
    Ok(Json(result))
}

/// Imports a CSV file sent as the raw request body.
pub async fn import_csv_handler(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ImportParams>,
    body: String,
) -> Result<Json<ImportResult>> {
    let parsed = parse_csv(&body)?;
    import(&state, parsed, &params).await
}

/// Imports a browser bookmarks export sent as the raw request body.
pub async fn import_bookmarks_handler(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ImportParams>,
    body: String,
) -> Result<Json<ImportResult>> {
    let parsed = parse_bookmarks_html(&body)?;
    import(&state, parsed, &params).await
}

pub async fn export_csv_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let links = state.directory.list_links().await?.items;
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"links.csv\""),
        ],
        export_csv(&links),
    ))
}

pub async fn export_bookmarks_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let links = state.directory.list_links().await?.items;
    Ok((
        [
            (CONTENT_TYPE, "text/html; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=\"bookmarks.html\""),
        ],
        export_bookmarks_html(&group_by_category(&links)),
    ))
}
