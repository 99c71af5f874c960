use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::http::header::IF_MATCH;
use axum::http::request::Parts;
use linkdir_core::Revision;
use serde::Deserialize;

use crate::error::AppError;

/// JSON body whose rejections render as [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query string whose rejections render as [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// The revision a writer last saw, from `If-Match`. Absent or `*` means
/// the write is unconditional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfMatch(pub Option<Revision>);

impl<S: Send + Sync> FromRequestParts<S> for IfMatch {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(IF_MATCH) else {
            return Ok(IfMatch(None));
        };
        let value = value
            .to_str()
            .map_err(|e| AppError::InvalidPrecondition(e.to_string()))?
            .trim();
        if value == "*" {
            return Ok(IfMatch(None));
        }
        value
            .parse::<Revision>()
            .map(|revision| IfMatch(Some(revision)))
            .map_err(|_| AppError::InvalidPrecondition(value.to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteParams {
    #[serde(default)]
    pub delete_links: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
    #[serde(default)]
    pub overwrite: bool,
}
