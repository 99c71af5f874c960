use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkdir_core::{DirectoryError, FieldIssue};
use linkdir_interchange::InterchangeError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Interchange(#[from] InterchangeError),
    #[error(transparent)]
    Json(#[from] JsonRejection),
    #[error(transparent)]
    Query(#[from] QueryRejection),
    #[error("invalid If-Match header: {0}")]
    InvalidPrecondition(String),
    #[error("not allowed")]
    Forbidden,
}

#[derive(Debug, Serialize)]
struct IssueBody<'a> {
    field: &'a str,
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    issues: Vec<IssueBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

impl<'a> ErrorBody<'a> {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            issues: Vec::new(),
            count: None,
        }
    }
}

fn issues(issues: &[FieldIssue]) -> Vec<IssueBody<'_>> {
    issues
        .iter()
        .map(|issue| IssueBody {
            field: &issue.field,
            message: &issue.message,
        })
        .collect()
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Directory(err) => match err {
                DirectoryError::Validation(_) => StatusCode::BAD_REQUEST,
                DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
                DirectoryError::DuplicateKey { .. } | DirectoryError::HasDependents { .. } => {
                    StatusCode::CONFLICT
                }
                DirectoryError::StaleRevision { .. } => StatusCode::PRECONDITION_FAILED,
                DirectoryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Interchange(_)
            | AppError::Json(_)
            | AppError::Query(_)
            | AppError::InvalidPrecondition(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Directory(DirectoryError::Storage(err)) => {
                error!(error = %err, "storage failure");
                ErrorBody::message("internal server error")
            }
            AppError::Directory(DirectoryError::Validation(err)) => ErrorBody {
                error: "validation failed".to_string(),
                issues: issues(err.issues()),
                count: None,
            },
            AppError::Directory(DirectoryError::HasDependents { count, .. }) => ErrorBody {
                count: Some(*count),
                ..ErrorBody::message(self.to_string())
            },
            AppError::Json(rejection) => ErrorBody::message(rejection.body_text()),
            AppError::Query(rejection) => ErrorBody::message(rejection.body_text()),
            other => ErrorBody::message(other.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
