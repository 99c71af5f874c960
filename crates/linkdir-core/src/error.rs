use crate::entity::EntityKind;
use crate::repository::{Resource, Revision};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Errors returned by the directory data layer.
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// A single failed constraint on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// A candidate record failed its schema constraints.
///
/// Carries every violated constraint, not only the first one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    issues: Vec<FieldIssue>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error with exactly one issue.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut error = Self::new();
        error.push(field, message);
        error
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Prefixes every issue with `prefix.`, used when validating nested records.
    pub fn nested(mut self, prefix: &str) -> Self {
        for issue in &mut self.issues {
            issue.field = format!("{prefix}.{}", issue.field);
        }
        self
    }

    pub fn extend(&mut self, other: ValidationError) {
        self.issues.extend(other.issues);
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(())` when no issue was recorded.
    pub fn into_result(self) -> std::result::Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for issue in &self.issues {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", issue.field, issue.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("{resource} is corrupt: {detail}")]
    Corrupt { resource: Resource, detail: String },
    #[error("failed to serialize {resource}: {detail}")]
    Serialization { resource: Resource, detail: String },
    #[error("storage operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("{kind} already exists: {key}")]
    DuplicateKey { kind: EntityKind, key: String },
    #[error("{kind} not found: {key}")]
    NotFound { kind: EntityKind, key: String },
    #[error("{kind} '{key}' is referenced by {count} link(s)")]
    HasDependents {
        kind: EntityKind,
        key: String,
        count: usize,
    },
    #[error("{resource} changed since revision {expected} (now {actual})")]
    StaleRevision {
        resource: Resource,
        expected: Revision,
        actual: Revision,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DirectoryError {
    pub fn duplicate(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            kind,
            key: key.into(),
        }
    }

    pub fn not_found(kind: EntityKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }
}
