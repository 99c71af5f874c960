use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterchangeError {
    #[error("import file is empty")]
    Empty,
    #[error("missing columns: {0}")]
    MissingColumns(String),
}
