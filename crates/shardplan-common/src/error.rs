use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used by callers to tell a rejected query apart
/// from a planner defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unsupported,
    InvalidQuery,
    Internal,
    Config,
}

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Unknown column '{column}' in '{clause}'")]
    UnknownColumn { column: String, clause: String },
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("expression does not reference exactly one table")]
    NotSingleTable,
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Error::UnsupportedFeature(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Error::InvalidQuery(msg.into())
    }

    pub fn unknown_column(column: impl Into<String>, clause: impl Into<String>) -> Self {
        Error::UnknownColumn {
            column: column.into(),
            clause: clause.into(),
        }
    }

    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound(name.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedFeature(_) => ErrorKind::Unsupported,
            Error::InvalidQuery(_)
            | Error::UnknownColumn { .. }
            | Error::TableNotFound(_)
            | Error::NotSingleTable => ErrorKind::InvalidQuery,
            Error::Internal(_) => ErrorKind::Internal,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    pub fn is_not_single_table(&self) -> bool {
        matches!(self, Error::NotSingleTable)
    }
}
