use thiserror::Error;

use crate::identifier::Identifier;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: Identifier },

    #[error("Malformed field {kind}.{field}: {reason}")]
    MalformedField {
        kind: &'static str,
        field: String,
        reason: String,
    },

    #[error("{kind} has no secondary index on {field:?}")]
    UnsupportedFilter { kind: &'static str, field: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn malformed(kind: &'static str, field: &str, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            kind,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}
