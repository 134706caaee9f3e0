use thiserror::Error;

/// Failures surfaced to the calling service layer.
///
/// Everything except `Storage` is a domain outcome the caller can show to an
/// end user. `Storage` wraps whatever the persistence layer reported and means
/// the enclosing transaction was abandoned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("State conflict: {0}")]
    StateConflict(String),

    #[error("Shape conflict: {0}")]
    ShapeConflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ScoringError {
    pub fn not_found(what: &str, id: &str) -> Self {
        ScoringError::NotFound(format!("{} {} does not exist", what, id))
    }
}

impl From<sqlx::Error> for ScoringError {
    fn from(err: sqlx::Error) -> Self {
        ScoringError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ScoringError {
    fn from(err: serde_json::Error) -> Self {
        ScoringError::Storage(format!("Malformed stored JSON: {}", err))
    }
}

/// Role-based permission check. Callers consult it before invoking a ledger
/// operation; the services here assume the caller is already authorized.
pub trait Authorizer: Send + Sync {
    fn can_perform_action(&self, role: &str, action: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_record() {
        let err = ScoringError::not_found("Session", "abc");
        assert_eq!(err.to_string(), "Not found: Session abc does not exist");
    }

    #[test]
    fn sqlx_errors_become_storage_errors() {
        let err: ScoringError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ScoringError::Storage(_)));
    }
}
