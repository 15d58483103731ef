//! Error types for vigil-conditions.

use thiserror::Error;

/// Errors raised by the condition model.
#[derive(Debug, Error)]
pub enum ConditionError {
    /// Schema-declared conditions can transition but never disappear.
    #[error("cannot clear condition {0:?}: it is declared by the resource schema")]
    SchemaDeclared(String),

    /// A loosely-typed payload could not be projected onto the condition model.
    #[error("invalid {field}: {reason}")]
    Conversion { field: &'static str, reason: String },

    /// JSON (de)serialization failed while adapting a payload.
    #[error("payload conversion failed for {field}: {source}")]
    Json {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ConditionError {
    pub(crate) fn conversion(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Conversion {
            field,
            reason: reason.into(),
        }
    }

    /// Conversion failures come from payloads that may be fixed by a later
    /// write, so they are worth retrying. Schema misuse is a programming error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ConditionError::SchemaDeclared(_))
    }
}

/// Result type for condition operations.
pub type ConditionResult<T> = Result<T, ConditionError>;
