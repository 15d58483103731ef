//! Error types for the transition observer

use thiserror::Error;
use vigil_conditions::ConditionError;
use vigil_observability::ObservabilityError;

/// Errors returned by a [`ResourceFetcher`](crate::ResourceFetcher).
///
/// Not-found is not an error: fetchers report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backing source could not be reached
    #[error("resource source unavailable: {0}")]
    Unavailable(String),

    /// The caller gave up on the fetch
    #[error("fetch cancelled")]
    Cancelled,

    /// The payload could not be adapted to a status resource
    #[error(transparent)]
    Conversion(#[from] ConditionError),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        FetchError::Other(Box::new(err))
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Conversion(e) => e.is_retryable(),
            _ => true,
        }
    }
}

/// Errors that can occur in the observer
#[derive(Debug, Error)]
pub enum ObserverError {
    /// Fetch failed; passed through unchanged
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Metric families could not be created or registered
    #[error("metrics error: {0}")]
    Metrics(#[from] ObservabilityError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ObserverError {
    /// Whether the scheduler should retry the key
    pub fn is_retryable(&self) -> bool {
        match self {
            ObserverError::Fetch(e) => e.is_retryable(),
            ObserverError::Metrics(_) | ObserverError::Config(_) => false,
        }
    }
}

/// Result type for observer operations
pub type ObserverResult<T> = Result<T, ObserverError>;
