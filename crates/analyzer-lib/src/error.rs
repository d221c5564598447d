//! Error types for the analyzer
//!
//! Every failure the pipeline can hit maps onto one of these kinds.
//! `Throttled` and `Transient` are the only retryable ones; retry exhaustion
//! converts them into `FatalApi` at the call site that gave up.

use thiserror::Error;

/// Errors produced by the analysis pipeline
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Malformed caller input, rejected before any network call
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Missing or invalid credentials
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Credentials are valid but lack a required right
    #[error("permission denied for {action}")]
    Permission { action: String },

    /// The requested resource does not exist
    #[error("resource not found: {resource_id}")]
    NotFound { resource_id: String },

    /// The upstream service asked us to slow down
    #[error("throttled while {operation}")]
    Throttled { operation: String },

    /// Other retryable I/O fault (timeout, connection reset, 5xx)
    #[error("transient failure: {message}")]
    Transient { message: String },

    /// Non-retryable failure, including retry exhaustion
    #[error("fatal API error after {attempts} attempt(s): {message}")]
    FatalApi { message: String, attempts: u32 },
}

impl AnalyzerError {
    /// Whether a bounded retry at the call site is appropriate
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AnalyzerError::Throttled { .. } | AnalyzerError::Transient { .. }
        )
    }

    /// Convert a retryable error into the fatal form reported after exhaustion
    pub fn into_fatal(self, attempts: u32) -> AnalyzerError {
        match self {
            AnalyzerError::Throttled { .. } | AnalyzerError::Transient { .. } => {
                AnalyzerError::FatalApi {
                    message: self.to_string(),
                    attempts,
                }
            }
            other => other,
        }
    }
}

/// Convenience alias used throughout the library
pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(AnalyzerError::Throttled {
            operation: "get_series".into()
        }
        .is_retryable());
        assert!(AnalyzerError::Transient {
            message: "connection reset".into()
        }
        .is_retryable());
        assert!(!AnalyzerError::Auth("no credentials".into()).is_retryable());
        assert!(!AnalyzerError::NotFound {
            resource_id: "missing".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_into_fatal_converts_retryable() {
        let err = AnalyzerError::Throttled {
            operation: "get_series".into(),
        };
        match err.into_fatal(3) {
            AnalyzerError::FatalApi { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected FatalApi, got {other:?}"),
        }
    }

    #[test]
    fn test_into_fatal_preserves_non_retryable() {
        let err = AnalyzerError::Permission {
            action: "DescribeClusters".into(),
        };
        match err.into_fatal(1) {
            AnalyzerError::Permission { action } => assert_eq!(action, "DescribeClusters"),
            other => panic!("expected Permission, got {other:?}"),
        }
    }
}
