//! Error types for webactor-dispatch.

use thiserror::Error;

/// Main error type for all dispatch operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The resource set could not be enumerated at all.
    #[error("Resource enumeration failed: {0}")]
    Enumeration(#[source] std::io::Error),

    /// A single unit could not be read, inspected or loaded.
    #[error("Failed to load unit {unit}: {reason}")]
    UnitLoad { unit: String, reason: String },

    /// A marked unit has no registered factory.
    #[error("No handler factory registered for unit {0}")]
    UnitNotFound(String),

    /// The discovery task did not run to completion.
    #[error("Discovery aborted: {0}")]
    DiscoveryAborted(String),

    /// A URI pattern declared by a handler type is malformed.
    #[error("Invalid URI pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    /// Constructor parameter count does not match the handler type.
    #[error("Handler {handler} expects {expected} parameter(s), got {actual}")]
    ParamArity {
        handler: String,
        expected: usize,
        actual: usize,
    },

    /// A handler factory rejected its parameters.
    #[error("Failed to construct handler {handler}: {reason}")]
    Construct { handler: String, reason: String },

    /// The handler behind an address has stopped.
    #[error("Handler {0} is no longer running")]
    HandlerStopped(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error while loading configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error outside of discovery (config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Wrap any displayable failure as a load error for `unit`.
    pub fn unit_load(unit: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::UnitLoad {
            unit: unit.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from walking the resource set as a whole.
    pub fn is_enumeration(&self) -> bool {
        matches!(self, Self::Enumeration(_))
    }
}

/// Result type alias using DispatchError.
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_arity_message() {
        let err = DispatchError::ParamArity {
            handler: "chat".into(),
            expected: 2,
            actual: 0,
        };
        assert_eq!(err.to_string(), "Handler chat expects 2 parameter(s), got 0");
    }

    #[test]
    fn test_unit_load_helper() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DispatchError::unit_load("app.Chat", io);
        assert!(matches!(err, DispatchError::UnitLoad { ref unit, .. } if unit == "app.Chat"));
        assert!(!err.is_enumeration());
    }

    #[test]
    fn test_enumeration_is_enumeration() {
        let err = DispatchError::Enumeration(std::io::Error::other("denied"));
        assert!(err.is_enumeration());
    }
}
