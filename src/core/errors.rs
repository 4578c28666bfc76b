use std::collections::HashMap;
use thiserror::Error;

/// Unified error type for the stsm core and its collaborators
#[derive(Debug, Error)]
pub enum StsmError {
    /// Empty identifiers, listeners of the wrong shape, malformed requests
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
        argument: Option<String>,
    },

    /// Unknown symbol, suite, or filesystem location
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A plugin unit failed to initialize
    #[error("Failed to load plugin '{plugin}': {message}")]
    LoadFailure {
        plugin: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// No runtime backend is attached to the bridge
    #[error("Runtime bridge unavailable: {message}")]
    BridgeUnavailable { message: String },

    /// The runtime backend reported a failure
    #[error("Runtime bridge error during {operation}: {message}")]
    Bridge { operation: String, message: String },

    /// Mod project generation errors
    #[error("Generation failed: {message}")]
    Generation {
        message: String,
        context: HashMap<String, String>,
    },

    /// IO errors
    #[error("IO operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StsmError {
    /// Create an invalid argument error naming the offending argument
    pub fn invalid_argument_named<S: Into<String>, A: Into<String>>(message: S, argument: A) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            argument: Some(argument.into()),
        }
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(kind: &'static str, name: S) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a load failure without an underlying source
    pub fn load_failure<P: Into<String>, M: Into<String>>(plugin: P, message: M) -> Self {
        Self::LoadFailure {
            plugin: plugin.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a load failure wrapping the error raised by the unit
    pub fn load_failure_with_source<P, M, E>(plugin: P, message: M, source: E) -> Self
    where
        P: Into<String>,
        M: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::LoadFailure {
            plugin: plugin.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error for a specific key
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn bridge_unavailable<S: Into<String>>(message: S) -> Self {
        Self::BridgeUnavailable {
            message: message.into(),
        }
    }

    pub fn bridge<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::Bridge {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a generation error
    pub fn generation<S: Into<String>>(message: S) -> Self {
        Self::Generation {
            message: message.into(),
            context: HashMap::new(),
        }
    }

    /// Add context to a generation error
    pub fn with_context<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        if let Self::Generation { ref mut context, .. } = self {
            context.insert(key.into(), value.into());
        }
        self
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(operation: S, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::NotFound { .. } => "not_found",
            Self::LoadFailure { .. } => "load_failure",
            Self::Configuration { .. } => "configuration",
            Self::BridgeUnavailable { .. } => "bridge_unavailable",
            Self::Bridge { .. } => "bridge",
            Self::Generation { .. } => "generation",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, StsmError>;

impl From<std::io::Error> for StsmError {
    fn from(err: std::io::Error) -> Self {
        Self::io("io_operation", err)
    }
}

impl From<serde_json::Error> for StsmError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

impl From<serde_yaml::Error> for StsmError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}

impl From<anyhow::Error> for StsmError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = StsmError::not_found("symbol", "tests.missing");
        assert!(err.is_not_found());
        assert_eq!(err.category(), "not_found");
        assert_eq!(err.to_string(), "symbol not found: tests.missing");
    }

    #[test]
    fn test_generation_context() {
        let err = StsmError::generation("bad card")
            .with_context("card_id", "buddy:Strike")
            .with_context("field", "rarity");

        if let StsmError::Generation { context, .. } = err {
            assert_eq!(context.get("card_id"), Some(&"buddy:Strike".to_string()));
            assert_eq!(context.get("field"), Some(&"rarity".to_string()));
        } else {
            panic!("Expected generation error");
        }
    }

    #[test]
    fn test_context_ignored_for_other_kinds() {
        let err = StsmError::configuration("oops").with_context("k", "v");
        assert!(matches!(err, StsmError::Configuration { .. }));
    }

    #[test]
    fn test_load_failure_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "truncated");
        let err = StsmError::load_failure_with_source("cards", "unit failed to initialize", io);
        assert_eq!(err.category(), "load_failure");
        assert!(std::error::Error::source(&err).is_some());
    }
}
