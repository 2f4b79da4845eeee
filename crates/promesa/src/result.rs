//! Result and error types for Promesa.

use thiserror::Error;

/// Result type for Promesa operations
pub type PromesaResult<T> = Result<T, PromesaError>;

/// Errors that can occur in Promesa
#[derive(Debug, Error)]
pub enum PromesaError {
    /// Unknown engine selector, rejected before any resource is acquired
    #[error("Unsupported browser: {name}")]
    UnsupportedEngine {
        /// Selector that failed to parse
        name: String,
    },

    /// Browser launch failure. Fatal: the test environment is broken,
    /// this is never retried.
    #[error("Failed to launch {engine}: {message}")]
    BrowserLaunch {
        /// Engine that failed to launch
        engine: String,
        /// Cause (timeout, missing binary, or driver error)
        message: String,
    },

    /// Operation attempted in the wrong factory state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Browser context error
    #[error("Context error: {message}")]
    Context {
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Script evaluation error
    #[error("Evaluation failed: {message}")]
    Evaluation {
        /// Error message
        message: String,
    },

    /// Request interception error
    #[error("Route error: {message}")]
    Route {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_engine_display() {
        let err = PromesaError::UnsupportedEngine {
            name: "safari".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported browser: safari");
    }

    #[test]
    fn test_browser_launch_identifies_engine() {
        let err = PromesaError::BrowserLaunch {
            engine: "chromium".to_string(),
            message: "binary not found".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("chromium"));
        assert!(text.contains("binary not found"));
    }

    #[test]
    fn test_timeout_display() {
        let err = PromesaError::Timeout { ms: 5000 };
        assert_eq!(err.to_string(), "Operation timed out after 5000ms");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PromesaError = io.into();
        assert!(matches!(err, PromesaError::Io(_)));
    }
}
