//! Domain-specific error types for task runs.
//!
//! Typed errors enable callers to match on specific failure modes
//! rather than parsing error message strings. Every error is terminal
//! for the current task; nothing is retried automatically.

use std::time::Duration;

/// Errors that can occur while running a sandboxed task.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Required credentials or configuration values are missing.
    /// Raised before any remote resource is allocated.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The sandbox could not be created. Surfaced verbatim, no retry.
    #[error("Sandbox provisioning failed: {message}")]
    Provisioning { message: String },

    /// The remote execution exceeded the configured timeout.
    #[error("Task execution timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The injected agent program exited non-zero.
    #[error("Agent exited with status {exit_code}: {stderr}")]
    Execution { exit_code: i32, stderr: String },
}

impl RunnerError {
    /// Creates a `Configuration` error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a `Provisioning` error.
    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::Provisioning {
            message: message.into(),
        }
    }

    /// Creates a `Timeout` error from a `Duration`.
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout {
            timeout_secs: duration.as_secs(),
        }
    }

    /// Creates an `Execution` error carrying the captured stderr.
    pub fn execution(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::Execution {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Returns true if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns true if this is a provisioning error.
    pub fn is_provisioning(&self) -> bool {
        matches!(self, Self::Provisioning { .. })
    }

    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if the remote execution itself failed, whether by
    /// exiting non-zero or by exceeding the timeout.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Execution { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error() {
        let err = RunnerError::configuration("E2B_API_KEY not set");
        assert!(err.is_configuration());
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "Configuration error: E2B_API_KEY not set");
    }

    #[test]
    fn test_provisioning_error() {
        let err = RunnerError::provisioning("template not found");
        assert!(err.is_provisioning());
        assert!(!err.is_execution_failure());
        assert_eq!(
            err.to_string(),
            "Sandbox provisioning failed: template not found"
        );
    }

    #[test]
    fn test_timeout_error() {
        let err = RunnerError::timeout(Duration::from_secs(120));
        assert!(err.is_timeout());
        assert!(err.is_execution_failure());
        assert_eq!(
            err.to_string(),
            "Task execution timed out after 120 seconds"
        );
    }

    #[test]
    fn test_execution_error() {
        let err = RunnerError::execution(1, "boom");
        assert!(err.is_execution_failure());
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "Agent exited with status 1: boom");
    }

    #[test]
    fn test_error_variants_are_distinct() {
        let config = RunnerError::configuration("test");
        let provision = RunnerError::provisioning("test");
        let timeout = RunnerError::timeout(Duration::from_secs(5));
        let execution = RunnerError::execution(2, "test");

        assert!(config.is_configuration());
        assert!(!config.is_provisioning());

        assert!(provision.is_provisioning());
        assert!(!provision.is_configuration());

        assert!(timeout.is_timeout());
        assert!(!execution.is_timeout());
        assert!(execution.is_execution_failure());
    }
}
