//! Error taxonomy shared by the API client, the page controller and the orchestrator.
//!
//! CLI/TUI edges wrap these in `anyhow` with context; everything below them returns
//! [`AppError`] so callers can tell user mistakes from server failures.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    /// Rejected client-side; no request was sent.
    #[error("{0}")]
    Validation(String),

    /// Transport failure, non-2xx status, or `success: false` from the server.
    #[error("API error: {message}")]
    Api { message: String },

    #[error("unknown page: {0}")]
    UnknownPage(String),

    #[error("a workflow run is already in progress")]
    WorkflowAlreadyRunning,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn api(message: impl Into<String>) -> Self {
        AppError::Api {
            message: message.into(),
        }
    }

    /// Message suitable for a status line, without the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_displays_bare_message() {
        let err = AppError::validation("prompt required");
        assert_eq!(err.to_string(), "prompt required");
    }

    #[test]
    fn api_error_keeps_server_text() {
        let err = AppError::api("quota exceeded");
        assert_eq!(err.to_string(), "API error: quota exceeded");
        assert_eq!(err.user_message(), "quota exceeded");
    }
}
