use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request to {url} aborted after {timeout:?} timeout")]
    Timeout { url: String, timeout: Duration },

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True when the request was cancelled by the fetch deadline.
    pub fn is_timeout(&self) -> bool {
        match self {
            AppError::Timeout { .. } => true,
            AppError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Short classification used in logs and error emails.
    pub fn kind(&self) -> &'static str {
        if self.is_timeout() {
            return "timeout";
        }
        match self {
            AppError::Http(_) | AppError::Transport(_) => "network",
            AppError::Config(_) => "configuration",
            AppError::Notification(_) => "notification",
            AppError::Io(_) => "io",
            AppError::Timeout { .. } | AppError::Internal(_) => "internal",
        }
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
