use std::io;

/// Failure taxonomy for the whole pipeline. Everything bubbles up to the CLI
/// entry point unchanged; nothing in this crate retries or rolls back.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{service} API error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Upstream {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("{service} did not finish within {seconds} seconds")]
    Timeout {
        service: &'static str,
        seconds: u64,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        PipelineError::InvalidArgument(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        PipelineError::Config(message.into())
    }

    /// Wraps a reqwest transport failure (connect/timeout/decode) for a
    /// named upstream service. HTTP status errors are built at the call
    /// site instead, where the response body is available.
    pub fn transport(service: &'static str, err: reqwest::Error) -> Self {
        PipelineError::Upstream {
            service,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub fn upstream(service: &'static str, status: u16, message: impl Into<String>) -> Self {
        PipelineError::Upstream {
            service,
            status: Some(status),
            message: message.into(),
        }
    }
}
