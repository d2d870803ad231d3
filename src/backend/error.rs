use thiserror::Error;

/// Transport-level failures from the VH3 gateway, carrying enough for the
/// use case layer to apply its user-facing taxonomy.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid response payload: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(error) => error.status().map(|status| status.as_u16()),
            ApiError::Decode(_) | ApiError::Io(_) => None,
        }
    }

    /// Server-provided message, if one came back with the error body.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
