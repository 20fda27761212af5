use thiserror::Error;

/// Failure reported by a page source. The engine never retries on its own;
/// the edge simply becomes loadable again.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("source unavailable: {message}")]
    Unavailable { message: String },

    #[error("{message}")]
    Other { message: String },
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        FetchError::Network {
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        FetchError::Other {
            message: message.into(),
        }
    }

    /// Whether scrolling back into the sentinel is likely to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network { .. } | FetchError::Unavailable { .. } => true,
            FetchError::Backend { status, .. } => *status >= 500 || *status == 429,
            FetchError::Other { .. } => false,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            FetchError::Network { message } => format!("Network error: {}", message),
            FetchError::Backend { status, message } => {
                format!("Server error ({}): {}", status, message)
            }
            FetchError::Unavailable { message } => format!("Unavailable: {}", message),
            FetchError::Other { message } => format!("Error: {}", message),
        }
    }

    pub fn short_message(&self) -> String {
        match self {
            FetchError::Network { .. } => "Network error".to_string(),
            FetchError::Backend { status, .. } => format!("Server error ({})", status),
            FetchError::Unavailable { .. } => "Source unavailable".to_string(),
            FetchError::Other { .. } => "Error occurred".to_string(),
        }
    }
}
