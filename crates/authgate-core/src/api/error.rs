use thiserror::Error;

/// Transport outcome as seen at the HTTP boundary. Every `reqwest` failure
/// is converted into one of these before anything else looks at it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {}", truncate_body(.body))]
    HttpStatus { status: u16, body: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 2xx response whose envelope reported `success: false`
    #[error("Request rejected: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        code: Option<String>,
        message: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}

impl TransportError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        TransportError::HttpStatus {
            status: status.as_u16(),
            body: body.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if let Some(status) = err.status() {
            TransportError::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.into())
    }
}
