//! The user-facing error taxonomy and the normalizer that produces it.
//!
//! Every failure that leaves the auth layer is an [`ErrorRecord`]: a
//! display message, a closed [`ErrorType`], and an optional machine code.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{ApiError, TransportError};
use crate::models::CredentialsError;

// ============================================================================
// Codes and messages
// ============================================================================

pub mod codes {
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const TOO_MANY_REQUESTS: &str = "TOO_MANY_REQUESTS";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
    pub const SERVICE_UNAVAILABLE: &str = "SERVICE_UNAVAILABLE";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const UNKNOWN: &str = "UNKNOWN";
}

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred, please try again later";

/// Display text for the codes the UI knows about.
pub fn message_for_code(code: &str) -> Option<&'static str> {
    let message = match code {
        codes::INVALID_CREDENTIALS => "Incorrect username or password, please try again",
        codes::TOO_MANY_REQUESTS => "Too many attempts, please try again later",
        codes::INTERNAL_SERVER_ERROR => "System error, please try again later",
        codes::SERVICE_UNAVAILABLE => "The system is under maintenance, please try again later",
        codes::NETWORK_ERROR => "Connection failed, please check your network and try again",
        codes::TIMEOUT => "The request timed out, please try again later",
        codes::INVALID_REQUEST => "The request was malformed",
        codes::TOKEN_EXPIRED => "Your session has expired, please log in again",
        codes::INVALID_TOKEN => "Your session is no longer valid",
        _ => return None,
    };
    Some(message)
}

// ============================================================================
// ErrorRecord
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Network,
    Auth,
    Validation,
    Timeout,
    Server,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Network => "network",
            ErrorType::Auth => "auth",
            ErrorType::Validation => "validation",
            ErrorType::Timeout => "timeout",
            ErrorType::Server => "server",
            ErrorType::Unknown => "unknown",
        }
    }

    /// Classify by HTTP status, independent of the error code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorType::Auth,
            400 | 422 => ErrorType::Validation,
            s if s >= 500 => ErrorType::Server,
            _ => ErrorType::Unknown,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized failure, the only error shape the UI ever sees.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[error("{message}")]
pub struct ErrorRecord {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorRecord {
    pub fn new(kind: ErrorType, message: impl Into<String>, code: Option<&str>) -> Self {
        Self {
            message: message.into(),
            kind,
            code: code.map(str::to_string),
        }
    }

    /// Record for a code from the message table.
    fn from_code(kind: ErrorType, code: &str) -> Self {
        Self::new(kind, message_for_code(code).unwrap_or(UNKNOWN_ERROR_MESSAGE), Some(code))
    }

    pub fn network() -> Self {
        Self::from_code(ErrorType::Network, codes::NETWORK_ERROR)
    }

    pub fn timeout() -> Self {
        Self::from_code(ErrorType::Timeout, codes::TIMEOUT)
    }

    pub fn unknown() -> Self {
        Self::new(ErrorType::Unknown, UNKNOWN_ERROR_MESSAGE, None)
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorType::Auth
    }
}

// ============================================================================
// Normalizer
// ============================================================================

/// Error body shape shared by every endpoint: `{"error": {"code", "message"}}`
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct ErrorNormalizer;

impl ErrorNormalizer {
    /// Normalize any caught failure.
    ///
    /// Known error types anywhere in the chain are normalized by kind; any
    /// other error is treated as a plain application error.
    pub fn normalize(err: &anyhow::Error) -> ErrorRecord {
        for cause in err.chain() {
            if let Some(record) = cause.downcast_ref::<ErrorRecord>() {
                return record.clone();
            }
            if let Some(api) = cause.downcast_ref::<ApiError>() {
                return Self::normalize_api(api);
            }
            if let Some(transport) = cause.downcast_ref::<TransportError>() {
                return Self::normalize_transport(transport);
            }
            if let Some(invalid) = cause.downcast_ref::<CredentialsError>() {
                return Self::validation(invalid);
            }
        }
        Self::from_message(&err.to_string())
    }

    pub fn normalize_api(err: &ApiError) -> ErrorRecord {
        match err {
            ApiError::Transport(transport) => Self::normalize_transport(transport),
            ApiError::Rejected { code, message } => Self::resolve(
                ErrorType::Unknown,
                code.as_deref().unwrap_or(codes::UNKNOWN),
                message.as_deref(),
            ),
            ApiError::InvalidResponse(message) => Self::from_message(message),
        }
    }

    pub fn normalize_transport(err: &TransportError) -> ErrorRecord {
        match err {
            TransportError::Network(_) => ErrorRecord::network(),
            TransportError::Timeout => ErrorRecord::timeout(),
            TransportError::HttpStatus { status, body } => {
                let body: ErrorBody = serde_json::from_str::<ErrorEnvelope>(body)
                    .ok()
                    .and_then(|envelope| envelope.error)
                    .unwrap_or_default();
                let code = body
                    .code
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| Self::code_from_status(*status));
                Self::resolve(ErrorType::from_status(*status), code, body.message.as_deref())
            }
        }
    }

    /// A plain application error keeps its own message.
    pub fn from_message(message: &str) -> ErrorRecord {
        if message.trim().is_empty() {
            ErrorRecord::unknown()
        } else {
            ErrorRecord::new(ErrorType::Unknown, message, None)
        }
    }

    pub fn validation(err: &CredentialsError) -> ErrorRecord {
        ErrorRecord::new(ErrorType::Validation, err.to_string(), None)
    }

    pub fn code_from_status(status: u16) -> &'static str {
        match status {
            401 => codes::INVALID_CREDENTIALS,
            429 => codes::TOO_MANY_REQUESTS,
            500 | 502 => codes::INTERNAL_SERVER_ERROR,
            503 => codes::SERVICE_UNAVAILABLE,
            _ => codes::UNKNOWN,
        }
    }

    /// Message lookup order: code table, server message, generic text.
    fn resolve(kind: ErrorType, code: &str, server_message: Option<&str>) -> ErrorRecord {
        let message = message_for_code(code)
            .map(str::to_string)
            .or_else(|| server_message.filter(|m| !m.is_empty()).map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        ErrorRecord {
            message,
            kind,
            code: Some(code.to_string()),
        }
    }
}

impl From<ApiError> for ErrorRecord {
    fn from(err: ApiError) -> Self {
        ErrorNormalizer::normalize_api(&err)
    }
}

impl From<TransportError> for ErrorRecord {
    fn from(err: TransportError) -> Self {
        ErrorNormalizer::normalize_transport(&err)
    }
}

impl From<CredentialsError> for ErrorRecord {
    fn from(err: CredentialsError) -> Self {
        ErrorNormalizer::validation(&err)
    }
}
