use serde::{Deserialize, Serialize};

/// Token type assumed when a session is rebuilt from storage.
pub const BEARER: &str = "Bearer";

/// Access token as issued by the server. Never mutated after receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, counted from the moment of issue
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    BEARER.to_string()
}

impl Token {
    /// Token rebuilt from a persisted access token during rehydration.
    /// Storage does not keep the refresh token's pairing, so it is left out.
    pub fn rehydrated(access_token: String, remaining_secs: i64) -> Self {
        Self {
            access_token,
            refresh_token: None,
            expires_in: remaining_secs,
            token_type: BEARER.to_string(),
        }
    }

    /// Lifetime in milliseconds.
    pub fn lifetime_ms(&self) -> i64 {
        self.expires_in.saturating_mul(1000)
    }
}
