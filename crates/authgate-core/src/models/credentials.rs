use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Username length bounds, measured after trimming.
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;

const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Username is required")]
    UsernameRequired,

    #[error("Username must be at least {} characters", MIN_USERNAME_LENGTH)]
    UsernameTooShort,

    #[error("Username must be at most {} characters", MAX_USERNAME_LENGTH)]
    UsernameTooLong,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("Password must be at most {} characters", MAX_PASSWORD_LENGTH)]
    PasswordTooLong,
}

/// Login input. Lives only for the duration of a login call.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember_me: false,
        }
    }

    pub fn remember(mut self, remember_me: bool) -> Self {
        self.remember_me = remember_me;
        self
    }

    /// Check field rules before anything goes over the wire.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        let username = self.username.trim();
        let username_len = username.chars().count();
        if username.is_empty() {
            return Err(CredentialsError::UsernameRequired);
        }
        if username_len < MIN_USERNAME_LENGTH {
            return Err(CredentialsError::UsernameTooShort);
        }
        if username_len > MAX_USERNAME_LENGTH {
            return Err(CredentialsError::UsernameTooLong);
        }

        let password_len = self.password.chars().count();
        if password_len == 0 {
            return Err(CredentialsError::PasswordRequired);
        }
        if password_len < MIN_PASSWORD_LENGTH {
            return Err(CredentialsError::PasswordTooShort);
        }
        if password_len > MAX_PASSWORD_LENGTH {
            return Err(CredentialsError::PasswordTooLong);
        }
        Ok(())
    }

    /// Copy with the username trimmed, as sent to the server.
    pub fn normalized(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            remember_me: self.remember_me,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_valid_credentials() {
        assert!(Credentials::new("user@example.com", "password123").validate().is_ok());
        assert!(Credentials::new("  abc  ", "123456").validate().is_ok());
    }

    #[test]
    fn test_validate_username_rules() {
        assert_eq!(
            Credentials::new("   ", "password123").validate(),
            Err(CredentialsError::UsernameRequired)
        );
        assert_eq!(
            Credentials::new("ab", "password123").validate(),
            Err(CredentialsError::UsernameTooShort)
        );
        assert_eq!(
            Credentials::new("a".repeat(51), "password123").validate(),
            Err(CredentialsError::UsernameTooLong)
        );
    }

    #[test]
    fn test_validate_password_rules() {
        assert_eq!(
            Credentials::new("user", "").validate(),
            Err(CredentialsError::PasswordRequired)
        );
        assert_eq!(
            Credentials::new("user", "12345").validate(),
            Err(CredentialsError::PasswordTooShort)
        );
        assert_eq!(
            Credentials::new("user", "x".repeat(101)).validate(),
            Err(CredentialsError::PasswordTooLong)
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("user", "hunter22").remember(true);
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_serialize_wire_shape() {
        let creds = Credentials::new(" user@example.com ", "password123").remember(true).normalized();
        let json = serde_json::to_value(&creds).expect("Failed to serialize credentials");
        assert_eq!(json["username"], "user@example.com");
        assert_eq!(json["password"], "password123");
        assert_eq!(json["rememberMe"], true);
    }
}
