//! Fixtures shared by unit tests.

use serde_json::json;

use crate::models::{Token, User};

pub fn sample_user() -> User {
    serde_json::from_value(user_json()).expect("fixture user is valid")
}

pub fn user_json() -> serde_json::Value {
    json!({
        "id": 1,
        "username": "user@example.com",
        "email": "user@example.com",
        "fullName": "Test User",
        "department": "Engineering",
        "isActive": true
    })
}

pub fn sample_token(access_token: &str, expires_in: i64) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: Some(format!("refresh-{}", access_token)),
        expires_in,
        token_type: "Bearer".to_string(),
    }
}

/// Successful `/auth/login` body issuing `access_token` for one hour.
pub fn login_body(access_token: &str) -> String {
    json!({
        "success": true,
        "data": {
            "user": user_json(),
            "token": {
                "accessToken": access_token,
                "refreshToken": format!("refresh-{}", access_token),
                "expiresIn": 3600,
                "tokenType": "Bearer"
            }
        }
    })
    .to_string()
}

pub fn verify_body() -> String {
    json!({ "success": true, "data": { "user": user_json() } }).to_string()
}

pub fn error_body(code: &str, message: &str) -> String {
    json!({ "success": false, "error": { "code": code, "message": message } }).to_string()
}
