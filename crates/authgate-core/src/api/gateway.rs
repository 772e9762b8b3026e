//! Login, verify and logout calls.

use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::ErrorRecord;
use crate::models::{Credentials, Token, User};

use super::{ApiClient, ApiEnvelope, TransportError};

const LOGIN_PATH: &str = "auth/login";
const VERIFY_PATH: &str = "auth/verify";
const LOGOUT_PATH: &str = "auth/logout";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginData {
    pub user: User,
    pub token: Token,
}

/// Verify never issues a new token, only confirms the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyData {
    pub user: User,
}

/// Auth endpoints. Every failure comes back as a normalized `ErrorRecord`.
#[derive(Clone)]
pub struct AuthGateway {
    client: ApiClient,
}

impl AuthGateway {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The shared transport, for features that need authenticated calls.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginData, ErrorRecord> {
        let body = credentials.normalized();
        debug!(username = %body.username, remember_me = body.remember_me, "Sending login request");

        let result = self
            .client
            .post::<ApiEnvelope<LoginData>, _>(LOGIN_PATH, &body)
            .await
            .and_then(ApiEnvelope::into_data);

        match result {
            Ok(data) => {
                info!(username = %data.user.username, "Login succeeded");
                Ok(data)
            }
            Err(e) => {
                let record = ErrorRecord::from(e);
                warn!(kind = %record.kind, code = ?record.code, "Login failed");
                Err(record)
            }
        }
    }

    /// Confirm the stored token with the server. The token is attached by
    /// the transport, so nothing is sent when none is stored.
    pub async fn verify(&self) -> Result<VerifyData, ErrorRecord> {
        let result = self
            .client
            .get::<ApiEnvelope<VerifyData>>(VERIFY_PATH)
            .await
            .and_then(ApiEnvelope::into_data);

        match result {
            Ok(data) => {
                debug!(username = %data.user.username, "Token verified");
                Ok(data)
            }
            Err(e) => {
                let record = ErrorRecord::from(e);
                warn!(kind = %record.kind, code = ?record.code, "Token verification failed");
                Err(record)
            }
        }
    }

    /// Tell the server the session is over.
    ///
    /// The request (and its bearer header) is built before returning, so the
    /// caller may clear local storage immediately. The returned handle can
    /// be awaited or dropped; failures are only logged. Outside a Tokio
    /// runtime nothing is sent and `None` comes back.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        Self::dispatch_logout(self.logout_request())
    }

    /// Build the logout request with the currently stored token attached.
    pub fn logout_request(&self) -> RequestBuilder {
        self.client.request(Method::POST, LOGOUT_PATH)
    }

    /// Send a prepared logout request in the background.
    pub fn dispatch_logout(request: RequestBuilder) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available, skipping server-side logout");
            return None;
        };

        Some(runtime.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!("Server-side logout acknowledged");
                }
                Ok(response) => {
                    warn!(status = %response.status(), "Server-side logout rejected");
                }
                Err(e) => {
                    warn!(error = %TransportError::from(e), "Server-side logout failed");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockito::Matcher;
    use serde_json::json;

    use crate::auth::TokenStore;
    use crate::error::{codes, ErrorType};
    use crate::test_support::{error_body, login_body, sample_token, verify_body};

    fn gateway_for(base_url: String, tokens: TokenStore) -> AuthGateway {
        let client = ApiClient::new(base_url, Duration::from_secs(5), tokens).unwrap();
        AuthGateway::new(client)
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/auth/login")
            .match_body(Matcher::Json(json!({
                "username": "user@example.com",
                "password": "password123",
                "rememberMe": true
            })))
            .with_status(200)
            .with_body(login_body("tok-1"))
            .create_async()
            .await;

        let gateway = gateway_for(format!("{}/api", server.url()), TokenStore::in_memory());
        let creds = Credentials::new("user@example.com", "password123").remember(true);
        let data = gateway.login(&creds).await.unwrap();

        assert_eq!(data.user.username, "user@example.com");
        assert_eq!(data.token.access_token, "tok-1");
        assert_eq!(data.token.expires_in, 3600);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/auth/login")
            .with_status(401)
            .with_body(error_body(codes::INVALID_CREDENTIALS, "wrong password"))
            .create_async()
            .await;

        let gateway = gateway_for(format!("{}/api", server.url()), TokenStore::in_memory());
        let err = gateway
            .login(&Credentials::new("user@example.com", "wrongpass"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorType::Auth);
        assert_eq!(err.code.as_deref(), Some(codes::INVALID_CREDENTIALS));
    }

    #[tokio::test]
    async fn test_login_unreachable_server_is_network() {
        let gateway = gateway_for("http://127.0.0.1:1/api".to_string(), TokenStore::in_memory());
        let err = gateway
            .login(&Credentials::new("user@example.com", "password123"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorType::Network);
        assert_eq!(err.code.as_deref(), Some(codes::NETWORK_ERROR));
    }

    #[tokio::test]
    async fn test_verify_sends_stored_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/auth/verify")
            .match_header("authorization", "Bearer stored")
            .with_status(200)
            .with_body(verify_body())
            .create_async()
            .await;

        let tokens = TokenStore::in_memory();
        tokens.save(&sample_token("stored", 3600), true).unwrap();

        let gateway = gateway_for(format!("{}/api", server.url()), tokens);
        let data = gateway.verify().await.unwrap();
        assert_eq!(data.user.username, "user@example.com");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_verify_invalid_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/auth/verify")
            .with_status(401)
            .with_body(error_body(codes::INVALID_TOKEN, "invalid"))
            .create_async()
            .await;

        let gateway = gateway_for(format!("{}/api", server.url()), TokenStore::in_memory());
        let err = gateway.verify().await.unwrap_err();
        assert_eq!(err.kind, ErrorType::Auth);
        assert_eq!(err.code.as_deref(), Some(codes::INVALID_TOKEN));
    }

    #[tokio::test]
    async fn test_logout_captures_token_before_clear() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/auth/logout")
            .match_header("authorization", "Bearer bye")
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let tokens = TokenStore::in_memory();
        tokens.save(&sample_token("bye", 3600), false).unwrap();

        let gateway = gateway_for(format!("{}/api", server.url()), tokens.clone());
        let handle = gateway.logout().unwrap();
        tokens.clear();
        handle.await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_logout_failure_is_swallowed() {
        let gateway = gateway_for("http://127.0.0.1:1/api".to_string(), TokenStore::in_memory());
        // Completes without panicking even though nothing is listening
        gateway.logout().unwrap().await.unwrap();
    }

    #[test]
    fn test_logout_without_runtime_skips_remote_call() {
        let gateway = gateway_for("http://127.0.0.1:1/api".to_string(), TokenStore::in_memory());
        assert!(gateway.logout().is_none());
    }

    #[tokio::test]
    async fn test_verify_times_out_when_server_stalls() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept the connection and hold it open without ever answering
        let stall = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let tokens = TokenStore::in_memory();
        tokens.save(&sample_token("slow", 3600), false).unwrap();
        let client =
            ApiClient::new(format!("http://{}/api", addr), Duration::from_millis(300), tokens).unwrap();
        let err = AuthGateway::new(client).verify().await.unwrap_err();

        assert_eq!(err.kind, ErrorType::Timeout);
        assert_eq!(err.code.as_deref(), Some(codes::TIMEOUT));
        stall.abort();
    }
}
