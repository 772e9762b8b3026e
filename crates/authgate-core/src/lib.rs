//! Core library for authgate.
//!
//! Owns everything needed to keep a client-held authentication session:
//!
//! - `models`: wire types (`User`, `Token`, `Credentials`)
//! - `auth`: storage backends, `TokenStore`, `SessionState`
//! - `api`: the HTTP transport and `AuthGateway`
//! - `error`: the closed `ErrorRecord` taxonomy and `ErrorNormalizer`
//! - `routes`: the route table and `RouteGuard`
//! - `manager`: `SessionManager`, which ties the pieces together

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod routes;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use api::{ApiClient, AuthGateway};
pub use auth::{Session, SessionSnapshot, SessionState, TokenStore};
pub use config::Config;
pub use error::{ErrorNormalizer, ErrorRecord, ErrorType};
pub use manager::SessionManager;
pub use models::{Credentials, Token, User, UserRole};
pub use routes::{Navigation, RouteGuard, RouteTable};
