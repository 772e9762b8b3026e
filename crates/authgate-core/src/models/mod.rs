//! Data models exchanged with the auth API.
//!
//! - `User`, `UserId`, `UserRole`: the authenticated principal
//! - `Token`: server-issued access token with its lifetime
//! - `Credentials`: transient login input, never persisted

pub mod credentials;
pub mod token;
pub mod user;

pub use credentials::{Credentials, CredentialsError};
pub use token::Token;
pub use user::{User, UserId, UserRole};
