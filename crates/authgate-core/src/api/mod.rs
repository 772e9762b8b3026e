//! HTTP access to the auth API.
//!
//! `ApiClient` is the shared transport: it attaches the bearer token from
//! the `TokenStore` to every outgoing request and converts transport
//! failures into `TransportError`. `AuthGateway` implements the login,
//! verify and logout calls on top of it. Other features that need
//! authenticated calls reuse `ApiClient` rather than handling tokens.

pub mod client;
pub mod error;
pub mod gateway;

pub use client::{ApiClient, ApiEnvelope};
pub use error::{ApiError, TransportError};
pub use gateway::{AuthGateway, LoginData, VerifyData};
