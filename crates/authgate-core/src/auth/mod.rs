//! Authentication state and token persistence.
//!
//! This module provides:
//! - `StorageBackend`: key/value persistence (`MemoryStorage`, `FileStorage`, `KeyringStorage`)
//! - `TokenStore`: decides which backend holds the token and answers expiry questions
//! - `SessionState`: the in-memory two-state session machine
//!
//! Remember-me logins go to the durable backend, all others to the ephemeral one.

pub mod session;
pub mod storage;
pub mod token_store;

pub use session::{Session, SessionSnapshot, SessionState};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, StorageBackend};
pub use token_store::TokenStore;
