//! Small shared helpers.

pub mod time;

pub use time::{now_millis, remaining_secs};
