//! Asynchronous execution support.

pub mod executor;

pub use executor::{AsyncExecutor, Completion, RuntimeConfig};
