//! FFI (Foreign Function Interface) layer for C bindings.
//!
//! Every function returns an [`RdxStatus`]; on failure the message is
//! available from [`rdx_last_error_message`] on the same thread.

pub mod algorithm;
pub mod runtime;
pub mod types;

pub use algorithm::*;
pub use runtime::*;
pub use types::*;
