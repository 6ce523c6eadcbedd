//! C-compatible type definitions for FFI.

use super::algorithm::AlgorithmHandle;
use crate::error::FrameworkError;
use std::cell::RefCell;
use std::error::Error;
use std::ffi::{c_char, c_void, CString};

/// Result status codes for FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RdxStatus {
    /// Operation succeeded.
    Ok = 0,
    /// Null pointer was passed.
    NullPointer = 1,
    /// Invalid argument.
    InvalidArgument = 2,
    /// Invalid UTF-8 string.
    InvalidUtf8 = 3,
    /// Name or key not found.
    NotFound = 4,
    /// Name or factory key already taken.
    Duplicate = 5,
    /// Value of the wrong type.
    TypeMismatch = 6,
    /// Text could not be parsed.
    ParseError = 7,
    /// One or more properties are invalid.
    ValidationFailed = 8,
    /// Algorithm used before initialization.
    NotInitialized = 9,
    /// The algorithm failed while running.
    ExecutionFailed = 10,
    /// Operation was cancelled.
    Cancelled = 11,
    /// A service has been shut down.
    ShutDown = 12,
    /// Output buffer too small.
    BufferTooSmall = 13,
    /// Runtime error.
    RuntimeError = 14,
}

impl From<&FrameworkError> for RdxStatus {
    fn from(err: &FrameworkError) -> Self {
        match err {
            FrameworkError::NotFound { .. } => RdxStatus::NotFound,
            FrameworkError::DuplicateName { .. } | FrameworkError::ExistingFactory { .. } => RdxStatus::Duplicate,
            FrameworkError::TypeMismatch { .. } => RdxStatus::TypeMismatch,
            FrameworkError::Parse { .. } | FrameworkError::Config(_) => RdxStatus::ParseError,
            FrameworkError::Validation(_) => RdxStatus::ValidationFailed,
            FrameworkError::Initialization { .. } | FrameworkError::NotInitialized { .. } => {
                RdxStatus::NotInitialized
            }
            FrameworkError::Execution { .. } => RdxStatus::ExecutionFailed,
            FrameworkError::Cancelled { .. } => RdxStatus::Cancelled,
            FrameworkError::ShutDown { .. } => RdxStatus::ShutDown,
            FrameworkError::Runtime(_) => RdxStatus::RuntimeError,
        }
    }
}

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Record `message` as this thread's last error.
pub(crate) fn set_last_error(message: impl Into<String>) {
    let text = message.into().replace('\0', " ");
    LAST_ERROR.with(|slot| *slot.borrow_mut() = CString::new(text).ok());
}

/// Record `err` and return its status.
pub(crate) fn report(err: &FrameworkError) -> RdxStatus {
    // Append each cause not already part of the message.
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    set_last_error(message);
    RdxStatus::from(err)
}

/// Message of the last failed call on this thread, or null.
///
/// The pointer stays valid until the next failing call on the same thread.
#[no_mangle]
pub extern "C" fn rdx_last_error_message() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(std::ptr::null(), |s| s.as_ptr()))
}

/// Callback for progress updates.
///
/// # Arguments
/// * `user_data` - User-provided context pointer
/// * `fraction` - Overall progress in `[0, 1]`
/// * `message` - C string, valid only during the call
pub type ProgressCallback = extern "C" fn(user_data: *mut c_void, fraction: f64, message: *const c_char);

/// Callback for asynchronous completion.
///
/// # Arguments
/// * `user_data` - User-provided context pointer
/// * `status` - Result of the execution
/// * `algorithm` - The executed algorithm; ownership returns to the caller
pub type CompletionCallback = extern "C" fn(user_data: *mut c_void, status: RdxStatus, algorithm: AlgorithmHandle);
