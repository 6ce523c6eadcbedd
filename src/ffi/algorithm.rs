//! FFI functions for framework setup and algorithm handles.

use super::types::{report, set_last_error, ProgressCallback, RdxStatus};
use crate::algorithm::{AlgorithmEvent, AlgorithmInstance, AlgorithmManager, EventMask};
use crate::config::{bootstrap, init_logging, FrameworkConfig};
use crate::error::FrameworkResult;
use std::ffi::{c_char, c_void, CStr, CString};

/// Opaque handle to an algorithm instance.
pub type AlgorithmHandle = *mut AlgorithmInstance;

/// Borrow a C string as UTF-8.
unsafe fn str_arg<'a>(ptr: *const c_char) -> Result<&'a str, RdxStatus> {
    if ptr.is_null() {
        return Err(RdxStatus::NullPointer);
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| {
        set_last_error("argument is not valid UTF-8");
        RdxStatus::InvalidUtf8
    })
}

fn status_of(result: FrameworkResult<()>) -> RdxStatus {
    match result {
        Ok(()) => RdxStatus::Ok,
        Err(err) => report(&err),
    }
}

/// Install the default `tracing` subscriber. Safe to call repeatedly.
#[no_mangle]
pub extern "C" fn rdx_init_logging() -> RdxStatus {
    init_logging();
    RdxStatus::Ok
}

/// Bootstrap the framework from a JSON configuration (null = defaults).
///
/// # Safety
/// `config_json` must be null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn rdx_framework_init(config_json: *const c_char) -> RdxStatus {
    let config = if config_json.is_null() {
        FrameworkConfig::default()
    } else {
        let text = match str_arg(config_json) {
            Ok(t) => t,
            Err(status) => return status,
        };
        match FrameworkConfig::from_json(text) {
            Ok(c) => c,
            Err(err) => return report(&err),
        }
    };
    status_of(bootstrap(&config).map(|_| ()))
}

/// Create an initialized managed algorithm.
///
/// `version <= 0` selects the latest registered version.
///
/// # Safety
/// `name` must be a valid C string and `out_handle` a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn rdx_algorithm_create(
    name: *const c_char,
    version: i32,
    out_handle: *mut AlgorithmHandle,
) -> RdxStatus {
    if out_handle.is_null() {
        return RdxStatus::NullPointer;
    }
    let name = match str_arg(name) {
        Ok(n) => n,
        Err(status) => return status,
    };
    let version = u32::try_from(version).ok().filter(|v| *v > 0);

    match AlgorithmManager::instance().and_then(|m| m.create(name, version)) {
        Ok(alg) => {
            *out_handle = Box::into_raw(Box::new(alg));
            RdxStatus::Ok
        }
        Err(err) => report(&err),
    }
}

/// Free an algorithm handle.
///
/// # Safety
/// Handle must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn rdx_algorithm_free(handle: AlgorithmHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Set a property from its string form.
///
/// A value the validator rejects is stored and reported as
/// `ValidationFailed`.
///
/// # Safety
/// Handle and strings must be valid.
#[no_mangle]
pub unsafe extern "C" fn rdx_algorithm_set_property(
    handle: AlgorithmHandle,
    name: *const c_char,
    value: *const c_char,
) -> RdxStatus {
    if handle.is_null() {
        return RdxStatus::NullPointer;
    }
    let (name, value) = match (str_arg(name), str_arg(value)) {
        (Ok(n), Ok(v)) => (n, v),
        (Err(status), _) | (_, Err(status)) => return status,
    };

    match (*handle).set_property_value(name, value) {
        Ok(None) => RdxStatus::Ok,
        Ok(Some(reason)) => {
            set_last_error(format!("{name}: {reason}"));
            RdxStatus::ValidationFailed
        }
        Err(err) => report(&err),
    }
}

/// Get a property's string form into a buffer.
///
/// `out_len` receives the full length (without terminator). If the
/// buffer is too small the text is truncated and `BufferTooSmall` is
/// returned.
///
/// # Safety
/// Handle, name and buffer must be valid; buffer must hold `buffer_len`
/// bytes.
#[no_mangle]
pub unsafe extern "C" fn rdx_algorithm_get_property(
    handle: AlgorithmHandle,
    name: *const c_char,
    buffer: *mut c_char,
    buffer_len: usize,
    out_len: *mut usize,
) -> RdxStatus {
    if handle.is_null() || buffer.is_null() || out_len.is_null() {
        return RdxStatus::NullPointer;
    }
    if buffer_len == 0 {
        set_last_error("buffer_len must leave room for the terminator");
        return RdxStatus::InvalidArgument;
    }
    let name = match str_arg(name) {
        Ok(n) => n,
        Err(status) => return status,
    };

    let text = match (*handle).get_property_value(name) {
        Ok(t) => t,
        Err(err) => return report(&err),
    };

    let bytes = text.as_bytes();
    let copy_len = bytes.len().min(buffer_len - 1);
    std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer as *mut u8, copy_len);
    *buffer.add(copy_len) = 0;
    *out_len = bytes.len();

    if copy_len < bytes.len() {
        RdxStatus::BufferTooSmall
    } else {
        RdxStatus::Ok
    }
}

/// Execute synchronously on the calling thread. A panic inside the
/// algorithm is reported as `ExecutionFailed`.
///
/// # Safety
/// Handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn rdx_algorithm_execute(handle: AlgorithmHandle) -> RdxStatus {
    if handle.is_null() {
        return RdxStatus::NullPointer;
    }
    status_of((*handle).execute_catching_panics())
}

/// Request cancellation. Safe to call from any thread while the
/// algorithm runs.
///
/// # Safety
/// Handle must be valid.
#[no_mangle]
pub unsafe extern "C" fn rdx_algorithm_cancel(handle: AlgorithmHandle) -> RdxStatus {
    if handle.is_null() {
        return RdxStatus::NullPointer;
    }
    (*handle).cancel();
    RdxStatus::Ok
}

/// Register a progress callback.
///
/// # Safety
/// Handle must be valid. `user_data` must stay valid while the algorithm
/// lives, and the callback must tolerate being called from worker threads.
#[no_mangle]
pub unsafe extern "C" fn rdx_algorithm_observe_progress(
    handle: AlgorithmHandle,
    callback: ProgressCallback,
    user_data: *mut c_void,
) -> RdxStatus {
    if handle.is_null() {
        return RdxStatus::NullPointer;
    }

    let user_data = user_data as usize; // Convert to usize for Send
    (*handle).observe(EventMask::PROGRESS, move |n| {
        if let AlgorithmEvent::Progress { fraction, message } = &n.event {
            let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
            callback(user_data as *mut c_void, *fraction, message.as_ptr());
        }
    });
    RdxStatus::Ok
}
