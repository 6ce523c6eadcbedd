//! FFI functions for the asynchronous executor.

use super::algorithm::AlgorithmHandle;
use super::types::{report, CompletionCallback, RdxStatus};
use crate::runtime::{AsyncExecutor, RuntimeConfig};
use std::ffi::c_void;

/// Opaque handle to an executor.
pub type ExecutorHandle = *mut AsyncExecutor;

/// Create an executor.
///
/// # Safety
/// out_handle must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn rdx_executor_create(worker_count: usize, out_handle: *mut ExecutorHandle) -> RdxStatus {
    if out_handle.is_null() {
        return RdxStatus::NullPointer;
    }

    let config = match worker_count {
        0 => RuntimeConfig::default(),
        n => RuntimeConfig { worker_count: n },
    };

    match AsyncExecutor::new(config) {
        Ok(executor) => {
            *out_handle = Box::into_raw(Box::new(executor));
            RdxStatus::Ok
        }
        Err(err) => report(&err),
    }
}

/// Free an executor. Blocks until running executions finish.
///
/// # Safety
/// Handle must be valid or null, and must not be freed from one of its
/// own callbacks.
#[no_mangle]
pub unsafe extern "C" fn rdx_executor_free(handle: ExecutorHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Execute an algorithm asynchronously.
///
/// This function returns immediately. Ownership of `algorithm` passes to
/// the executor and comes back through `on_complete`, which runs on a
/// worker thread; the caller frees it afterwards. A panic inside the
/// algorithm is reported to `on_complete` as `ExecutionFailed`.
///
/// # Safety
/// Handles must be valid. `user_data` must remain valid until the
/// completion callback is invoked.
#[no_mangle]
pub unsafe extern "C" fn rdx_executor_run_async(
    executor: ExecutorHandle,
    algorithm: AlgorithmHandle,
    on_complete: CompletionCallback,
    user_data: *mut c_void,
) -> RdxStatus {
    if executor.is_null() || algorithm.is_null() {
        return RdxStatus::NullPointer;
    }

    let instance = *Box::from_raw(algorithm);
    let user_data = user_data as usize; // Convert to usize for Send

    (*executor).execute_with_callback(instance, move |instance, result| {
        let status = match &result {
            Ok(()) => RdxStatus::Ok,
            Err(err) => report(err),
        };
        on_complete(user_data as *mut c_void, status, Box::into_raw(Box::new(instance)));
    });

    RdxStatus::Ok
}
