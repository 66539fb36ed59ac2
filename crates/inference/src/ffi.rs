//! C ABI over [`Ravensaid`].
//!
//! Handles are heap-allocated `Ravensaid` values passed to C as opaque
//! pointers. `ravensaid_free` must be called exactly once per handle.
//! Passing NULL to `ravensaid_free` or `ravensaid` is a programmer error and
//! halts the process: the panic cannot unwind out of an `extern "C"` function.

use std::ffi::{c_char, c_int, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use crate::runtime::Ravensaid;
use crate::score::{score_to_code, ScoreError};

/// Load a network from `path`. Returns NULL on any failure.
///
/// # Safety
///
/// `path` must be NULL or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ravensaid_init(path: *const c_char) -> *mut Ravensaid {
    if path.is_null() {
        return ptr::null_mut();
    }
    let Ok(path) = CStr::from_ptr(path).to_str() else {
        return ptr::null_mut();
    };

    match panic::catch_unwind(|| Ravensaid::load(path)) {
        Ok(Ok(handle)) => Box::into_raw(Box::new(handle)),
        Ok(Err(e)) => {
            tracing::warn!(path, error = %e, "ravensaid_init failed");
            ptr::null_mut()
        }
        Err(_) => {
            tracing::error!(path, "ravensaid_init panicked");
            ptr::null_mut()
        }
    }
}

/// Fixed-point percentage likelihood that Ravenholdt wrote `message`, or a
/// negative sentinel (see [`ScoreError::code`]).
///
/// # Safety
///
/// `state` must be a live handle from [`ravensaid_init`]. `message` must be
/// NULL or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn ravensaid(state: *mut Ravensaid, message: *const c_char) -> c_int {
    let handle = handle_ref(state);
    if message.is_null() {
        return ScoreError::InvalidMessage.code();
    }
    let Ok(message) = CStr::from_ptr(message).to_str() else {
        return ScoreError::InvalidMessage.code();
    };

    match panic::catch_unwind(AssertUnwindSafe(|| handle.score(message))) {
        Ok(result) => score_to_code(result),
        Err(_) => {
            tracing::error!("ravensaid panicked during inference");
            ScoreError::Inference("panic".to_string()).code()
        }
    }
}

/// Release a handle.
///
/// # Safety
///
/// `state` must come from [`ravensaid_init`] and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn ravensaid_free(state: *mut Ravensaid) {
    release(state);
}

unsafe fn handle_ref<'a>(state: *mut Ravensaid) -> &'a Ravensaid {
    match state.as_ref() {
        Some(handle) => handle,
        None => panic!("ravensaid called with a NULL handle"),
    }
}

unsafe fn release(state: *mut Ravensaid) {
    if state.is_null() {
        panic!("ravensaid_free called with a NULL handle");
    }
    drop(Box::from_raw(state));
}
