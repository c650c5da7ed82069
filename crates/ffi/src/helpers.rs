use crate::error::{with_last_error_mut, DefaultJettingError, JettingErrorCode, JettingFfiError};
use jetting_core::JettingError;
use std::ffi::CString;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl JettingFfiError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Record an error in thread-local storage and return its code.
#[inline]
pub(crate) fn track_error(error: &impl JettingFfiError) -> JettingErrorCode {
    set_last_error(error);
    error.code()
}

/// Record a core error and return its code.
pub(crate) fn track_core_error(error: &JettingError) -> JettingErrorCode {
    track_error(&DefaultJettingError::from(error))
}

/// Clear the thread-local error message and code.
/// Called on every successful operation so stale errors never linger.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = JettingErrorCode::Ok;
    });
}
