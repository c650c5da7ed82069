use jetting_core::JettingError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait JettingFfiError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> JettingErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `JettingFfiError` for the FFI error scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultJettingError {
    code: JettingErrorCode,
    msg: String,
}

impl DefaultJettingError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"input"`, `"out_density"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: JettingErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for a string argument that is not valid UTF-8.
    pub fn invalid_utf8(param_name: &str) -> Self {
        Self {
            code: JettingErrorCode::InvalidUtf8,
            msg: format!("Parameter '{param_name}' is not valid UTF-8"),
        }
    }

    /// Create error for a result that could not be encoded.
    pub fn serialization(message: &str) -> Self {
        Self {
            code: JettingErrorCode::Serialization,
            msg: format!("Failed to encode result: {message}"),
        }
    }
}

impl From<&JettingError> for DefaultJettingError {
    fn from(error: &JettingError) -> Self {
        let code = match error {
            JettingError::InvalidInput(_) => JettingErrorCode::InvalidInput,
            JettingError::Computation { .. } => JettingErrorCode::Computation,
            JettingError::Profile(_) => JettingErrorCode::Profile,
        };
        Self {
            code,
            msg: error.to_string(),
        }
    }
}

impl JettingFfiError for DefaultJettingError {
    fn code(&self) -> JettingErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by jetting functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JettingErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Input failed validation (missing, non-finite or out-of-range field).
    /// The last error message names the field and the reason.
    InvalidInput = 2,

    /// A formula produced a non-finite or non-physical value.
    Computation = 3,

    /// A string argument was not valid UTF-8.
    InvalidUtf8 = 4,

    /// The result could not be encoded.
    Serialization = 5,

    /// The engine profile table is invalid.
    Profile = 6,
}

impl From<DefaultJettingError> for JettingErrorCode {
    fn from(error: DefaultJettingError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is stored here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, JettingErrorCode)> = const { RefCell::new((None, JettingErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, JettingErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, JettingErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if the last call on this thread failed.
/// - `null` if the last call succeeded.
///
/// # Lifetime
/// The returned pointer is valid until the next jetting call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// JettingOutput out;
/// if (jetting_calculate(&input, &out) != Ok) {
///     const char* error = jetting_get_last_error();
///     if (error) {
///         fprintf(stderr, "Jetting failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn jetting_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code (`Ok` if the last call succeeded).
///
/// Error state is per-thread.
#[no_mangle]
pub extern "C" fn jetting_get_last_error_code() -> JettingErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
