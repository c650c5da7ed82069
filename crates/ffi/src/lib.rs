//! C ABI for the jetting calculator
//!
//! Every function returns a [`JettingErrorCode`] (or null for pointer returns)
//! and records a message retrievable with `jetting_get_last_error`. The engine
//! behind the ABI is built once with the built-in Rotax MAX profiles and never
//! mutated, so all functions are safe to call from any thread.

mod error;
mod helpers;

pub use error::{jetting_get_last_error, jetting_get_last_error_code, JettingErrorCode};

use error::DefaultJettingError;
use helpers::{clear_last_error, track_core_error, track_error};
use jetting_core::{JettingEngine, JettingRequest, JettingResult, WarningKind};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::LazyLock;

static ENGINE: LazyLock<JettingEngine> = LazyLock::new(JettingEngine::default);

/// Capacity of [`JettingOutput::needle_type`], including the NUL terminator
pub const JETTING_NEEDLE_TYPE_LEN: usize = 16;

/// Bit set in [`JettingOutput::warnings`] when water may condense in the fuel system
pub const JETTING_WARNING_DEW_POINT: u32 = 1 << 0;

/// Bit set in [`JettingOutput::warnings`] when the main jet is outside the engine's range
pub const JETTING_WARNING_JET_RANGE: u32 = 1 << 1;

/// C-compatible calculation request.
///
/// Optional reference values are selected with the `has_*` flags; the
/// associated fields are ignored when the flag is false.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JettingInput {
    /// Temperature (°C)
    pub temperature: f64,
    /// Station pressure (hPa)
    pub pressure: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Track elevation (m), informational
    pub altitude: f64,
    /// NUL-terminated engine name, or null for the default engine
    pub engine_type: *const c_char,
    pub has_reference_jet: bool,
    pub reference_jet: u32,
    pub has_reference_conditions: bool,
    pub reference_temperature: f64,
    pub reference_pressure: f64,
    pub reference_humidity: f64,
}

/// C-compatible calculation result
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct JettingOutput {
    pub current_air_density: f64,
    pub reference_air_density: f64,
    pub density_ratio: f64,
    pub main_jet: u32,
    /// Needle clip position, 1 (richest) to 5 (leanest)
    pub needle_position: u8,
    /// Float height (mm)
    pub float_height: f64,
    /// NUL-terminated needle part number, truncated to fit
    pub needle_type: [c_char; JETTING_NEEDLE_TYPE_LEN],
    /// Bitwise OR of `JETTING_WARNING_*` flags
    pub warnings: u32,
}

impl From<&JettingResult> for JettingOutput {
    fn from(result: &JettingResult) -> Self {
        let mut needle_type = [0 as c_char; JETTING_NEEDLE_TYPE_LEN];
        for (dst, src) in needle_type
            .iter_mut()
            .zip(result.recommendations.needle_type.bytes().take(JETTING_NEEDLE_TYPE_LEN - 1))
        {
            *dst = src as c_char;
        }

        let warnings = result.warnings.iter().fold(0, |flags, w| {
            flags
                | match w.kind {
                    WarningKind::DewPoint => JETTING_WARNING_DEW_POINT,
                    WarningKind::JetRange => JETTING_WARNING_JET_RANGE,
                }
        });

        Self {
            current_air_density: *result.calculations.current_air_density,
            reference_air_density: *result.calculations.reference_air_density,
            density_ratio: result.calculations.density_ratio,
            main_jet: result.recommendations.main_jet,
            needle_position: result.recommendations.needle_position.value(),
            float_height: *result.recommendations.float_height,
            needle_type,
            warnings,
        }
    }
}

/// Read an optional C string argument; null reads as the empty string.
///
/// # Safety
/// `ptr` must be null or point to a valid NUL-terminated string.
unsafe fn read_str<'a>(ptr: *const c_char, param_name: &str) -> Result<&'a str, DefaultJettingError> {
    if ptr.is_null() {
        return Ok("");
    }
    // SAFETY: non-null and NUL-terminated per the caller contract
    let cstr = unsafe { CStr::from_ptr(ptr) };
    cstr.to_str().map_err(|_| DefaultJettingError::invalid_utf8(param_name))
}

/// Compute moist air density (kg/m³) for validated conditions.
///
/// # Returns
/// - `Ok` with `*out_density` set
/// - `NullPointer` if `out_density` is null
/// - `InvalidInput` if a value is missing or outside its physical range (see last error)
/// - `Computation` if the formula degenerates
///
/// # Safety
/// `out_density` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn jetting_air_density(
    temperature: f64,
    pressure: f64,
    humidity: f64,
    out_density: *mut f64,
) -> JettingErrorCode {
    if out_density.is_null() {
        return track_error(&DefaultJettingError::null_pointer("out_density"));
    }

    let validated = match JettingRequest::new(temperature, pressure, humidity, "").validate() {
        Ok(v) => v,
        Err(e) => return track_core_error(&e.into()),
    };

    match validated.reading.air_density() {
        Ok(density) => {
            // SAFETY: checked non-null above; caller guarantees validity
            unsafe { *out_density = *density };
            clear_last_error();
            JettingErrorCode::Ok
        }
        Err(e) => track_core_error(&e),
    }
}

/// Calculate a jetting recommendation.
///
/// # Returns
/// - `Ok` with `*output` filled in
/// - `NullPointer` if `input` or `output` is null
/// - `InvalidUtf8` if `input.engine_type` is not UTF-8
/// - `InvalidInput` naming the failing field in the last error message
/// - `Computation` if the formulas degenerate
///
/// # Safety
/// `input` must be null or point to a valid `JettingInput` whose `engine_type`
/// is null or NUL-terminated; `output` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn jetting_calculate(
    input: *const JettingInput,
    output: *mut JettingOutput,
) -> JettingErrorCode {
    if input.is_null() {
        return track_error(&DefaultJettingError::null_pointer("input"));
    }
    if output.is_null() {
        return track_error(&DefaultJettingError::null_pointer("output"));
    }

    // SAFETY: checked non-null above; caller guarantees validity
    let input = unsafe { &*input };
    // SAFETY: engine_type is null or NUL-terminated per the caller contract
    let engine_type = match unsafe { read_str(input.engine_type, "engine_type") } {
        Ok(s) => s,
        Err(e) => return track_error(&e),
    };

    let mut request = JettingRequest::new(input.temperature, input.pressure, input.humidity, engine_type)
        .with_altitude(input.altitude);
    if input.has_reference_jet {
        request = request.with_reference_jet(i64::from(input.reference_jet));
    }
    if input.has_reference_conditions {
        request = request.with_reference_conditions(
            input.reference_temperature,
            input.reference_pressure,
            input.reference_humidity,
        );
    }

    match ENGINE.calculate(&request) {
        Ok(result) => {
            // SAFETY: checked non-null above; caller guarantees validity
            unsafe { *output = JettingOutput::from(&result) };
            clear_last_error();
            JettingErrorCode::Ok
        }
        Err(e) => track_core_error(&e),
    }
}

/// Calculate a recommendation from a JSON request, returning the JSON result.
///
/// The request has the shape `{"temperature", "pressure", "humidity",
/// "altitude", "engine_type", "reference_jet"?, "reference_conditions"?}`.
///
/// # Returns
/// An owned NUL-terminated string to be released with `jetting_string_free`,
/// or null on error (see `jetting_get_last_error`).
///
/// # Safety
/// `request_json` must be null or point to a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn jetting_calculate_json(request_json: *const c_char) -> *mut c_char {
    if request_json.is_null() {
        track_error(&DefaultJettingError::null_pointer("request_json"));
        return ptr::null_mut();
    }
    // SAFETY: checked non-null above; caller guarantees NUL termination
    let json = match unsafe { read_str(request_json, "request_json") } {
        Ok(s) => s,
        Err(e) => {
            track_error(&e);
            return ptr::null_mut();
        }
    };

    let result = match ENGINE.calculate_json(json) {
        Ok(r) => r,
        Err(e) => {
            track_core_error(&e);
            return ptr::null_mut();
        }
    };

    let encoded = serde_json::to_string(&result)
        .map_err(|e| DefaultJettingError::serialization(&e.to_string()))
        .and_then(|s| CString::new(s).map_err(|e| DefaultJettingError::serialization(&e.to_string())));
    match encoded {
        Ok(cstring) => {
            clear_last_error();
            cstring.into_raw()
        }
        Err(e) => {
            track_error(&e);
            ptr::null_mut()
        }
    }
}

/// Release a string returned by `jetting_calculate_json`. Null is ignored.
///
/// # Safety
/// `s` must be null or a pointer returned by `jetting_calculate_json` that has
/// not already been freed.
#[no_mangle]
pub unsafe extern "C" fn jetting_string_free(s: *mut c_char) {
    if !s.is_null() {
        // SAFETY: pointer came from CString::into_raw per the caller contract
        drop(unsafe { CString::from_raw(s) });
    }
}
