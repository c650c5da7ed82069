//! Request boundary: parsing and validating caller input
//!
//! The density model and jetting formulas assume physically meaningful input and
//! do no checking of their own. Everything a caller sends passes through
//! [`JettingRequest::validate`] first, which either yields typed values or names
//! the first field that failed and why.

use crate::core_types::conditions::EnvironmentalReading;
use crate::core_types::units::{Celsius, Hectopascals, Meters, Percent};
use crate::physics::air_density::MAGNUS_B;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

const REFERENCE_PREFIX: &str = "reference_conditions.";

/// Reference conditions as sent by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConditionsRequest {
    /// Temperature (°C)
    pub temperature: Option<f64>,
    /// Station pressure (hPa)
    pub pressure: Option<f64>,
    /// Relative humidity (%)
    pub humidity: Option<f64>,
}

impl ReferenceConditionsRequest {
    /// Validate the reference conditions on their own, reporting fields as
    /// `reference_conditions.<field>`
    pub fn validate(&self) -> Result<EnvironmentalReading, ValidationError> {
        validate_conditions(
            self.temperature,
            self.pressure,
            self.humidity,
            Meters::new(0.0),
            REFERENCE_PREFIX,
        )
    }
}

/// Unvalidated calculation request, mirroring the JSON accepted at the boundary.
///
/// # Example
/// ```
/// use jetting_core::validation::JettingRequest;
///
/// let request = JettingRequest::from_json(
///     r#"{"temperature": 25, "pressure": 1013, "humidity": 50, "engine_type": "Mini MAX"}"#,
/// )
/// .unwrap();
/// let validated = request.validate().unwrap();
/// assert_eq!(*validated.reading.pressure, 1013.0);
/// assert!(validated.reference_jet.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JettingRequest {
    /// Temperature (°C)
    pub temperature: Option<f64>,
    /// Station pressure (hPa)
    pub pressure: Option<f64>,
    /// Relative humidity (%)
    pub humidity: Option<f64>,
    /// Track elevation (m), informational
    pub altitude: Option<f64>,
    /// Engine model name; unknown names use the default profile
    #[serde(default)]
    pub engine_type: String,
    /// Jet known to work under the reference conditions
    pub reference_jet: Option<i64>,
    /// Conditions the reference jet was proven in
    pub reference_conditions: Option<ReferenceConditionsRequest>,
}

impl JettingRequest {
    /// Request for the given conditions and engine, no reference overrides
    pub fn new(temperature: f64, pressure: f64, humidity: f64, engine_type: impl Into<String>) -> Self {
        Self {
            temperature: Some(temperature),
            pressure: Some(pressure),
            humidity: Some(humidity),
            engine_type: engine_type.into(),
            ..Self::default()
        }
    }

    /// Set the track altitude
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Set the reference jet
    pub fn with_reference_jet(mut self, jet: i64) -> Self {
        self.reference_jet = Some(jet);
        self
    }

    /// Set the reference conditions
    pub fn with_reference_conditions(mut self, temperature: f64, pressure: f64, humidity: f64) -> Self {
        self.reference_conditions = Some(ReferenceConditionsRequest {
            temperature: Some(temperature),
            pressure: Some(pressure),
            humidity: Some(humidity),
        });
        self
    }

    /// Parse a JSON request body.
    ///
    /// Each field is read with its own type check, so a wrong type is reported
    /// against that field. `null` counts as absent everywhere. `reference_jet`
    /// accepts any number without a fractional part (`130` or `130.0`).
    ///
    /// # Errors
    /// `Malformed` on field `body` for invalid JSON or a non-object body,
    /// otherwise the first field holding the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ValidationError::malformed(e.to_string()))?;
        let Some(object) = value.as_object() else {
            return Err(ValidationError::malformed("request body must be a JSON object"));
        };

        Ok(Self {
            temperature: number_field(object, "temperature", "")?,
            pressure: number_field(object, "pressure", "")?,
            humidity: number_field(object, "humidity", "")?,
            altitude: number_field(object, "altitude", "")?,
            engine_type: text_field(object, "engine_type", "")?.unwrap_or_default(),
            reference_jet: whole_number_field(object, "reference_jet")?,
            reference_conditions: reference_conditions_field(object)?,
        })
    }

    /// Validate every field, returning typed values or the first failure.
    ///
    /// Fields are checked in the order temperature, pressure, humidity,
    /// altitude, reference jet, reference conditions.
    pub fn validate(&self) -> Result<ValidatedRequest, ValidationError> {
        let mut reading = validate_conditions(
            self.temperature,
            self.pressure,
            self.humidity,
            Meters::new(0.0),
            "",
        )?;
        if let Some(altitude) = self.altitude {
            reading.altitude = Meters::new(finite("altitude", altitude)?);
        }

        let reference_jet = self.reference_jet.map(validate_reference_jet).transpose()?;

        let reference_conditions = self
            .reference_conditions
            .as_ref()
            .map(ReferenceConditionsRequest::validate)
            .transpose()?;

        Ok(ValidatedRequest {
            reading,
            engine_type: self.engine_type.clone(),
            reference_jet,
            reference_conditions,
        })
    }
}

/// A request that passed boundary validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Current conditions
    pub reading: EnvironmentalReading,
    /// Engine model name as requested
    pub engine_type: String,
    /// Explicit reference jet, if any
    pub reference_jet: Option<u32>,
    /// Explicit reference conditions, if any
    pub reference_conditions: Option<EnvironmentalReading>,
}

/// Optional numeric field of a JSON object
pub(crate) fn number_field(
    object: &Map<String, Value>,
    field: &str,
    prefix: &str,
) -> Result<Option<f64>, ValidationError> {
    let not_numeric = || ValidationError::new(format!("{prefix}{field}"), ValidationReason::NotNumeric);
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(not_numeric),
        Some(_) => Err(not_numeric()),
    }
}

/// Optional string field of a JSON object
pub(crate) fn text_field(
    object: &Map<String, Value>,
    field: &str,
    prefix: &str,
) -> Result<Option<String>, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(ValidationError::new(
            format!("{prefix}{field}"),
            ValidationReason::WrongType { expected: "string" },
        )),
    }
}

/// Optional integer field; whole floats are accepted, values beyond `i64`
/// saturate and are caught by the range check later
fn whole_number_field(object: &Map<String, Value>, field: &str) -> Result<Option<i64>, ValidationError> {
    let Some(value) = number_field(object, field, "")? else {
        return Ok(None);
    };
    if let Some(whole) = object.get(field).and_then(Value::as_i64) {
        return Ok(Some(whole));
    }
    if value.fract() != 0.0 {
        return Err(ValidationError::new(field, ValidationReason::NotInteger { value }));
    }
    Ok(Some(value as i64))
}

fn reference_conditions_field(
    object: &Map<String, Value>,
) -> Result<Option<ReferenceConditionsRequest>, ValidationError> {
    match object.get("reference_conditions") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(reference)) => Ok(Some(ReferenceConditionsRequest {
            temperature: number_field(reference, "temperature", REFERENCE_PREFIX)?,
            pressure: number_field(reference, "pressure", REFERENCE_PREFIX)?,
            humidity: number_field(reference, "humidity", REFERENCE_PREFIX)?,
        })),
        Some(_) => Err(ValidationError::new(
            "reference_conditions",
            ValidationReason::WrongType { expected: "object" },
        )),
    }
}

fn finite(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::new(field, ValidationReason::NotFinite))
    }
}

fn required(field: &str, value: Option<f64>) -> Result<f64, ValidationError> {
    match value {
        Some(v) => finite(field, v),
        None => Err(ValidationError::new(field, ValidationReason::Missing)),
    }
}

fn validate_conditions(
    temperature: Option<f64>,
    pressure: Option<f64>,
    humidity: Option<f64>,
    altitude: Meters,
    prefix: &str,
) -> Result<EnvironmentalReading, ValidationError> {
    let field = |name: &str| format!("{prefix}{name}");

    let temperature = required(&field("temperature"), temperature)?;
    if temperature <= -MAGNUS_B {
        return Err(ValidationError::new(
            field("temperature"),
            ValidationReason::AtOrBelow {
                value: temperature,
                limit: -MAGNUS_B,
            },
        ));
    }

    let pressure = required(&field("pressure"), pressure)?;
    if pressure <= 0.0 {
        return Err(ValidationError::new(
            field("pressure"),
            ValidationReason::NotPositive { value: pressure },
        ));
    }

    let humidity = required(&field("humidity"), humidity)?;
    if !(0.0..=100.0).contains(&humidity) {
        return Err(ValidationError::new(
            field("humidity"),
            ValidationReason::OutOfRange {
                value: humidity,
                min: 0.0,
                max: 100.0,
            },
        ));
    }

    Ok(EnvironmentalReading::new(
        Celsius::new(temperature),
        Hectopascals::new(pressure),
        Percent::new(humidity),
        altitude,
    ))
}

/// Validate a reference jet size on its own
pub fn validate_reference_jet(jet: i64) -> Result<u32, ValidationError> {
    if jet <= 0 {
        return Err(ValidationError::new(
            "reference_jet",
            ValidationReason::NotPositive { value: jet as f64 },
        ));
    }
    u32::try_from(jet).map_err(|_| {
        ValidationError::new(
            "reference_jet",
            ValidationReason::OutOfRange {
                value: jet as f64,
                min: 1.0,
                max: f64::from(u32::MAX),
            },
        )
    })
}

/// Why a field was rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationReason {
    /// Required field absent or null
    Missing,
    /// Field present but not a number
    NotNumeric,
    /// Number with a fractional part where a whole number belongs
    NotInteger { value: f64 },
    /// Field present with a non-numeric type other than the one expected
    WrongType { expected: &'static str },
    /// NaN or infinite
    NotFinite,
    /// Must be strictly greater than zero
    NotPositive { value: f64 },
    /// Must lie within `[min, max]`
    OutOfRange { value: f64, min: f64, max: f64 },
    /// Must be strictly greater than `limit`
    AtOrBelow { value: f64, limit: f64 },
    /// Body could not be parsed at all
    Malformed { message: String },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::Missing => write!(f, "is required"),
            ValidationReason::NotNumeric => write!(f, "must be a number"),
            ValidationReason::NotInteger { value } => write!(f, "must be a whole number, got {value}"),
            ValidationReason::WrongType { expected } => write!(f, "must be a {expected}"),
            ValidationReason::NotFinite => write!(f, "must be a finite number"),
            ValidationReason::NotPositive { value } => {
                write!(f, "must be greater than 0, got {value}")
            }
            ValidationReason::OutOfRange { value, min, max } => {
                write!(f, "must be within [{min}, {max}], got {value}")
            }
            ValidationReason::AtOrBelow { value, limit } => {
                write!(f, "must be greater than {limit}, got {value}")
            }
            ValidationReason::Malformed { message } => write!(f, "is malformed: {message}"),
        }
    }
}

/// A rejected request field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Field name, dotted for nested fields (`reference_conditions.humidity`)
    pub field: String,
    /// What was wrong with it
    pub reason: ValidationReason,
}

impl ValidationError {
    /// Create a validation error
    pub fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    /// The request body itself could not be parsed
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(
            "body",
            ValidationReason::Malformed {
                message: message.into(),
            },
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' {}", self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_for(request: &JettingRequest) -> (String, ValidationReason) {
        let err = request.validate().unwrap_err();
        (err.field, err.reason)
    }

    #[test]
    fn test_valid_request() {
        let validated = JettingRequest::new(25.0, 1013.0, 50.0, "Senior MAX EVO")
            .with_altitude(100.0)
            .with_reference_jet(128)
            .with_reference_conditions(20.0, 1000.0, 40.0)
            .validate()
            .unwrap();
        assert_eq!(*validated.reading.altitude, 100.0);
        assert_eq!(validated.reference_jet, Some(128));
        assert_eq!(*validated.reference_conditions.unwrap().temperature, 20.0);
    }

    #[test]
    fn test_missing_fields_are_named() {
        let mut request = JettingRequest::new(25.0, 1013.0, 50.0, "Mini MAX");
        request.humidity = None;
        assert_eq!(
            reason_for(&request),
            ("humidity".to_string(), ValidationReason::Missing)
        );

        request.temperature = None;
        assert_eq!(reason_for(&request).0, "temperature");
    }

    #[test]
    fn test_humidity_bounds() {
        assert!(JettingRequest::new(20.0, 1013.0, 0.0, "").validate().is_ok());
        assert!(JettingRequest::new(20.0, 1013.0, 100.0, "").validate().is_ok());
        let (field, reason) = reason_for(&JettingRequest::new(20.0, 1013.0, 100.5, ""));
        assert_eq!(field, "humidity");
        assert!(matches!(reason, ValidationReason::OutOfRange { .. }));
        assert!(JettingRequest::new(20.0, 1013.0, -1.0, "").validate().is_err());
    }

    #[test]
    fn test_pressure_must_be_positive() {
        let (field, reason) = reason_for(&JettingRequest::new(20.0, 0.0, 50.0, ""));
        assert_eq!(field, "pressure");
        assert_eq!(reason, ValidationReason::NotPositive { value: 0.0 });
    }

    #[test]
    fn test_temperature_singularity() {
        let (field, reason) = reason_for(&JettingRequest::new(-237.3, 1013.0, 50.0, ""));
        assert_eq!(field, "temperature");
        assert!(matches!(reason, ValidationReason::AtOrBelow { .. }));
        assert!(JettingRequest::new(-237.2, 1013.0, 50.0, "").validate().is_ok());
    }

    #[test]
    fn test_non_finite_rejected() {
        let (field, reason) = reason_for(&JettingRequest::new(f64::NAN, 1013.0, 50.0, ""));
        assert_eq!(field, "temperature");
        assert_eq!(reason, ValidationReason::NotFinite);

        let request = JettingRequest::new(20.0, 1013.0, 50.0, "").with_altitude(f64::INFINITY);
        assert_eq!(reason_for(&request).0, "altitude");
    }

    #[test]
    fn test_reference_fields_use_dotted_names() {
        let request = JettingRequest::new(20.0, 1013.0, 50.0, "").with_reference_conditions(20.0, 1000.0, 140.0);
        assert_eq!(reason_for(&request).0, "reference_conditions.humidity");
    }

    #[test]
    fn test_reference_jet_must_be_positive() {
        let request = JettingRequest::new(20.0, 1013.0, 50.0, "").with_reference_jet(0);
        assert_eq!(reason_for(&request).0, "reference_jet");
        let request = JettingRequest::new(20.0, 1013.0, 50.0, "").with_reference_jet(-130);
        assert_eq!(reason_for(&request).0, "reference_jet");
    }

    #[test]
    fn test_from_json_non_numeric_field() {
        let err = JettingRequest::from_json(r#"{"temperature": "hot", "pressure": 1013, "humidity": 50}"#)
            .unwrap_err();
        assert_eq!(err.field, "temperature");
        assert_eq!(err.reason, ValidationReason::NotNumeric);

        let err = JettingRequest::from_json(
            r#"{"temperature": 20, "pressure": 1013, "humidity": 50,
                "reference_conditions": {"temperature": 20, "pressure": "high", "humidity": 0}}"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "reference_conditions.pressure");
    }

    #[test]
    fn test_first_failing_field_follows_check_order() {
        let mut request = JettingRequest::new(20.0, 1013.0, 50.0, "Mini MAX")
            .with_altitude(f64::NAN)
            .with_reference_jet(0);
        request.temperature = None;
        request.humidity = Some(150.0);
        assert_eq!(reason_for(&request), ("temperature".to_string(), ValidationReason::Missing));

        request.temperature = Some(20.0);
        assert_eq!(reason_for(&request).0, "humidity");

        request.humidity = Some(50.0);
        assert_eq!(reason_for(&request), ("altitude".to_string(), ValidationReason::NotFinite));

        request.altitude = Some(250.0);
        assert_eq!(reason_for(&request).0, "reference_jet");
    }

    #[test]
    fn test_from_json_reference_jet_whole_numbers() {
        let base = r#""temperature": 20, "pressure": 1013, "humidity": 50"#;

        let request = JettingRequest::from_json(&format!(r#"{{{base}, "reference_jet": 130.0}}"#)).unwrap();
        assert_eq!(request.reference_jet, Some(130));
        assert_eq!(request.validate().unwrap().reference_jet, Some(130));

        let err = JettingRequest::from_json(&format!(r#"{{{base}, "reference_jet": 130.5}}"#)).unwrap_err();
        assert_eq!(err.field, "reference_jet");
        assert_eq!(err.reason, ValidationReason::NotInteger { value: 130.5 });

        let err = JettingRequest::from_json(&format!(r#"{{{base}, "reference_jet": "130"}}"#)).unwrap_err();
        assert_eq!(err.field, "reference_jet");
        assert_eq!(err.reason, ValidationReason::NotNumeric);

        let request = JettingRequest::from_json(&format!(r#"{{{base}, "reference_jet": 1e30}}"#)).unwrap();
        assert_eq!(reason_for(&request).0, "reference_jet");
    }

    #[test]
    fn test_from_json_engine_type_types() {
        let base = r#""temperature": 20, "pressure": 1013, "humidity": 50"#;

        let err = JettingRequest::from_json(&format!(r#"{{{base}, "engine_type": 7}}"#)).unwrap_err();
        assert_eq!(err.field, "engine_type");
        assert_eq!(err.reason, ValidationReason::WrongType { expected: "string" });

        let request = JettingRequest::from_json(&format!(r#"{{{base}, "engine_type": null}}"#)).unwrap();
        assert_eq!(request.engine_type, "");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_from_json_reference_conditions_types() {
        let base = r#""temperature": 20, "pressure": 1013, "humidity": 50"#;

        let err = JettingRequest::from_json(&format!(r#"{{{base}, "reference_conditions": "x"}}"#)).unwrap_err();
        assert_eq!(err.field, "reference_conditions");
        assert_eq!(err.reason, ValidationReason::WrongType { expected: "object" });

        let request =
            JettingRequest::from_json(&format!(r#"{{{base}, "reference_conditions": null}}"#)).unwrap();
        assert!(request.reference_conditions.is_none());
    }

    #[test]
    fn test_from_json_malformed_body() {
        let err = JettingRequest::from_json("[1, 2, 3]").unwrap_err();
        assert_eq!(err.field, "body");
        let err = JettingRequest::from_json("{").unwrap_err();
        assert!(matches!(err.reason, ValidationReason::Malformed { .. }));
    }

    #[test]
    fn test_from_json_null_is_missing() {
        let request =
            JettingRequest::from_json(r#"{"temperature": null, "pressure": 1013, "humidity": 50}"#).unwrap();
        assert_eq!(reason_for(&request).0, "temperature");
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::new(
            "humidity",
            ValidationReason::OutOfRange {
                value: 120.0,
                min: 0.0,
                max: 100.0,
            },
        );
        assert_eq!(err.to_string(), "field 'humidity' must be within [0, 100], got 120");
    }
}
