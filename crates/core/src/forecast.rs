//! Session planning over a forecast
//!
//! A race weekend spans hours of changing air. Given a time-ordered list of
//! forecast readings, the engine evaluates each independently (in parallel) and
//! summarises how far the jetting moves across the session.

use crate::core_types::conditions::EnvironmentalReading;
use crate::error::JettingError;
use crate::jetting::engine::JettingEngine;
use crate::jetting::result::JettingResult;
use crate::validation::{number_field, text_field, JettingRequest, ValidationError, ValidationReason};
use rayon::prelude::*;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::info;

/// One forecast reading with a human label ("09:00", "Heat 2", ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub label: String,
    pub reading: EnvironmentalReading,
}

impl ForecastPoint {
    pub fn new(label: impl Into<String>, reading: EnvironmentalReading) -> Self {
        Self {
            label: label.into(),
            reading,
        }
    }
}

/// Parse and validate a JSON array of forecast entries.
///
/// Entries look like `{"label": "10:00", "temperature": 18, "pressure": 1009,
/// "humidity": 70}`. Field errors, type errors included, are reported as
/// `points[i].field`.
pub fn parse_forecast(json: &str) -> Result<Vec<ForecastPoint>, ValidationError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| ValidationError::malformed(e.to_string()))?;
    let Some(entries) = value.as_array() else {
        return Err(ValidationError::malformed("forecast must be a JSON array"));
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let prefix = format!("points[{i}].");
            let Some(object) = entry.as_object() else {
                return Err(ValidationError::new(
                    format!("points[{i}]"),
                    ValidationReason::WrongType { expected: "object" },
                ));
            };

            let label = text_field(object, "label", &prefix)?.unwrap_or_default();
            let request = JettingRequest {
                temperature: number_field(object, "temperature", &prefix)?,
                pressure: number_field(object, "pressure", &prefix)?,
                humidity: number_field(object, "humidity", &prefix)?,
                altitude: number_field(object, "altitude", &prefix)?,
                ..JettingRequest::default()
            };
            let validated = request.validate().map_err(|mut e| {
                e.field = format!("{prefix}{}", e.field);
                e
            })?;

            let label = if label.is_empty() { format!("#{}", i + 1) } else { label };
            Ok(ForecastPoint::new(label, validated.reading))
        })
        .collect()
}

/// Outcome for one forecast point
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub label: String,
    pub outcome: Result<JettingResult, JettingError>,
}

impl Serialize for SessionEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SessionEntry", 2)?;
        state.serialize_field("label", &self.label)?;
        match &self.outcome {
            Ok(result) => state.serialize_field("result", result)?,
            Err(err) => state.serialize_field("error", &err.to_string())?,
        }
        state.end()
    }
}

/// Recommendations across a session, in forecast order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionPlan {
    pub engine_type: String,
    pub entries: Vec<SessionEntry>,
    /// Smallest main jet across successful entries
    pub min_jet: Option<u32>,
    /// Largest main jet across successful entries
    pub max_jet: Option<u32>,
    /// Whether any successful entry carries a warning
    pub any_warnings: bool,
}

impl SessionPlan {
    fn from_entries(engine_type: &str, entries: Vec<SessionEntry>) -> Self {
        let jets = || {
            entries
                .iter()
                .filter_map(|e| e.outcome.as_ref().ok())
                .map(|r| r.recommendations.main_jet)
        };
        let min_jet = jets().min();
        let max_jet = jets().max();
        let any_warnings = entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().ok())
            .any(|r| !r.warnings.is_empty());

        Self {
            engine_type: engine_type.to_string(),
            entries,
            min_jet,
            max_jet,
            any_warnings,
        }
    }

    /// Whether the recommended jet changes at all over the session
    pub fn jet_changes(&self) -> bool {
        self.min_jet != self.max_jet
    }

    /// Entries that failed to compute
    pub fn failures(&self) -> impl Iterator<Item = &SessionEntry> {
        self.entries.iter().filter(|e| e.outcome.is_err())
    }
}

impl JettingEngine {
    /// Evaluate every forecast point against the same reference setup.
    ///
    /// Points are computed in parallel; the plan preserves input order. A
    /// failing point is recorded in its entry and does not affect the others.
    pub fn recommend_series(
        &self,
        points: &[ForecastPoint],
        engine_type: &str,
        reference_jet: Option<u32>,
        reference_conditions: Option<&EnvironmentalReading>,
    ) -> SessionPlan {
        let entries: Vec<SessionEntry> = points
            .par_iter()
            .map(|point| SessionEntry {
                label: point.label.clone(),
                outcome: self.recommend(&point.reading, engine_type, reference_jet, reference_conditions),
            })
            .collect();

        let plan = SessionPlan::from_entries(engine_type, entries);
        info!(
            points = points.len(),
            min_jet = ?plan.min_jet,
            max_jet = ?plan.max_jet,
            any_warnings = plan.any_warnings,
            "Evaluated session plan"
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::{Celsius, Hectopascals, Meters, Percent};

    fn point(label: &str, t: f64, p: f64, h: f64) -> ForecastPoint {
        ForecastPoint::new(
            label,
            EnvironmentalReading::new(Celsius::new(t), Hectopascals::new(p), Percent::new(h), Meters::new(0.0)),
        )
    }

    #[test]
    fn test_series_preserves_order_and_matches_single_calls() {
        let engine = JettingEngine::default();
        let points: Vec<ForecastPoint> = (0..24)
            .map(|hour| point(&format!("{hour:02}:00"), 5.0 + f64::from(hour), 1013.0, 80.0))
            .collect();

        let plan = engine.recommend_series(&points, "Senior MAX EVO", None, None);
        assert_eq!(plan.entries.len(), points.len());
        for (entry, p) in plan.entries.iter().zip(&points) {
            assert_eq!(entry.label, p.label);
            let single = engine.recommend(&p.reading, "Senior MAX EVO", None, None).unwrap();
            assert_eq!(entry.outcome.as_ref().unwrap(), &single);
        }
        assert!(plan.min_jet <= plan.max_jet);
    }

    #[test]
    fn test_series_summary() {
        let engine = JettingEngine::default();
        let points = [point("cold", 5.0, 1013.0, 95.0), point("hot", 35.0, 990.0, 20.0)];
        let plan = engine.recommend_series(&points, "Mini MAX", None, None);
        assert!(plan.jet_changes());
        assert!(plan.any_warnings);
        assert_eq!(plan.failures().count(), 0);
    }

    #[test]
    fn test_empty_series() {
        let plan = JettingEngine::default().recommend_series(&[], "Mini MAX", None, None);
        assert!(plan.entries.is_empty());
        assert_eq!(plan.min_jet, None);
        assert!(!plan.any_warnings);
    }

    #[test]
    fn test_parse_forecast() {
        let points = parse_forecast(
            r#"[{"label": "09:00", "temperature": 12, "pressure": 1010, "humidity": 80},
                {"temperature": 20, "pressure": 1008, "humidity": 55, "altitude": 300}]"#,
        )
        .unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "09:00");
        assert_eq!(points[1].label, "#2");
        assert_eq!(*points[1].reading.altitude, 300.0);
    }

    #[test]
    fn test_parse_forecast_names_bad_point() {
        let err = parse_forecast(
            r#"[{"temperature": 12, "pressure": 1010, "humidity": 80},
                {"temperature": 20, "pressure": 1008, "humidity": 155}]"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "points[1].humidity");
    }

    #[test]
    fn test_parse_forecast_names_wrong_types() {
        let err = parse_forecast(
            r#"[{"temperature": 12, "pressure": 1010, "humidity": 80},
                {"temperature": "warm", "pressure": 1008, "humidity": 55}]"#,
        )
        .unwrap_err();
        assert_eq!(err.field, "points[1].temperature");
        assert_eq!(err.reason, ValidationReason::NotNumeric);

        let err = parse_forecast(r#"[{"label": 9, "temperature": 12, "pressure": 1010, "humidity": 80}]"#)
            .unwrap_err();
        assert_eq!(err.field, "points[0].label");
        assert_eq!(err.reason, ValidationReason::WrongType { expected: "string" });

        let err = parse_forecast(r#"[{"temperature": 12, "pressure": 1010, "humidity": 80}, 7]"#).unwrap_err();
        assert_eq!(err.field, "points[1]");

        let err = parse_forecast(r#"{"temperature": 12}"#).unwrap_err();
        assert_eq!(err.field, "body");

        let points = parse_forecast(r#"[{"label": null, "temperature": 12, "pressure": 1010, "humidity": 80}]"#)
            .unwrap();
        assert_eq!(points[0].label, "#1");
    }

    #[test]
    fn test_entry_serializes_error_as_string() {
        let entry = SessionEntry {
            label: "bad".to_string(),
            outcome: Err(JettingError::Computation {
                quantity: "air_density",
                value: f64::NAN,
            }),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json["error"].as_str().unwrap().contains("air_density"));
        assert!(json.get("result").is_none());
    }
}
