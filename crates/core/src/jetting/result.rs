//! Structured output of a jetting calculation

use crate::core_types::conditions::EnvironmentalReading;
use crate::core_types::engine::NeedlePosition;
use crate::core_types::units::{Celsius, Hectopascals, KgPerCubicMeter, Meters, Millimeters, Percent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Echo of the request the result was computed for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEcho {
    pub temperature: Celsius,
    pub pressure: Hectopascals,
    pub humidity: Percent,
    pub altitude: Meters,
    /// Engine name as requested, before any fallback
    pub engine_type: String,
}

impl InputEcho {
    pub fn new(reading: &EnvironmentalReading, engine_type: &str) -> Self {
        Self {
            temperature: reading.temperature,
            pressure: reading.pressure,
            humidity: reading.humidity,
            altitude: reading.altitude,
            engine_type: engine_type.to_string(),
        }
    }

    /// The echoed conditions as a reading
    pub fn reading(&self) -> EnvironmentalReading {
        EnvironmentalReading::new(self.temperature, self.pressure, self.humidity, self.altitude)
    }
}

/// Intermediate quantities behind the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calculations {
    pub current_air_density: KgPerCubicMeter,
    pub reference_air_density: KgPerCubicMeter,
    /// current / reference
    pub density_ratio: f64,
}

/// Recommended carburetor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    /// Main jet size, always a multiple of the jet increment
    pub main_jet: u32,
    pub needle_position: NeedlePosition,
    pub float_height: Millimeters,
    pub needle_type: String,
}

/// Category of advisory warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Humid and cold: water may condense in the fuel system
    DewPoint,
    /// Recommended jet is outside the engine's typical range
    JetRange,
}

impl WarningKind {
    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::DewPoint => "dew_point",
            WarningKind::JetRange => "jet_range",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advisory attached to a result. Never blocks the recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn dew_point() -> Self {
        Self {
            kind: WarningKind::DewPoint,
            message: "Temperature is close to dew point. Risk of water condensation in fuel system."
                .to_string(),
        }
    }

    pub fn jet_range(main_jet: u32) -> Self {
        Self {
            kind: WarningKind::JetRange,
            message: format!(
                "Recommended jet size ({main_jet}) is outside the typical range for this engine."
            ),
        }
    }
}

/// Complete answer to one jetting request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JettingResult {
    pub input: InputEcho,
    pub calculations: Calculations,
    pub recommendations: Recommendations,
    pub warnings: Vec<Warning>,
}

impl JettingResult {
    /// Whether a warning of the given kind is attached
    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }

    /// Serialize to the JSON wire shape
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_wire_shape() {
        let json = serde_json::to_value(Warning::dew_point()).unwrap();
        assert_eq!(json["type"], "dew_point");
        assert!(json["message"].as_str().unwrap().contains("dew point"));

        let json = serde_json::to_value(Warning::jet_range(140)).unwrap();
        assert_eq!(json["type"], "jet_range");
        assert_eq!(
            json["message"],
            "Recommended jet size (140) is outside the typical range for this engine."
        );
    }

    #[test]
    fn test_kind_display_matches_serde() {
        for kind in [WarningKind::DewPoint, WarningKind::JetRange] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.to_string());
        }
    }
}
