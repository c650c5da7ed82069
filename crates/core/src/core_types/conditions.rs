//! Atmospheric readings and the reference setup they are compared against
//!
//! A jetting recommendation is always relative: the engine ran well with some jet
//! under some conditions, and the question is how to change it for today's air.
//! [`ReferenceSetup`] captures the "ran well" half; [`EnvironmentalReading`] the
//! "today" half.

use crate::core_types::engine::NeedlePosition;
use crate::core_types::units::{Celsius, Hectopascals, KgPerCubicMeter, Meters, Millimeters, Percent};
use serde::{Deserialize, Serialize};

/// Standard reference conditions used when the caller supplies none.
///
/// Dry air at 25°C and 990 hPa, a typical summer race-day baseline for the
/// Rotax MAX family.
pub mod standard {
    use super::{Celsius, Hectopascals, KgPerCubicMeter, Millimeters, Percent};

    /// Standard temperature (25°C)
    pub const TEMPERATURE: Celsius = Celsius::new(25.0);

    /// Standard station pressure (990 hPa)
    pub const PRESSURE: Hectopascals = Hectopascals::new(990.0);

    /// Standard relative humidity (dry air)
    pub const HUMIDITY: Percent = Percent::new(0.0);

    /// Published air density at standard conditions.
    ///
    /// Used as-is rather than recomputed from the triple above; the recomputed
    /// value (≈1.15676) differs in the fourth decimal.
    pub const AIR_DENSITY: KgPerCubicMeter = KgPerCubicMeter::new(1.157);

    /// Float height the reference jetting was set up with
    pub const FLOAT_HEIGHT: Millimeters = Millimeters::new(15.0);
}

/// Atmospheric conditions at the track.
///
/// Altitude is informational only: station pressure already reflects elevation,
/// so the density model never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalReading {
    /// Air temperature
    pub temperature: Celsius,
    /// Station (not sea-level corrected) pressure
    pub pressure: Hectopascals,
    /// Relative humidity, 0-100
    pub humidity: Percent,
    /// Track elevation above sea level
    #[serde(default)]
    pub altitude: Meters,
}

impl EnvironmentalReading {
    /// Create a reading from its components
    pub fn new(temperature: Celsius, pressure: Hectopascals, humidity: Percent, altitude: Meters) -> Self {
        Self {
            temperature,
            pressure,
            humidity,
            altitude,
        }
    }

    /// Reading at standard conditions (25°C, 990 hPa, 0%)
    pub fn standard() -> Self {
        Self::new(
            standard::TEMPERATURE,
            standard::PRESSURE,
            standard::HUMIDITY,
            Meters::new(0.0),
        )
    }
}

/// Where the reference air density comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ReferenceConditions {
    /// Published standard density, no computation
    Standard,
    /// Conditions measured on the day the reference setup was dialled in
    Measured(EnvironmentalReading),
}

/// A known-good setup: the jetting an engine ran well with, and the air it ran in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSetup {
    /// Main jet size
    pub jet: u32,
    /// Needle clip position (1 = richest, 5 = leanest)
    pub needle_position: NeedlePosition,
    /// Float height
    pub float_height: Millimeters,
    /// Conditions the setup was proven in
    pub conditions: ReferenceConditions,
}
