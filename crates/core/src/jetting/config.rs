//! Tunable constants of the jetting formulas

use crate::core_types::conditions::standard;
use crate::core_types::units::{Celsius, KgPerCubicMeter, Millimeters, Percent};
use serde::{Deserialize, Serialize};

/// Configuration for the recommendation engine
///
/// The defaults reproduce the published Rotax MAX jetting rules; changing them
/// is meant for experimentation with other carburetors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JettingConfig {
    /// Reference density used when no reference conditions are supplied
    pub standard_air_density: KgPerCubicMeter,

    /// Exponent applied to the density ratio when scaling the jet.
    /// Jet flow area goes as the square of the diameter, so a fourth root of
    /// the density ratio keeps fuel mass flow proportional to air mass flow.
    pub jet_exponent: f64,

    /// Jets come in steps of this size; recommendations snap to a multiple
    pub jet_increment: u32,

    /// Density ratio above which the needle goes one notch richer
    pub rich_threshold: f64,

    /// Density ratio below which the needle goes one notch leaner
    pub lean_threshold: f64,

    /// Float height the reference setup was built with
    pub float_baseline: Millimeters,

    /// Millimetres of float height change per unit of (1 - ratio)
    pub float_gain: f64,

    /// Dew-point warning fires when humidity is strictly above this
    pub dew_point_humidity: Percent,

    /// ...and temperature strictly below this
    pub dew_point_temperature: Celsius,
}

impl Default for JettingConfig {
    fn default() -> Self {
        Self {
            standard_air_density: standard::AIR_DENSITY,
            jet_exponent: 0.25,
            jet_increment: 2,
            rich_threshold: 1.08,
            lean_threshold: 0.92,
            float_baseline: standard::FLOAT_HEIGHT,
            float_gain: 2.0,
            dew_point_humidity: Percent::new(90.0),
            dew_point_temperature: Celsius::new(10.0),
        }
    }
}
