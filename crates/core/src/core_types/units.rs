//! Semantic unit types for type-safe physical quantity handling
//!
//! Newtype wrappers keep the jetting formulas honest about what they are fed:
//! a pressure in hectopascals cannot be passed where pascals are expected, and a
//! humidity percentage cannot be confused with a temperature.
//!
//! # Design Philosophy
//! - All quantities use f64; jetting math is cheap and ratios are sensitive
//! - Implements common traits (Ord, Deref, Display, From) for ergonomic use
//! - Provides explicit conversion methods between related types
//! - Serde support; every unit serializes as its bare number
//! - Total ordering via Ord trait (NaN handled as greater than all values)
//!
//! # Usage
//! ```
//! use jetting_core::core_types::units::{Celsius, Hectopascals, Kelvin};
//!
//! let temp = Celsius::new(25.0);
//! let kelvin: Kelvin = temp.into();
//! assert!((*kelvin - 298.15).abs() < 0.01);
//!
//! let pressure = Hectopascals::new(990.0);
//! assert_eq!(*pressure.to_pascals(), 99000.0);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, Sub};

/// Compare f64 values with total ordering using Rust's built-in `total_cmp`
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Shared boilerplate for f64 newtypes: total ordering, deref to the raw value,
/// and lossless conversions to and from f64.
macro_rules! unit_newtype {
    ($name:ident) => {
        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                f64_total_cmp(self.0, other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl From<f64> for $name {
            fn from(v: f64) -> Self {
                $name(v)
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }

        impl $name {
            /// Get the raw f64 value
            #[inline]
            #[must_use]
            pub fn value(self) -> f64 {
                self.0
            }
        }
    };
}

// ============================================================================
// TEMPERATURE TYPES
// ============================================================================

/// Temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Celsius(f64);

unit_newtype!(Celsius);

impl Celsius {
    /// Absolute zero in Celsius
    pub const ABSOLUTE_ZERO: Celsius = Celsius(-273.15);

    /// Celsius to Kelvin conversion offset (0°C = 273.15 K)
    const CELSIUS_KELVIN_OFFSET: f64 = 273.15;

    /// Create a new Celsius temperature. Asserts value >= absolute zero (-273.15°C).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(
            value >= -Self::CELSIUS_KELVIN_OFFSET,
            "Celsius::new: value is below absolute zero (-273.15°C)"
        );
        Celsius(value)
    }

    /// Convert to Kelvin
    #[inline]
    #[must_use]
    pub fn to_kelvin(self) -> Kelvin {
        Kelvin(self.0 + Self::CELSIUS_KELVIN_OFFSET)
    }
}

impl From<Celsius> for Kelvin {
    fn from(c: Celsius) -> Kelvin {
        c.to_kelvin()
    }
}

// Celsius - Celsius = plain difference in degrees
impl Sub for Celsius {
    type Output = f64;
    fn sub(self, rhs: Celsius) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}°C", self.0)
    }
}

/// Temperature in Kelvin (absolute scale)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kelvin(f64);

unit_newtype!(Kelvin);

impl Kelvin {
    /// Create a new Kelvin temperature. Asserts value >= absolute zero (0 K).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Kelvin::new: value is below absolute zero");
        Kelvin(value)
    }
}

impl fmt::Display for Kelvin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} K", self.0)
    }
}

// ============================================================================
// PRESSURE TYPES
// ============================================================================

/// Pressure in hectopascals (hPa, numerically equal to millibar)
///
/// Weather reports and barometers quote station pressure in hPa, so this is
/// the unit readings arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Hectopascals(f64);

unit_newtype!(Hectopascals);

impl Hectopascals {
    /// Pascals per hectopascal
    const PASCALS_PER_HECTOPASCAL: f64 = 100.0;

    /// ICAO standard sea-level pressure
    pub const SEA_LEVEL: Hectopascals = Hectopascals(1013.25);

    /// Create a new pressure. Asserts value >= 0.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Hectopascals::new: negative pressure is invalid");
        Hectopascals(value)
    }

    /// Convert to Pascals
    #[inline]
    #[must_use]
    pub fn to_pascals(self) -> Pascals {
        Pascals(self.0 * Self::PASCALS_PER_HECTOPASCAL)
    }
}

impl From<Hectopascals> for Pascals {
    fn from(p: Hectopascals) -> Pascals {
        p.to_pascals()
    }
}

impl fmt::Display for Hectopascals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} hPa", self.0)
    }
}

/// Pressure in Pascals (SI)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Pascals(f64);

unit_newtype!(Pascals);

impl Pascals {
    /// Create a new pressure. Asserts value >= 0.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Pascals::new: negative pressure is invalid");
        Pascals(value)
    }
}

impl fmt::Display for Pascals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} Pa", self.0)
    }
}

// ============================================================================
// RATIO TYPES
// ============================================================================

/// Percentage (0-100 for relative humidity)
///
/// Range is not asserted here; the request boundary rejects out-of-range humidity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Percent(f64);

unit_newtype!(Percent);

impl Percent {
    /// Create a new percentage
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Percent(value)
    }

    /// Convert to fraction (0-1)
    #[inline]
    #[must_use]
    pub fn to_fraction(self) -> f64 {
        self.0 / 100.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

// ============================================================================
// DENSITY TYPES
// ============================================================================

/// Density in kg/m³
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct KgPerCubicMeter(f64);

unit_newtype!(KgPerCubicMeter);

impl KgPerCubicMeter {
    /// Density of air at sea level, 15°C
    pub const AIR_SEA_LEVEL: KgPerCubicMeter = KgPerCubicMeter(1.225);

    /// Create a new density. Asserts value >= 0 (non-negative density).
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "KgPerCubicMeter::new: negative density is invalid");
        KgPerCubicMeter(value)
    }

    /// Ratio of this density to a reference density
    #[inline]
    #[must_use]
    pub fn ratio_to(self, reference: KgPerCubicMeter) -> f64 {
        self.0 / reference.0
    }
}

impl fmt::Display for KgPerCubicMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} kg/m³", self.0)
    }
}

// ============================================================================
// LENGTH TYPES
// ============================================================================

/// Distance/elevation in meters
///
/// Signed: elevations below sea level are valid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Meters(f64);

unit_newtype!(Meters);

impl Meters {
    /// Create a new length
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Meters(value)
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} m", self.0)
    }
}

/// Small mechanical length in millimeters (float heights)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Millimeters(f64);

unit_newtype!(Millimeters);

impl Millimeters {
    /// Create a new length. Asserts value >= 0.
    #[inline]
    #[must_use]
    #[track_caller]
    pub const fn new(value: f64) -> Self {
        assert!(value >= 0.0, "Millimeters::new: negative length is invalid");
        Millimeters(value)
    }
}

impl fmt::Display for Millimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} mm", self.0)
    }
}
