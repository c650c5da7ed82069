//! Moist air density from temperature, station pressure and relative humidity
//!
//! Ideal-gas density of dry air corrected for the partial pressure of water
//! vapour, which is lighter than the nitrogen/oxygen it displaces:
//!
//! ρ = P / (R_d × T) × (1 − 0.378 × e / P)
//!
//! with the saturation vapour pressure from the Magnus-Tetens approximation.
//!
//! # Scientific References
//! - Tetens, O. (1930). "Über einige meteorologische Begriffe"
//!   Zeitschrift für Geophysik, 6, 297-309
//! - Murray, F.W. (1967). "On the computation of saturation vapor pressure"
//!   Journal of Applied Meteorology, 6(1), 203-204
//! - WMO (2008). Guide to Meteorological Instruments and Methods of Observation,
//!   Annex 4.B

use crate::core_types::conditions::EnvironmentalReading;
use crate::core_types::units::{Celsius, Hectopascals, KgPerCubicMeter, Pascals, Percent};
use crate::error::JettingError;

/// Specific gas constant of dry air, J/(kg·K)
pub const R_DRY_AIR: f64 = 287.05;

/// Magnus coefficient: saturation vapour pressure at 0°C (hPa)
const MAGNUS_E0: f64 = 6.1078;
/// Magnus coefficient (dimensionless)
const MAGNUS_A: f64 = 7.5;
/// Magnus coefficient (°C); the formula is singular at -237.3°C
pub const MAGNUS_B: f64 = 237.3;

/// 1 − M_water / M_dry_air
const VAPOR_DENSITY_CORRECTION: f64 = 0.378;

/// Saturation vapour pressure over water (hPa)
///
/// Magnus-Tetens form with base-10 exponent:
/// e_s = 6.1078 × 10^(7.5 T / (237.3 + T))
pub fn saturation_vapor_pressure(temperature: Celsius) -> Hectopascals {
    let t = *temperature;
    Hectopascals::from(MAGNUS_E0 * 10f64.powf((MAGNUS_A * t) / (MAGNUS_B + t)))
}

/// Actual vapour partial pressure (Pa) at the given relative humidity
pub fn vapor_pressure(temperature: Celsius, humidity: Percent) -> Pascals {
    let saturation: Pascals = saturation_vapor_pressure(temperature).into();
    Pascals::from(humidity.to_fraction() * *saturation)
}

/// Moist air density (kg/m³), unchecked.
///
/// Inputs are not validated. Zero pressure or temperatures at or below the
/// Magnus singularity produce infinities or NaN; use [`air_density`] unless the
/// caller has already validated the reading.
pub fn compute_air_density(temperature: Celsius, pressure: Hectopascals, humidity: Percent) -> f64 {
    let temp_kelvin = *temperature.to_kelvin();
    let pressure_pa = *pressure.to_pascals();
    let vapor_pa = *vapor_pressure(temperature, humidity);

    (pressure_pa / (R_DRY_AIR * temp_kelvin)) * (1.0 - VAPOR_DENSITY_CORRECTION * (vapor_pa / pressure_pa))
}

/// Moist air density (kg/m³), rejecting degenerate results.
///
/// # Errors
/// Returns [`JettingError::Computation`] when the formula yields a non-finite or
/// non-positive density.
pub fn air_density(
    temperature: Celsius,
    pressure: Hectopascals,
    humidity: Percent,
) -> Result<KgPerCubicMeter, JettingError> {
    let density = compute_air_density(temperature, pressure, humidity);
    if density.is_finite() && density > 0.0 {
        Ok(KgPerCubicMeter::new(density))
    } else {
        Err(JettingError::Computation {
            quantity: "air_density",
            value: density,
        })
    }
}

impl EnvironmentalReading {
    /// Moist air density for this reading
    ///
    /// # Errors
    /// See [`air_density`].
    pub fn air_density(&self) -> Result<KgPerCubicMeter, JettingError> {
        air_density(self.temperature, self.pressure, self.humidity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn density(t: f64, p: f64, h: f64) -> f64 {
        compute_air_density(Celsius::new(t), Hectopascals::new(p), Percent::new(h))
    }

    #[test]
    fn test_standard_conditions_density() {
        // 99000 / (287.05 × 298.15) = 1.15676
        let rho = density(25.0, 990.0, 0.0);
        assert!((rho - 1.157).abs() / 1.157 < 0.005, "rho was {rho}");
        assert_relative_eq!(rho, 1.156_76, epsilon = 1e-4);
    }

    #[test]
    fn test_saturation_vapor_pressure_known_values() {
        // 6.1078 hPa at 0°C by construction; ≈31.7 hPa at 25°C
        assert_relative_eq!(*saturation_vapor_pressure(Celsius::new(0.0)), 6.1078, epsilon = 1e-9);
        assert_relative_eq!(*saturation_vapor_pressure(Celsius::new(25.0)), 31.67, epsilon = 0.05);
    }

    #[test]
    fn test_vapor_pressure_scales_with_humidity() {
        let t = Celsius::new(20.0);
        let half = *vapor_pressure(t, Percent::new(50.0));
        let full = *vapor_pressure(t, Percent::new(100.0));
        assert_relative_eq!(full, 2.0 * half, epsilon = 1e-9);
        assert_eq!(*vapor_pressure(t, Percent::new(0.0)), 0.0);
    }

    #[test]
    fn test_humid_air_is_lighter() {
        let dry = density(25.0, 1013.0, 0.0);
        let humid = density(25.0, 1013.0, 50.0);
        assert!(humid < dry, "humid {humid} should be below dry {dry}");
        // 25°C, 1013 hPa, 50% RH ≈ 1.1766 kg/m³
        assert_relative_eq!(humid, 1.1766, epsilon = 5e-4);
    }

    #[test]
    fn test_zero_pressure_is_rejected() {
        let result = air_density(Celsius::new(20.0), Hectopascals::new(0.0), Percent::new(50.0));
        assert!(matches!(
            result,
            Err(JettingError::Computation {
                quantity: "air_density",
                ..
            })
        ));
    }

    #[test]
    fn test_below_magnus_singularity_is_rejected() {
        let result = air_density(Celsius::new(-240.0), Hectopascals::new(1013.0), Percent::new(50.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_reading_air_density_matches_free_function() {
        let reading = EnvironmentalReading::standard();
        let rho = reading.air_density().unwrap();
        assert_eq!(*rho, density(25.0, 990.0, 0.0));
    }
}
