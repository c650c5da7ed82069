//! Advisory warnings attached after the recommendation is computed

use crate::core_types::conditions::EnvironmentalReading;
use crate::core_types::engine::EngineProfile;
use crate::core_types::units::{Celsius, Percent};
use crate::jetting::config::JettingConfig;
use crate::jetting::result::{JettingResult, Warning};
use tracing::warn;

/// Rules deciding which warnings a result carries.
///
/// Rules run in a fixed order (dew point, then jet range) and only ever append
/// to `warnings`; the recommendations themselves are never touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarningPolicy {
    dew_point_humidity: Percent,
    dew_point_temperature: Celsius,
}

impl WarningPolicy {
    pub fn new(config: &JettingConfig) -> Self {
        Self {
            dew_point_humidity: config.dew_point_humidity,
            dew_point_temperature: config.dew_point_temperature,
        }
    }

    /// Warnings for a recommended jet under the given conditions
    pub fn evaluate(&self, reading: &EnvironmentalReading, main_jet: u32, profile: &EngineProfile) -> Vec<Warning> {
        let mut warnings = Vec::new();

        // Both comparisons strict: 90 % at 9 °C, or 95 % at 10 °C, do not warn.
        if reading.humidity > self.dew_point_humidity && reading.temperature < self.dew_point_temperature {
            warnings.push(Warning::dew_point());
        }

        if !profile.jet_range.contains(main_jet) {
            warnings.push(Warning::jet_range(main_jet));
        }

        for w in &warnings {
            warn!(kind = %w.kind, engine = %profile.name, "{}", w.message);
        }
        warnings
    }

    /// Append this policy's warnings to `result`
    pub fn annotate(&self, mut result: JettingResult, profile: &EngineProfile) -> JettingResult {
        let reading = result.input.reading();
        let warnings = self.evaluate(&reading, result.recommendations.main_jet, profile);
        result.warnings.extend(warnings);
        result
    }
}

impl Default for WarningPolicy {
    fn default() -> Self {
        Self::new(&JettingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::{Hectopascals, Meters};
    use crate::jetting::result::WarningKind;

    fn reading(temperature: f64, humidity: f64) -> EnvironmentalReading {
        EnvironmentalReading::new(
            Celsius::new(temperature),
            Hectopascals::new(1013.0),
            Percent::new(humidity),
            Meters::new(0.0),
        )
    }

    fn kinds(warnings: &[Warning]) -> Vec<WarningKind> {
        warnings.iter().map(|w| w.kind).collect()
    }

    #[test]
    fn test_dew_point_boundaries_are_strict() {
        let policy = WarningPolicy::default();
        let profile = EngineProfile::senior_max_evo();

        assert_eq!(kinds(&policy.evaluate(&reading(5.0, 95.0), 130, &profile)), vec![WarningKind::DewPoint]);
        assert!(policy.evaluate(&reading(5.0, 90.0), 130, &profile).is_empty());
        assert!(policy.evaluate(&reading(10.0, 95.0), 130, &profile).is_empty());
        assert!(policy.evaluate(&reading(9.99, 90.01), 130, &profile).len() == 1);
    }

    #[test]
    fn test_jet_range_bounds_inclusive() {
        let policy = WarningPolicy::default();
        let profile = EngineProfile::senior_max_evo();

        assert!(policy.evaluate(&reading(20.0, 50.0), 124, &profile).is_empty());
        assert!(policy.evaluate(&reading(20.0, 50.0), 136, &profile).is_empty());
        assert_eq!(kinds(&policy.evaluate(&reading(20.0, 50.0), 122, &profile)), vec![WarningKind::JetRange]);
        assert_eq!(kinds(&policy.evaluate(&reading(20.0, 50.0), 138, &profile)), vec![WarningKind::JetRange]);
    }

    #[test]
    fn test_dew_point_comes_first() {
        let policy = WarningPolicy::default();
        let profile = EngineProfile::mini_max();
        let warnings = policy.evaluate(&reading(0.0, 100.0), 150, &profile);
        assert_eq!(kinds(&warnings), vec![WarningKind::DewPoint, WarningKind::JetRange]);
        assert!(warnings[1].message.contains("(150)"));
    }
}
