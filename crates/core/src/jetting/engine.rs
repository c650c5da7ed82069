//! Jetting recommendation engine
//!
//! Converts the ratio of current to reference air density into main jet,
//! needle clip and float height changes. The three rules are exposed as free
//! functions so they can be reasoned about (and tested) in isolation; the
//! [`JettingEngine`] wires them to a profile table and the warning policy.
//!
//! Jet scaling: j₂ = j₁ × (ρ₂/ρ₁)^¼

use crate::core_types::conditions::{EnvironmentalReading, ReferenceConditions, ReferenceSetup};
use crate::core_types::engine::{EngineProfile, NeedlePosition, ProfileTable};
use crate::core_types::units::{KgPerCubicMeter, Millimeters};
use crate::error::JettingError;
use crate::jetting::config::JettingConfig;
use crate::jetting::result::{Calculations, InputEcho, JettingResult, Recommendations};
use crate::jetting::warnings::WarningPolicy;
use crate::validation::JettingRequest;
use tracing::debug;

/// Scale the reference jet by the fourth root of the density ratio and snap to
/// the nearest available size.
///
/// Ties round to the even quotient, see [`snap_to_increment`].
pub fn jet_size(reference_jet: u32, density_ratio: f64, config: &JettingConfig) -> Result<u32, JettingError> {
    let raw = f64::from(reference_jet) * density_ratio.powf(config.jet_exponent);
    snap_to_increment(raw, config.jet_increment)
}

/// Round `value` to the nearest multiple of `increment`, ties to even quotient.
pub fn snap_to_increment(value: f64, increment: u32) -> Result<u32, JettingError> {
    let step = f64::from(increment.max(1));
    let snapped = (value / step).round_ties_even() * step;
    if !snapped.is_finite() || snapped < 0.0 || snapped > f64::from(u32::MAX) {
        return Err(JettingError::Computation {
            quantity: "main_jet",
            value: snapped,
        });
    }
    Ok(snapped as u32)
}

/// Move the needle clip one notch when the density change is large.
///
/// Denser air needs a richer midrange (lower clip number), thinner air a
/// leaner one. Inside the dead band the reference position is kept.
pub fn needle_position(reference: NeedlePosition, density_ratio: f64, config: &JettingConfig) -> NeedlePosition {
    if density_ratio > config.rich_threshold {
        reference.richer()
    } else if density_ratio < config.lean_threshold {
        reference.leaner()
    } else {
        reference
    }
}

/// Float height adjusted linearly with the density ratio, to 0.1 mm.
///
/// Fails when the adjustment would take the float below zero, which takes a
/// density ratio beyond 8.5 with the default gain.
pub fn float_height(
    baseline: Millimeters,
    density_ratio: f64,
    config: &JettingConfig,
) -> Result<Millimeters, JettingError> {
    let height = *baseline + (1.0 - density_ratio) * config.float_gain;
    let rounded = (height * 10.0).round_ties_even() / 10.0;
    if !rounded.is_finite() || rounded < 0.0 {
        return Err(JettingError::Computation {
            quantity: "float_height",
            value: rounded,
        });
    }
    Ok(Millimeters::from(rounded))
}

/// Produces jetting recommendations from a profile table and configuration.
///
/// Immutable after construction and `Sync`, so one engine can serve any number
/// of concurrent requests.
///
/// # Example
/// ```
/// use jetting_core::{EnvironmentalReading, JettingEngine};
///
/// let engine = JettingEngine::default();
/// let result = engine
///     .recommend(&EnvironmentalReading::standard(), "Senior MAX EVO", None, None)
///     .unwrap();
/// assert_eq!(result.recommendations.main_jet, 130);
/// assert_eq!(result.recommendations.needle_type, "K98");
/// ```
#[derive(Debug, Clone, Default)]
pub struct JettingEngine {
    profiles: ProfileTable,
    config: JettingConfig,
    policy: WarningPolicy,
}

impl JettingEngine {
    /// Create an engine from a profile table and configuration
    pub fn new(profiles: ProfileTable, config: JettingConfig) -> Self {
        let policy = WarningPolicy::new(&config);
        Self {
            profiles,
            config,
            policy,
        }
    }

    /// Engine over `profiles` with the default configuration
    pub fn with_profiles(profiles: ProfileTable) -> Self {
        Self::new(profiles, JettingConfig::default())
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn config(&self) -> &JettingConfig {
        &self.config
    }

    /// Resolve the optional reference overrides against a profile.
    ///
    /// The jet falls back to the profile default, the conditions to standard
    /// conditions. Needle position and float height always come from the
    /// profile and the configured baseline.
    pub fn reference_setup(
        &self,
        profile: &EngineProfile,
        reference_jet: Option<u32>,
        reference_conditions: Option<&EnvironmentalReading>,
    ) -> ReferenceSetup {
        ReferenceSetup {
            jet: reference_jet.unwrap_or(profile.default_jet),
            needle_position: profile.default_needle_position,
            float_height: self.config.float_baseline,
            conditions: reference_conditions.map_or(ReferenceConditions::Standard, |c| ReferenceConditions::Measured(*c)),
        }
    }

    /// Air density the reference setup was proven in
    pub fn reference_density(&self, conditions: &ReferenceConditions) -> Result<KgPerCubicMeter, JettingError> {
        match conditions {
            ReferenceConditions::Standard => Ok(self.config.standard_air_density),
            ReferenceConditions::Measured(reading) => reading.air_density(),
        }
    }

    /// Recommend settings for `reading`.
    ///
    /// Unknown engine names use the table's default profile. The reading is
    /// assumed valid; use [`JettingEngine::calculate`] for unchecked input.
    pub fn recommend(
        &self,
        reading: &EnvironmentalReading,
        engine_type: &str,
        reference_jet: Option<u32>,
        reference_conditions: Option<&EnvironmentalReading>,
    ) -> Result<JettingResult, JettingError> {
        let profile = self.profiles.lookup(engine_type);
        let setup = self.reference_setup(profile, reference_jet, reference_conditions);
        self.recommend_from_setup(reading, engine_type, profile, &setup)
    }

    /// Recommend settings relative to an explicit reference setup
    pub fn recommend_from_setup(
        &self,
        reading: &EnvironmentalReading,
        engine_type: &str,
        profile: &EngineProfile,
        setup: &ReferenceSetup,
    ) -> Result<JettingResult, JettingError> {
        let current = reading.air_density()?;
        let reference = self.reference_density(&setup.conditions)?;

        let ratio = current.ratio_to(reference);
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(JettingError::Computation {
                quantity: "density_ratio",
                value: ratio,
            });
        }

        let recommendations = Recommendations {
            main_jet: jet_size(setup.jet, ratio, &self.config)?,
            needle_position: needle_position(setup.needle_position, ratio, &self.config),
            float_height: float_height(setup.float_height, ratio, &self.config)?,
            needle_type: profile.default_needle.clone(),
        };

        debug!(
            engine = %profile.name,
            current_density = *current,
            reference_density = *reference,
            ratio,
            main_jet = recommendations.main_jet,
            needle_position = recommendations.needle_position.value(),
            float_height = *recommendations.float_height,
            "Computed jetting recommendation"
        );

        let result = JettingResult {
            input: InputEcho::new(reading, engine_type),
            calculations: Calculations {
                current_air_density: current,
                reference_air_density: reference,
                density_ratio: ratio,
            },
            recommendations,
            warnings: Vec::new(),
        };
        Ok(self.policy.annotate(result, profile))
    }

    /// Validate a raw request and recommend settings for it.
    ///
    /// # Errors
    /// [`JettingError::InvalidInput`] naming the first bad field, or
    /// [`JettingError::Computation`] if the formulas degenerate.
    pub fn calculate(&self, request: &JettingRequest) -> Result<JettingResult, JettingError> {
        let validated = request.validate()?;
        self.recommend(
            &validated.reading,
            &validated.engine_type,
            validated.reference_jet,
            validated.reference_conditions.as_ref(),
        )
    }

    /// Parse, validate and answer a JSON request body
    pub fn calculate_json(&self, json: &str) -> Result<JettingResult, JettingError> {
        let request = JettingRequest::from_json(json)?;
        self.calculate(&request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::{Celsius, Hectopascals, Meters, Percent};
    use crate::jetting::result::WarningKind;
    use approx::assert_relative_eq;

    fn reading(t: f64, p: f64, h: f64) -> EnvironmentalReading {
        EnvironmentalReading::new(Celsius::new(t), Hectopascals::new(p), Percent::new(h), Meters::new(0.0))
    }

    #[test]
    fn test_jet_size_equal_density() {
        let config = JettingConfig::default();
        assert_eq!(jet_size(130, 1.0, &config).unwrap(), 130);
        assert_eq!(jet_size(128, 1.0, &config).unwrap(), 128);
        // 131 / 2 = 65.5 ties to 66 (even), 133 / 2 = 66.5 ties to 66
        assert_eq!(jet_size(131, 1.0, &config).unwrap(), 132);
        assert_eq!(jet_size(133, 1.0, &config).unwrap(), 132);
    }

    #[test]
    fn test_jet_size_is_always_even() {
        let config = JettingConfig::default();
        for i in 0..200 {
            let ratio = 0.7 + f64::from(i) * 0.003;
            let jet = jet_size(130, ratio, &config).unwrap();
            assert_eq!(jet % 2, 0, "jet {jet} for ratio {ratio}");
        }
    }

    #[test]
    fn test_jet_size_rejects_degenerate_ratio() {
        let config = JettingConfig::default();
        assert!(jet_size(130, f64::INFINITY, &config).is_err());
        assert!(jet_size(130, f64::NAN, &config).is_err());
    }

    #[test]
    fn test_needle_dead_band() {
        let config = JettingConfig::default();
        let two = NeedlePosition::new(2).unwrap();
        assert_eq!(needle_position(two, 1.08, &config), two);
        assert_eq!(needle_position(two, 0.92, &config), two);
        assert_eq!(needle_position(two, 1.09, &config).value(), 1);
        assert_eq!(needle_position(two, 0.91, &config).value(), 3);
        assert_eq!(needle_position(NeedlePosition::RICHEST, 1.5, &config), NeedlePosition::RICHEST);
        assert_eq!(needle_position(NeedlePosition::LEANEST, 0.5, &config), NeedlePosition::LEANEST);
    }

    #[test]
    fn test_float_height() {
        let config = JettingConfig::default();
        let baseline = Millimeters::new(15.0);
        assert_eq!(*float_height(baseline, 1.0, &config).unwrap(), 15.0);
        assert_eq!(*float_height(baseline, 1.09319, &config).unwrap(), 14.8);
        assert_eq!(*float_height(baseline, 0.9, &config).unwrap(), 15.2);
    }

    #[test]
    fn test_float_height_never_negative() {
        let config = JettingConfig::default();
        let baseline = Millimeters::new(15.0);
        assert_eq!(*float_height(baseline, 8.5, &config).unwrap(), 0.0);
        assert!(matches!(
            float_height(baseline, 9.0, &config),
            Err(JettingError::Computation { quantity: "float_height", .. })
        ));
    }

    #[test]
    fn test_extreme_density_ratio_is_computation_error() {
        let engine = JettingEngine::default();
        let thin_reference = reading(0.0, 100.0, 0.0);
        let cold = reading(-60.0, 1100.0, 0.0);
        let result = engine.recommend(&cold, "Senior MAX EVO", None, Some(&thin_reference));
        match result {
            Err(JettingError::Computation { quantity, value }) => {
                assert_eq!(quantity, "float_height");
                assert!(value < 0.0, "float height {value} should be negative");
            }
            other => panic!("expected float height failure, got {other:?}"),
        }
    }

    #[test]
    fn test_standard_reading_against_standard_reference() {
        let engine = JettingEngine::default();
        let result = engine.recommend(&EnvironmentalReading::standard(), "Senior MAX EVO", None, None).unwrap();
        assert_relative_eq!(result.calculations.density_ratio, 1.15676 / 1.157, epsilon = 1e-4);
        assert_eq!(result.recommendations.main_jet, 130);
        assert_eq!(result.recommendations.needle_position.value(), 2);
        assert_eq!(*result.recommendations.float_height, 15.0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_measured_reference_equal_to_current() {
        let engine = JettingEngine::default();
        let today = reading(18.0, 1005.0, 60.0);
        let result = engine.recommend(&today, "Junior MAX EVO", Some(126), Some(&today)).unwrap();
        assert_eq!(result.calculations.density_ratio, 1.0);
        assert_eq!(result.recommendations.main_jet, 126);
        assert_eq!(*result.recommendations.float_height, 15.0);
    }

    #[test]
    fn test_cold_humid_mini_max() {
        let engine = JettingEngine::default();
        let result = engine.recommend(&reading(5.0, 1013.0, 95.0), "Mini MAX", None, None).unwrap();
        assert_relative_eq!(*result.calculations.current_air_density, 1.26482, epsilon = 1e-4);
        assert_eq!(result.recommendations.main_jet, 132);
        assert_eq!(result.recommendations.needle_position.value(), 1);
        assert_eq!(*result.recommendations.float_height, 14.8);
        assert!(result.has_warning(WarningKind::DewPoint));
        assert!(!result.has_warning(WarningKind::JetRange));
    }

    #[test]
    fn test_jet_range_warning_from_large_reference_jet() {
        let engine = JettingEngine::default();
        let result = engine.recommend(&reading(25.0, 1013.0, 50.0), "Senior MAX EVO", Some(150), None).unwrap();
        assert_eq!(result.recommendations.main_jet, 150);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::JetRange);
    }

    #[test]
    fn test_unknown_engine_uses_default_but_echoes_request() {
        let engine = JettingEngine::default();
        let result = engine.recommend(&reading(25.0, 1013.0, 50.0), "Nonexistent Model", None, None).unwrap();
        assert_eq!(result.input.engine_type, "Nonexistent Model");
        assert_eq!(result.recommendations.needle_type, "K98");
    }

    #[test]
    fn test_calculate_rejects_before_computing() {
        let engine = JettingEngine::default();
        let err = engine.calculate(&JettingRequest::new(20.0, 0.0, 50.0, "Mini MAX")).unwrap_err();
        assert!(err.is_bad_request());
    }

    #[test]
    fn test_zero_standard_density_is_computation_error() {
        let config = JettingConfig {
            standard_air_density: KgPerCubicMeter::new(0.0),
            ..JettingConfig::default()
        };
        let engine = JettingEngine::new(ProfileTable::default(), config);
        let err = engine.recommend(&EnvironmentalReading::standard(), "", None, None).unwrap_err();
        assert!(matches!(err, JettingError::Computation { quantity: "density_ratio", .. }));
    }
}
