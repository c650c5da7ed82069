//! Carburetor Jetting Core Library
//!
//! Recommends main jet, needle clip position and float height for Rotax MAX
//! kart engines from the air density at the track relative to a known-good
//! reference setup.
//!
//! ## Pipeline
//!
//! - Boundary validation of raw requests ([`validation`])
//! - Moist air density from temperature, pressure and humidity ([`physics`])
//! - Density-ratio jetting rules and advisory warnings ([`jetting`])
//! - Parallel evaluation over a forecast ([`forecast`])
//!
//! Engine profiles are an immutable table injected into the [`JettingEngine`];
//! nothing in this crate holds global state.

// Core types and units
pub mod core_types;
pub mod error;

// Calculation pipeline
pub mod forecast;
pub mod jetting;
pub mod physics;
pub mod validation;

// Saved settings and conditions lookup
pub mod collaborators;

// Re-export core types
pub use core_types::{EngineProfile, JetRange, NeedlePosition, ProfileError, ProfileTable};
pub use core_types::{EnvironmentalReading, ReferenceConditions, ReferenceSetup};
pub use core_types::{Celsius, Hectopascals, KgPerCubicMeter, Meters, Millimeters, Percent};

// Re-export the calculation pipeline
pub use error::JettingError;
pub use forecast::{parse_forecast, ForecastPoint, SessionEntry, SessionPlan};
pub use jetting::{JettingConfig, JettingEngine, JettingResult, Warning, WarningKind};
pub use physics::air_density;
pub use validation::{JettingRequest, ValidatedRequest, ValidationError, ValidationReason};
