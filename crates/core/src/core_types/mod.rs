//! Core types: units, readings, reference setups and engine profiles

pub mod conditions;
pub mod engine;
pub mod units;

pub use conditions::{standard, EnvironmentalReading, ReferenceConditions, ReferenceSetup};
pub use engine::{EngineProfile, JetRange, NeedlePosition, ProfileError, ProfileTable};
pub use units::*;
