//! Jetting recommendations: formulas, engine, warnings and result types

pub mod config;
pub mod engine;
pub mod result;
pub mod warnings;

pub use config::JettingConfig;
pub use engine::{float_height, jet_size, needle_position, snap_to_increment, JettingEngine};
pub use result::{Calculations, InputEcho, JettingResult, Recommendations, Warning, WarningKind};
pub use warnings::WarningPolicy;
