//! Atmospheric physics feeding the jetting formulas

pub mod air_density;

pub use air_density::{
    air_density, compute_air_density, saturation_vapor_pressure, vapor_pressure, R_DRY_AIR,
};
