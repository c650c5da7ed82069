//! Error type for jetting calculations

use crate::core_types::engine::ProfileError;
use crate::validation::ValidationError;
use std::fmt;

/// Errors that can occur while producing a jetting recommendation
#[derive(Debug, Clone, PartialEq)]
pub enum JettingError {
    /// The request failed boundary validation (caller fault)
    InvalidInput(ValidationError),
    /// A formula produced a non-finite or non-physical value
    Computation {
        /// Name of the quantity being computed
        quantity: &'static str,
        /// The offending value
        value: f64,
    },
    /// The profile table could not be built or loaded
    Profile(ProfileError),
}

impl JettingError {
    /// Whether the error is the caller's fault ("bad request") rather than an
    /// internal failure
    pub fn is_bad_request(&self) -> bool {
        matches!(self, JettingError::InvalidInput(_))
    }
}

impl fmt::Display for JettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JettingError::InvalidInput(err) => write!(f, "Invalid input: {err}"),
            JettingError::Computation { quantity, value } => {
                write!(f, "Computation of {quantity} produced {value}")
            }
            JettingError::Profile(err) => write!(f, "Profile error: {err}"),
        }
    }
}

impl std::error::Error for JettingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JettingError::InvalidInput(err) => Some(err),
            JettingError::Profile(err) => Some(err),
            JettingError::Computation { .. } => None,
        }
    }
}

impl From<ValidationError> for JettingError {
    fn from(err: ValidationError) -> Self {
        JettingError::InvalidInput(err)
    }
}

impl From<ProfileError> for JettingError {
    fn from(err: ProfileError) -> Self {
        JettingError::Profile(err)
    }
}
