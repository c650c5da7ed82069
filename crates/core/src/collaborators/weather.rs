//! Sources of current track conditions
//!
//! Real deployments would back [`ConditionsSource`] with a weather service and
//! an elevation model. [`FixedConditionsSource`] answers with fixed sample data
//! and is what the demo and tests use.

use crate::core_types::conditions::EnvironmentalReading;
use crate::core_types::units::{Celsius, Hectopascals, Meters, Percent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, SourceError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(SourceError::InvalidCoordinate {
                field: "latitude",
                value: latitude,
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(SourceError::InvalidCoordinate {
                field: "longitude",
                value: longitude,
            });
        }
        Ok(Self { latitude, longitude })
    }
}

/// A named place returned by a location search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub coordinates: Coordinates,
}

/// Provider of conditions at a location
pub trait ConditionsSource: Send + Sync {
    /// Current temperature, pressure and humidity; altitude is left at zero
    fn current(&self, at: Coordinates) -> Result<EnvironmentalReading, SourceError>;

    /// Ground elevation above sea level
    fn elevation(&self, at: Coordinates) -> Result<Meters, SourceError>;

    /// Places matching a free-text query
    fn search(&self, query: &str) -> Result<Vec<Location>, SourceError>;

    /// Current conditions with the altitude filled in from [`ConditionsSource::elevation`]
    fn reading_at(&self, at: Coordinates) -> Result<EnvironmentalReading, SourceError> {
        let mut reading = self.current(at)?;
        reading.altitude = self.elevation(at)?;
        Ok(reading)
    }
}

/// Source answering every query with the same sample data
#[derive(Debug, Clone, PartialEq)]
pub struct FixedConditionsSource {
    pub reading: EnvironmentalReading,
    pub elevation: Meters,
    pub locations: Vec<Location>,
}

impl Default for FixedConditionsSource {
    fn default() -> Self {
        let track = |name: &str, latitude, longitude| Location {
            name: name.to_string(),
            country: "Sample Country".to_string(),
            coordinates: Coordinates { latitude, longitude },
        };
        Self {
            reading: EnvironmentalReading::new(
                Celsius::new(22.5),
                Hectopascals::new(1013.2),
                Percent::new(65.0),
                Meters::new(0.0),
            ),
            elevation: Meters::new(325.0),
            locations: vec![
                track("Sample Track 1", 40.7128, -74.0060),
                track("Sample Track 2", 34.0522, -118.2437),
            ],
        }
    }
}

impl ConditionsSource for FixedConditionsSource {
    fn current(&self, _at: Coordinates) -> Result<EnvironmentalReading, SourceError> {
        Ok(self.reading)
    }

    fn elevation(&self, _at: Coordinates) -> Result<Meters, SourceError> {
        Ok(self.elevation)
    }

    fn search(&self, query: &str) -> Result<Vec<Location>, SourceError> {
        if query.trim().is_empty() {
            return Err(SourceError::EmptyQuery);
        }
        Ok(self.locations.clone())
    }
}

/// Errors from a conditions source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// Latitude or longitude outside its valid range
    InvalidCoordinate { field: &'static str, value: f64 },
    /// Search query was empty
    EmptyQuery,
    /// The backing service failed
    Unavailable(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::InvalidCoordinate { field, value } => write!(f, "Invalid {field}: {value}"),
            SourceError::EmptyQuery => write!(f, "Search query is required"),
            SourceError::Unavailable(msg) => write!(f, "Conditions source unavailable: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_ranges() {
        assert!(Coordinates::new(0.0, 0.0).is_ok());
        assert!(Coordinates::new(90.0, -180.0).is_ok());
        assert!(matches!(
            Coordinates::new(90.5, 0.0),
            Err(SourceError::InvalidCoordinate { field: "latitude", .. })
        ));
        assert!(matches!(
            Coordinates::new(0.0, f64::NAN),
            Err(SourceError::InvalidCoordinate { field: "longitude", .. })
        ));
    }

    #[test]
    fn test_fixed_source_values() {
        let source = FixedConditionsSource::default();
        let at = Coordinates::new(40.7, -74.0).unwrap();
        let reading = source.reading_at(at).unwrap();
        assert_eq!(*reading.temperature, 22.5);
        assert_eq!(*reading.pressure, 1013.2);
        assert_eq!(*reading.humidity, 65.0);
        assert_eq!(*reading.altitude, 325.0);
    }

    #[test]
    fn test_search() {
        let source = FixedConditionsSource::default();
        assert_eq!(source.search(" "), Err(SourceError::EmptyQuery));
        let found = source.search("sample").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].name, "Sample Track 2");
    }
}
