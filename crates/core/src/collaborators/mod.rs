//! Interfaces to the systems around the calculator: saved settings and
//! conditions lookup

pub mod settings;
pub mod weather;

pub use settings::{InMemorySettingsStore, NewSetting, SavedSetting, SettingId, SettingsError, SettingsStore, UserId};
pub use weather::{ConditionsSource, Coordinates, FixedConditionsSource, Location, SourceError};
