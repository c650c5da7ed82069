//! Engine profiles: per-model carburetor defaults and valid jet ranges
//!
//! Profiles are static configuration. A [`ProfileTable`] is built once (from the
//! built-in Rotax MAX data or a JSON document) and then shared read-only by every
//! calculation.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Needle clip position, 1 (richest) to 5 (leanest).
///
/// Moving the clip down a notch raises the needle and richens the midrange;
/// position 1 is the top groove on the Dellorto needles these engines use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct NeedlePosition(u8);

impl NeedlePosition {
    /// Richest clip position
    pub const RICHEST: NeedlePosition = NeedlePosition(1);

    /// Leanest clip position
    pub const LEANEST: NeedlePosition = NeedlePosition(5);

    /// Create a clip position, `None` outside 1-5
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::RICHEST.0 && value <= Self::LEANEST.0 {
            Some(NeedlePosition(value))
        } else {
            None
        }
    }

    /// Get the raw clip number
    #[inline]
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// One notch richer, saturating at position 1
    #[must_use]
    pub fn richer(self) -> Self {
        NeedlePosition(self.0.saturating_sub(1).max(Self::RICHEST.0))
    }

    /// One notch leaner, saturating at position 5
    #[must_use]
    pub fn leaner(self) -> Self {
        NeedlePosition((self.0 + 1).min(Self::LEANEST.0))
    }
}

impl TryFrom<u8> for NeedlePosition {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        NeedlePosition::new(value)
            .ok_or_else(|| format!("needle position must be between 1 and 5, got {value}"))
    }
}

impl From<NeedlePosition> for u8 {
    fn from(p: NeedlePosition) -> u8 {
        p.0
    }
}

impl fmt::Display for NeedlePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive range of main jet sizes considered normal for an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JetRange {
    /// Smallest typical jet
    pub min: u32,
    /// Largest typical jet
    pub max: u32,
}

impl JetRange {
    /// Create a jet range
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Whether `jet` lies within the range, bounds included
    #[inline]
    pub fn contains(&self, jet: u32) -> bool {
        (self.min..=self.max).contains(&jet)
    }
}

impl fmt::Display for JetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Tuning defaults for one engine model
///
/// # Example
/// ```
/// use jetting_core::core_types::engine::ProfileTable;
///
/// let table = ProfileTable::rotax_max();
/// let senior = table.lookup("Senior MAX EVO");
/// assert_eq!(senior.default_jet, 130);
/// assert!(senior.jet_range.contains(130));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineProfile {
    /// Model name, also the lookup key
    pub name: String,

    /// Main jet the engine ships with
    pub default_jet: u32,

    /// Jet sizes considered normal; recommendations outside raise a warning
    pub jet_range: JetRange,

    /// Needle part numbers offered for this carburetor
    pub needle_options: BTreeSet<String>,

    /// Needle fitted by default (one of `needle_options`)
    pub default_needle: String,

    /// Default clip position for `default_needle`
    pub default_needle_position: NeedlePosition,

    /// Volumetric efficiency (0-1)
    ///
    /// Carried for per-engine corrections; the current formulas do not read it.
    pub volumetric_efficiency: f64,
}

impl EngineProfile {
    /// Check the profile's internal invariants
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        if self.jet_range.min > self.jet_range.max {
            return Err(ProfileError::InvertedJetRange {
                profile: self.name.clone(),
                range: self.jet_range,
            });
        }
        if !self.jet_range.contains(self.default_jet) {
            return Err(ProfileError::DefaultJetOutOfRange {
                profile: self.name.clone(),
                jet: self.default_jet,
                range: self.jet_range,
            });
        }
        if !self.needle_options.contains(&self.default_needle) {
            return Err(ProfileError::NeedleNotOffered {
                profile: self.name.clone(),
                needle: self.default_needle.clone(),
            });
        }
        if !(0.0..=1.0).contains(&self.volumetric_efficiency) {
            return Err(ProfileError::VolumetricEfficiency {
                profile: self.name.clone(),
                value: self.volumetric_efficiency,
            });
        }
        Ok(())
    }

    /// Rotax MAX family profile; the three models share carburetor defaults
    /// and differ only in volumetric efficiency.
    fn rotax_max(name: &str, volumetric_efficiency: f64) -> Self {
        Self {
            name: name.to_string(),
            default_jet: 130,
            jet_range: JetRange::new(124, 136),
            needle_options: ["K27", "K98"].into_iter().map(String::from).collect(),
            default_needle: "K98".to_string(),
            default_needle_position: NeedlePosition(2),
            volumetric_efficiency,
        }
    }

    /// Rotax 125 Senior MAX EVO
    pub fn senior_max_evo() -> Self {
        Self::rotax_max(SENIOR_MAX_EVO, 0.91)
    }

    /// Rotax 125 Junior MAX EVO (restricted exhaust)
    pub fn junior_max_evo() -> Self {
        Self::rotax_max(JUNIOR_MAX_EVO, 0.87)
    }

    /// Rotax 125 Mini MAX (restricted inlet)
    pub fn mini_max() -> Self {
        Self::rotax_max(MINI_MAX, 0.58)
    }
}

/// Senior MAX EVO model name, the built-in fallback profile
pub const SENIOR_MAX_EVO: &str = "Senior MAX EVO";
/// Junior MAX EVO model name
pub const JUNIOR_MAX_EVO: &str = "Junior MAX EVO";
/// Mini MAX model name
pub const MINI_MAX: &str = "Mini MAX";

/// JSON layout of a profile table file
#[derive(Debug, Deserialize)]
struct ProfileTableDocument {
    default: String,
    profiles: Vec<EngineProfile>,
}

/// Immutable table of engine profiles keyed by exact model name.
///
/// Lookups of unknown names resolve to a designated default profile instead of
/// failing. The fallback is logged at `warn` level so silent misconfiguration
/// shows up in traces.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: FxHashMap<String, EngineProfile>,
    /// Names in insertion order for stable listings
    order: Vec<String>,
    default_name: String,
}

impl ProfileTable {
    /// Build a table, checking every profile and the default name.
    ///
    /// # Errors
    /// Returns an error if a profile violates its invariants, a name appears
    /// twice, or `default_name` is not in `profiles`.
    pub fn new(
        default_name: impl Into<String>,
        profiles: impl IntoIterator<Item = EngineProfile>,
    ) -> Result<Self, ProfileError> {
        let default_name = default_name.into();
        let mut map = FxHashMap::default();
        let mut order = Vec::new();

        for profile in profiles {
            profile.validate()?;
            if map.contains_key(&profile.name) {
                return Err(ProfileError::DuplicateProfile(profile.name));
            }
            order.push(profile.name.clone());
            map.insert(profile.name.clone(), profile);
        }

        if !map.contains_key(&default_name) {
            return Err(ProfileError::UnknownDefault(default_name));
        }

        Ok(Self {
            profiles: map,
            order,
            default_name,
        })
    }

    /// Built-in Rotax MAX table with Senior MAX EVO as the fallback.
    ///
    /// # Panics
    /// Panics if a built-in profile breaks its own invariants.
    pub fn rotax_max() -> Self {
        let profiles = [
            EngineProfile::senior_max_evo(),
            EngineProfile::junior_max_evo(),
            EngineProfile::mini_max(),
        ];
        match Self::new(SENIOR_MAX_EVO, profiles) {
            Ok(table) => table,
            Err(e) => panic!("ProfileTable::rotax_max: invalid built-in profile: {e}"),
        }
    }

    /// Parse a table from a JSON document of the form
    /// `{"default": "<name>", "profiles": [ ... ]}`.
    ///
    /// # Errors
    /// Returns `ParseFailed` for malformed JSON and the validation errors of
    /// [`ProfileTable::new`] otherwise.
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let document: ProfileTableDocument =
            serde_json::from_str(json).map_err(|e| ProfileError::ParseFailed(e.to_string()))?;
        let table = Self::new(document.default, document.profiles)?;
        info!(
            profiles = table.len(),
            default = %table.default_name,
            "Loaded engine profile table"
        );
        Ok(table)
    }

    /// Load a table from a JSON file
    ///
    /// # Errors
    /// Returns `LoadFailed` if the file cannot be read, otherwise as
    /// [`ProfileTable::from_json`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProfileError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ProfileError::LoadFailed(e.to_string()))?;
        Self::from_json(&contents)
    }

    /// Exact-match lookup
    pub fn get(&self, name: &str) -> Option<&EngineProfile> {
        self.profiles.get(name)
    }

    /// Lookup with fallback to the default profile for unknown names
    pub fn lookup(&self, name: &str) -> &EngineProfile {
        if let Some(profile) = self.profiles.get(name) {
            return profile;
        }
        warn!(
            requested = name,
            fallback = %self.default_name,
            "Unknown engine type, using default profile"
        );
        self.default_profile()
    }

    /// The fallback profile
    pub fn default_profile(&self) -> &EngineProfile {
        // Presence of the default is checked in every constructor.
        &self.profiles[&self.default_name]
    }

    /// Name of the fallback profile
    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Model names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Profiles in table order
    pub fn iter(&self) -> impl Iterator<Item = &EngineProfile> {
        self.order.iter().filter_map(|name| self.profiles.get(name))
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the table holds no profiles (never true for a constructed table)
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::rotax_max()
    }
}

/// Errors that can occur building or loading a profile table
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// A profile has an empty name
    EmptyName,
    /// Range minimum exceeds maximum
    InvertedJetRange { profile: String, range: JetRange },
    /// Default jet lies outside the profile's own range
    DefaultJetOutOfRange {
        profile: String,
        jet: u32,
        range: JetRange,
    },
    /// Default needle is not among the offered needles
    NeedleNotOffered { profile: String, needle: String },
    /// Volumetric efficiency outside 0-1
    VolumetricEfficiency { profile: String, value: f64 },
    /// Two profiles share a name
    DuplicateProfile(String),
    /// Default profile name is not in the table
    UnknownDefault(String),
    /// Failed to read the table file
    LoadFailed(String),
    /// Failed to parse the table document
    ParseFailed(String),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::EmptyName => write!(f, "Engine profile name cannot be empty"),
            ProfileError::InvertedJetRange { profile, range } => {
                write!(f, "Profile '{profile}': jet range {range} is inverted")
            }
            ProfileError::DefaultJetOutOfRange {
                profile,
                jet,
                range,
            } => write!(
                f,
                "Profile '{profile}': default jet {jet} is outside its range {range}"
            ),
            ProfileError::NeedleNotOffered { profile, needle } => write!(
                f,
                "Profile '{profile}': default needle '{needle}' is not in needle_options"
            ),
            ProfileError::VolumetricEfficiency { profile, value } => write!(
                f,
                "Profile '{profile}': volumetric efficiency must be within [0, 1], got {value}"
            ),
            ProfileError::DuplicateProfile(name) => write!(f, "Duplicate engine profile '{name}'"),
            ProfileError::UnknownDefault(name) => {
                write!(f, "Default profile '{name}' is not in the table")
            }
            ProfileError::LoadFailed(msg) => write!(f, "Failed to load profiles: {msg}"),
            ProfileError::ParseFailed(msg) => write!(f, "Failed to parse profiles: {msg}"),
        }
    }
}

impl std::error::Error for ProfileError {}
