use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressionLevelError {
    #[error("invalid progression level: {0} (expected 1-4)")]
    OutOfRange(i64),

    #[error("unknown progression level: {0}")]
    UnknownName(String),
}

//
// ─── PROGRESSION LEVEL ─────────────────────────────────────────────────────────
//

/// Four-stage progression scale assigned per subcategory per student.
///
/// - `NotYetDeveloped`: the skill has not been observed yet
/// - `Developing`: emerging with substantial adult support
/// - `Established`: shown reliably in familiar settings
/// - `Generalised`: used across people, places and situations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ProgressionLevel {
    #[default]
    NotYetDeveloped,
    Developing,
    Established,
    Generalised,
}

impl ProgressionLevel {
    /// Converts a numeric level (1-4) to a `ProgressionLevel`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionLevelError::OutOfRange` if the value is not in 1-4.
    pub fn from_u8(value: u8) -> Result<Self, ProgressionLevelError> {
        Self::from_i64(i64::from(value))
    }

    /// Converts a stored integer level back into a `ProgressionLevel`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressionLevelError::OutOfRange` if the value is not in 1-4.
    pub fn from_i64(value: i64) -> Result<Self, ProgressionLevelError> {
        match value {
            1 => Ok(Self::NotYetDeveloped),
            2 => Ok(Self::Developing),
            3 => Ok(Self::Established),
            4 => Ok(Self::Generalised),
            other => Err(ProgressionLevelError::OutOfRange(other)),
        }
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::NotYetDeveloped => 1,
            Self::Developing => 2,
            Self::Established => 3,
            Self::Generalised => 4,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotYetDeveloped => "not_yet_developed",
            Self::Developing => "developing",
            Self::Established => "established",
            Self::Generalised => "generalised",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NotYetDeveloped => "Not Yet Developed",
            Self::Developing => "Developing",
            Self::Established => "Established",
            Self::Generalised => "Generalised",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::NotYetDeveloped => {
                "The skill has not yet been observed, even with support."
            }
            Self::Developing => {
                "The skill is emerging and is shown with prompting or adult support."
            }
            Self::Established => {
                "The skill is shown consistently in familiar settings with familiar people."
            }
            Self::Generalised => {
                "The skill is used independently across different people, places and situations."
            }
        }
    }

    /// The next level up, saturating at `Generalised`.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::NotYetDeveloped => Self::Developing,
            Self::Developing => Self::Established,
            Self::Established | Self::Generalised => Self::Generalised,
        }
    }

    #[must_use]
    pub fn all() -> [Self; 4] {
        [
            Self::NotYetDeveloped,
            Self::Developing,
            Self::Established,
            Self::Generalised,
        ]
    }

    /// Zero-based index for per-level count arrays.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.as_u8() - 1)
    }
}

impl fmt::Display for ProgressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ProgressionLevel {
    type Err = ProgressionLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Self::from_i64(n);
        }
        Self::all()
            .into_iter()
            .find(|level| {
                level.as_str().eq_ignore_ascii_case(trimmed)
                    || level.label().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| ProgressionLevelError::UnknownName(trimmed.to_string()))
    }
}

// Levels travel over the wire as their numeric value.
impl Serialize for ProgressionLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for ProgressionLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Self::from_u8(raw).map_err(serde::de::Error::custom)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
