//! Enumerations shared by the domain records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CampusError;

/// Course difficulty level.
///
/// Serialized with the names stored in the JSON tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "iniciante")]
    Beginner,
    #[serde(rename = "intermediário")]
    Intermediate,
    #[serde(rename = "avançado")]
    Advanced,
}

impl Level {
    /// All levels, easiest first.
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    /// Name as stored in the tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "iniciante",
            Self::Intermediate => "intermediário",
            Self::Advanced => "avançado",
        }
    }

    /// Menu code (`1`, `2`, `3`).
    pub fn code(&self) -> u8 {
        match self {
            Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = CampusError;

    /// Accepts menu codes, stored names (with or without accents) and
    /// English names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "iniciante" | "beginner" => Ok(Self::Beginner),
            "2" | "intermediário" | "intermediario" | "intermediate" => Ok(Self::Intermediate),
            "3" | "avançado" | "avancado" | "advanced" => Ok(Self::Advanced),
            other => Err(CampusError::validation(format!(
                "unknown level '{}' (expected 1/2/3, iniciante, intermediário or avançado)",
                other
            ))),
        }
    }
}

/// Recognized user genders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "masculino")]
    Male,
    #[serde(rename = "feminino")]
    Female,
}

impl Gender {
    /// Name as stored in the tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "masculino",
            Self::Female => "feminino",
        }
    }

    /// Match a value exactly as written to the tables.
    pub fn from_stored(value: &str) -> Option<Self> {
        [Self::Male, Self::Female]
            .into_iter()
            .find(|g| g.as_str() == value)
    }

    /// Recognize typed input, ignoring case and surrounding spaces.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "masculino" => Some(Self::Male),
            "feminino" => Some(Self::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
