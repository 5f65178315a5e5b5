//! Drink and temperature-level types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal serving temperature: cold(0) < warm(1) < hot(2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureLevel {
    Cold = 0,
    Warm = 1,
    Hot = 2,
}

impl TemperatureLevel {
    pub fn ordinal(self) -> i64 {
        self as i64
    }

    pub fn from_ordinal(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Cold),
            1 => Some(Self::Warm),
            2 => Some(Self::Hot),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Cold => "cold",
            Self::Warm => "warm",
            Self::Hot => "hot",
        }
    }
}

impl fmt::Display for TemperatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown temperature category: {0}")]
pub struct UnknownCategory(pub String);

/// Parses the legacy category strings ("hot", "warm", "cold") as well as
/// ordinals written as text ("0".."2").
impl FromStr for TemperatureLevel {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "cold" | "0" => Ok(Self::Cold),
            "warm" | "1" => Ok(Self::Warm),
            "hot" | "2" => Ok(Self::Hot),
            _ => Err(UnknownCategory(trimmed.to_string())),
        }
    }
}

/// A catalogue entry as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    pub id: i64,
    pub name: String,
    pub level: TemperatureLevel,
}

/// A drink before it has been given an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDrink {
    pub name: String,
    pub level: TemperatureLevel,
}

impl NewDrink {
    pub fn new(name: impl Into<String>, level: TemperatureLevel) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}
