//! Weather and season classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Weather states (lowercase) treated as direct sunshine.
pub const DIRECT_SUN_STATES: [&str; 2] = ["sunny", "partlycloudy"];

/// Whether a weather state string means the sun shines directly.
#[must_use]
pub fn is_direct_sun(weather_state: &str) -> bool {
    let state = weather_state.trim().to_lowercase();
    DIRECT_SUN_STATES.contains(&state.as_str())
}

/// Season as reported by the host's season entity.
///
/// Only [`Winter`](Self::Winter) selects a distinct policy; every other
/// season shares the warm-weather rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
    #[default]
    Intermediate,
    #[serde(untagged)]
    Other(String),
}

impl Season {
    #[must_use]
    pub fn from_host_state(state: &str) -> Self {
        match state.trim().to_lowercase().as_str() {
            "winter" => Self::Winter,
            "spring" => Self::Spring,
            "summer" => Self::Summer,
            "autumn" | "fall" => Self::Autumn,
            "" | "intermediate" | "unknown" | "unavailable" => Self::Intermediate,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_winter(&self) -> bool {
        matches!(self, Self::Winter)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winter => f.write_str("winter"),
            Self::Spring => f.write_str("spring"),
            Self::Summer => f.write_str("summer"),
            Self::Autumn => f.write_str("autumn"),
            Self::Intermediate => f.write_str("intermediate"),
            Self::Other(name) => f.write_str(name),
        }
    }
}
