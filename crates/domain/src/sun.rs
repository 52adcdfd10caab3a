//! Sun geometry.

use serde::{Deserialize, Serialize};

/// State string the host uses when the sun has set.
pub const BELOW_HORIZON: &str = "below_horizon";

/// Whether the sun is up, as reported by the host's sun entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunState {
    AboveHorizon,
    BelowHorizon,
}

impl SunState {
    /// Anything other than `below_horizon` counts as daytime.
    #[must_use]
    pub fn from_host_state(state: &str) -> Self {
        if state == BELOW_HORIZON {
            Self::BelowHorizon
        } else {
            Self::AboveHorizon
        }
    }
}

/// Current sun position and up/down state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunReading {
    pub state: SunState,
    /// Degrees above the horizon; negative below.
    pub elevation: f64,
    /// Compass bearing in degrees.
    pub azimuth: f64,
}

impl SunReading {
    #[must_use]
    pub fn is_below_horizon(&self) -> bool {
        self.state == SunState::BelowHorizon
    }

    /// Sun is up and within `fov_half` degrees of the window's bearing.
    #[must_use]
    pub fn faces(&self, window_azimuth: f64, fov_half: f64) -> bool {
        self.elevation > 0.0 && angular_diff(self.azimuth, window_azimuth) <= fov_half
    }
}

/// Minimal absolute difference between two compass bearings, in `0..=180`.
#[must_use]
pub fn angular_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).abs() % 360.0;
    if d <= 180.0 { d } else { 360.0 - d }
}
