//! Environment snapshot — everything the decision engine reads for one cover
//! on one tick.
//!
//! Every field is optional: a missing or unparseable host record is a normal
//! outcome that the engine turns into a default or a skipped tick.

use serde::Serialize;

use crate::position::Position;
use crate::state::StateSnapshot;
use crate::sun::{SunReading, SunState};
use crate::weather::Season;

/// State strings meaning "no usable reading".
const UNUSABLE_STATES: [&str; 3] = ["", "unknown", "unavailable"];

/// The cover's own reported state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CoverReading {
    /// Native-scale position from the `current_position` attribute.
    pub position: Option<Position>,
    /// Open/closed state string, used when no position is reported.
    pub state: Option<String>,
}

impl CoverReading {
    #[must_use]
    pub fn from_snapshot(snapshot: &StateSnapshot) -> Self {
        Self {
            position: snapshot.current_position(),
            state: Some(snapshot.state.clone()),
        }
    }

    /// Native position, inferred from the state string when the attribute
    /// is missing (`open`/`opening` → 100, `closed`/`closing` → 0).
    #[must_use]
    pub fn native_position(&self) -> Option<Position> {
        if let Some(position) = self.position {
            return Some(position);
        }
        match self.state.as_deref()? {
            "open" | "opening" => Some(Position::OPEN),
            "closed" | "closing" => Some(Position::CLOSED),
            _ => None,
        }
    }
}

/// Environmental inputs for one evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EnvironmentSnapshot {
    pub sun: Option<SunReading>,
    /// Raw state of the configured weather entity.
    pub weather_state: Option<String>,
    pub season: Option<Season>,
    /// Indoor temperature in °C.
    pub indoor_temperature: Option<f64>,
    pub cover: Option<CoverReading>,
}

/// Raw host records an [`EnvironmentSnapshot`] is assembled from.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvironmentStates<'a> {
    pub sun: Option<&'a StateSnapshot>,
    pub weather: Option<&'a StateSnapshot>,
    pub season: Option<&'a StateSnapshot>,
    pub temperature: Option<&'a StateSnapshot>,
    pub cover: Option<&'a StateSnapshot>,
}

impl EnvironmentSnapshot {
    /// Interpret raw host records.
    ///
    /// A sun record without `elevation`/`azimuth` attributes reads them as `0`.
    #[must_use]
    pub fn from_states(states: EnvironmentStates<'_>) -> Self {
        Self {
            sun: states.sun.map(|sun| SunReading {
                state: SunState::from_host_state(&sun.state),
                elevation: sun.attribute_f64("elevation").unwrap_or(0.0),
                azimuth: sun.attribute_f64("azimuth").unwrap_or(0.0),
            }),
            weather_state: states.weather.map(|weather| weather.state.clone()),
            season: states
                .season
                .map(|season| Season::from_host_state(&season.state)),
            indoor_temperature: states
                .temperature
                .and_then(|sensor| parse_temperature(&sensor.state)),
            cover: states.cover.map(CoverReading::from_snapshot),
        }
    }
}

/// Parse a temperature sensor state. Unusable or non-numeric readings are `None`.
#[must_use]
pub fn parse_temperature(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if UNUSABLE_STATES.contains(&raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}
