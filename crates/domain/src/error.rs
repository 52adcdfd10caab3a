//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`SunshadeError`] via `#[from]` (no `String` variants).

/// Top-level error crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum SunshadeError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// Failure inside an adapter (database, host connection, …).
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A configuration record violates a domain invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("cover id must not be empty")]
    EmptyCoverId,

    #[error("temperature sensor must not be empty for {cover}")]
    EmptyTemperatureSensor { cover: String },

    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("day range is inverted: min {min} > max {max}")]
    DayRangeInverted { min: u8, max: u8 },

    #[error("default day position {default} is outside {min}..={max}")]
    DefaultOutsideDayRange { default: u8, min: u8, max: u8 },

    #[error("temperature thresholds must satisfy t_min < t_max, got {t_min} >= {t_max}")]
    TemperatureRangeInverted { t_min: f64, t_max: f64 },

    #[error("cover {0} is configured more than once")]
    DuplicateCover(String),
}

/// A lookup targeted something that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
