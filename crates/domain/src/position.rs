//! Cover position on the internal `0 = closed, 100 = open` scale.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A cover position in percent, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Position(u8);

impl Position {
    pub const CLOSED: Self = Self(0);
    pub const OPEN: Self = Self(100);

    /// Build a position, rejecting values above 100.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] when `value > 100`.
    pub fn new(value: u8) -> Result<Self, ValidationError> {
        if value > 100 {
            return Err(ValidationError::OutOfRange {
                field: "position",
                min: 0.0,
                max: 100.0,
                value: f64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Build a position from any integer, saturating into `0..=100`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn saturating(value: i64) -> Self {
        // clamp guarantees the cast is lossless
        Self(value.clamp(0, 100) as u8)
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Mirror the position on the scale (`100 - p`).
    #[must_use]
    pub fn inverted(self) -> Self {
        Self(100 - self.0)
    }

    /// Absolute distance between two positions.
    #[must_use]
    pub fn abs_diff(self, other: Self) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl TryFrom<u8> for Position {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Position> for u8 {
    fn from(value: Position) -> Self {
        value.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_values_above_hundred() {
        assert!(Position::new(101).is_err());
        assert_eq!(Position::new(100).unwrap(), Position::OPEN);
    }

    #[test]
    fn should_saturate_out_of_range_integers() {
        assert_eq!(Position::saturating(-40), Position::CLOSED);
        assert_eq!(Position::saturating(250), Position::OPEN);
        assert_eq!(Position::saturating(42).value(), 42);
    }

    #[test]
    fn should_invert_around_fifty() {
        assert_eq!(Position::saturating(30).inverted().value(), 70);
        assert_eq!(Position::CLOSED.inverted(), Position::OPEN);
        assert_eq!(Position::saturating(30).inverted().inverted().value(), 30);
    }

    #[test]
    fn should_compute_symmetric_distance() {
        let a = Position::saturating(20);
        let b = Position::saturating(55);
        assert_eq!(a.abs_diff(b), 35);
        assert_eq!(b.abs_diff(a), 35);
    }

    #[test]
    fn should_reject_out_of_range_value_when_deserializing() {
        assert!(serde_json::from_str::<Position>("120").is_err());
        let pos: Position = serde_json::from_str("75").unwrap();
        assert_eq!(pos.value(), 75);
    }

    #[test]
    fn should_display_as_percent() {
        assert_eq!(Position::saturating(60).to_string(), "60%");
    }
}
