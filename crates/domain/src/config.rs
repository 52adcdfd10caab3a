//! Installation and per-cover configuration records.
//!
//! Both records are immutable once built; editing a cover replaces its
//! [`CoverConfig`] wholesale. All range and ordering invariants are checked
//! at construction time so the decision engine never sees an inconsistent
//! record.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::CoverId;
use crate::position::Position;

pub const DEFAULT_FOV_HALF: f64 = 70.0;
pub const DEFAULT_DAY: u8 = 60;
pub const DEFAULT_MIN_DAY: u8 = 20;
pub const DEFAULT_MAX_DAY: u8 = 100;
pub const DEFAULT_NIGHT: u8 = 0;
pub const DEFAULT_T_MIN: f64 = 20.0;
pub const DEFAULT_T_MAX: f64 = 24.0;
pub const DEFAULT_MIN_DELTA_POSITION: u8 = 10;
pub const DEFAULT_MIN_DELTA_TIME_SECS: u32 = 300;

const OFFSET_RANGE_MINUTES: (i32, i32) = (-120, 120);

/// Installation-wide settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Weather entity whose state classifies direct sun. `None` means
    /// sun geometry alone is authoritative.
    pub weather_entity: Option<String>,
    /// Minutes added to sunrise. Stored but not yet used by the night gate.
    pub sunrise_offset_minutes: i32,
    /// Minutes added to sunset. Stored but not yet used by the night gate.
    pub sunset_offset_minutes: i32,
}

impl GlobalConfig {
    /// Check the offset ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] when an offset is outside `-120..=120`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_offset("sunrise_offset", self.sunrise_offset_minutes)?;
        check_offset("sunset_offset", self.sunset_offset_minutes)?;
        Ok(())
    }

    /// Weather entity, treating a blank string as "not configured".
    #[must_use]
    pub fn weather_entity(&self) -> Option<&str> {
        self.weather_entity
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

fn check_offset(field: &'static str, value: i32) -> Result<(), ValidationError> {
    let (min, max) = OFFSET_RANGE_MINUTES;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: f64::from(min),
            max: f64::from(max),
            value: f64::from(value),
        })
    }
}

/// Per-cover behaviour. Build through [`CoverConfig::builder`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverConfig {
    pub cover_id: CoverId,
    pub temp_sensor: String,
    /// Compass bearing the window faces, `0..=359`.
    pub window_azimuth: f64,
    /// Degrees either side of the azimuth where the sun counts as "in front".
    pub fov_half: f64,
    pub default_day: Position,
    pub min_day: Position,
    pub max_day: Position,
    pub default_night: Position,
    pub t_min: f64,
    pub t_max: f64,
    pub min_delta_position: u8,
    pub min_delta_time_secs: u32,
    /// The device reports `0 = open, 100 = closed`.
    pub invert_position: bool,
    /// Log every decision for this cover at INFO level.
    pub debug: bool,
}

impl CoverConfig {
    #[must_use]
    pub fn builder() -> CoverConfigBuilder {
        CoverConfigBuilder::default()
    }

    /// Check every range and ordering invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cover_id.is_empty() {
            return Err(ValidationError::EmptyCoverId);
        }
        if self.temp_sensor.trim().is_empty() {
            return Err(ValidationError::EmptyTemperatureSensor {
                cover: self.cover_id.to_string(),
            });
        }
        check_range("window_azimuth", self.window_azimuth, 0.0, 359.0)?;
        check_range("fov_half", self.fov_half, 10.0, 90.0)?;
        check_range("min_position_day", f64::from(self.min_day.value()), 0.0, 99.0)?;
        check_range("max_position_day", f64::from(self.max_day.value()), 1.0, 100.0)?;
        check_range("t_min", self.t_min, 0.0, 40.0)?;
        check_range("t_max", self.t_max, 5.0, 40.0)?;
        check_range(
            "min_delta_position",
            f64::from(self.min_delta_position),
            1.0,
            50.0,
        )?;
        check_range(
            "min_delta_time",
            f64::from(self.min_delta_time_secs),
            30.0,
            3600.0,
        )?;

        if self.min_day > self.max_day {
            return Err(ValidationError::DayRangeInverted {
                min: self.min_day.value(),
                max: self.max_day.value(),
            });
        }
        if self.default_day < self.min_day || self.default_day > self.max_day {
            return Err(ValidationError::DefaultOutsideDayRange {
                default: self.default_day.value(),
                min: self.min_day.value(),
                max: self.max_day.value(),
            });
        }
        if self.t_min >= self.t_max {
            return Err(ValidationError::TemperatureRangeInverted {
                t_min: self.t_min,
                t_max: self.t_max,
            });
        }
        Ok(())
    }

    /// Restrict a position to the daytime range `[min_day, max_day]`.
    #[must_use]
    pub fn clamp(&self, value: Position) -> Position {
        value.max(self.min_day).min(self.max_day)
    }

    /// Translate between the device's native scale and the internal one.
    ///
    /// The mapping is its own inverse, so it serves both directions.
    #[must_use]
    pub fn to_internal(&self, native: Position) -> Position {
        if self.invert_position {
            native.inverted()
        } else {
            native
        }
    }

    /// See [`to_internal`](Self::to_internal).
    #[must_use]
    pub fn to_native(&self, internal: Position) -> Position {
        self.to_internal(internal)
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

/// Step-by-step builder for [`CoverConfig`]; unset fields take the documented defaults.
#[derive(Debug, Default)]
pub struct CoverConfigBuilder {
    cover_id: Option<CoverId>,
    temp_sensor: Option<String>,
    window_azimuth: Option<f64>,
    fov_half: Option<f64>,
    default_day: Option<u8>,
    min_day: Option<u8>,
    max_day: Option<u8>,
    default_night: Option<u8>,
    t_min: Option<f64>,
    t_max: Option<f64>,
    min_delta_position: Option<u8>,
    min_delta_time_secs: Option<u32>,
    invert_position: bool,
    debug: bool,
}

impl CoverConfigBuilder {
    #[must_use]
    pub fn cover_id(mut self, cover_id: impl Into<CoverId>) -> Self {
        self.cover_id = Some(cover_id.into());
        self
    }

    #[must_use]
    pub fn temp_sensor(mut self, entity: impl Into<String>) -> Self {
        self.temp_sensor = Some(entity.into());
        self
    }

    #[must_use]
    pub fn window_azimuth(mut self, degrees: f64) -> Self {
        self.window_azimuth = Some(degrees);
        self
    }

    #[must_use]
    pub fn fov_half(mut self, degrees: f64) -> Self {
        self.fov_half = Some(degrees);
        self
    }

    #[must_use]
    pub fn default_day(mut self, position: u8) -> Self {
        self.default_day = Some(position);
        self
    }

    #[must_use]
    pub fn min_day(mut self, position: u8) -> Self {
        self.min_day = Some(position);
        self
    }

    #[must_use]
    pub fn max_day(mut self, position: u8) -> Self {
        self.max_day = Some(position);
        self
    }

    #[must_use]
    pub fn default_night(mut self, position: u8) -> Self {
        self.default_night = Some(position);
        self
    }

    #[must_use]
    pub fn t_min(mut self, celsius: f64) -> Self {
        self.t_min = Some(celsius);
        self
    }

    #[must_use]
    pub fn t_max(mut self, celsius: f64) -> Self {
        self.t_max = Some(celsius);
        self
    }

    #[must_use]
    pub fn min_delta_position(mut self, percent: u8) -> Self {
        self.min_delta_position = Some(percent);
        self
    }

    #[must_use]
    pub fn min_delta_time_secs(mut self, secs: u32) -> Self {
        self.min_delta_time_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn invert_position(mut self, invert: bool) -> Self {
        self.invert_position = invert;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Consume the builder, validate, and return a [`CoverConfig`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a position exceeds 100 or any
    /// invariant of [`CoverConfig::validate`] fails.
    pub fn build(self) -> Result<CoverConfig, ValidationError> {
        let config = CoverConfig {
            cover_id: self.cover_id.unwrap_or_else(|| CoverId::new("")),
            temp_sensor: self.temp_sensor.unwrap_or_default(),
            window_azimuth: self.window_azimuth.unwrap_or(f64::NAN),
            fov_half: self.fov_half.unwrap_or(DEFAULT_FOV_HALF),
            default_day: Position::new(self.default_day.unwrap_or(DEFAULT_DAY))?,
            min_day: Position::new(self.min_day.unwrap_or(DEFAULT_MIN_DAY))?,
            max_day: Position::new(self.max_day.unwrap_or(DEFAULT_MAX_DAY))?,
            default_night: Position::new(self.default_night.unwrap_or(DEFAULT_NIGHT))?,
            t_min: self.t_min.unwrap_or(DEFAULT_T_MIN),
            t_max: self.t_max.unwrap_or(DEFAULT_T_MAX),
            min_delta_position: self
                .min_delta_position
                .unwrap_or(DEFAULT_MIN_DELTA_POSITION),
            min_delta_time_secs: self
                .min_delta_time_secs
                .unwrap_or(DEFAULT_MIN_DELTA_TIME_SECS),
            invert_position: self.invert_position,
            debug: self.debug,
        };
        config.validate()?;
        Ok(config)
    }
}
