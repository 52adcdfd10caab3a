//! Decision engine — computes a cover's target position for one tick and
//! decides whether a move command is warranted.
//!
//! The engine is a pure function of its inputs. It never fails: every
//! missing or ambiguous input degrades either to a default target or to
//! [`Outcome::NotReady`].

use serde::Serialize;

use crate::config::{CoverConfig, GlobalConfig};
use crate::environment::EnvironmentSnapshot;
use crate::id::{ContextId, CoverId};
use crate::position::Position;
use crate::runtime::RuntimeCoverState;
use crate::time::{Timestamp, seconds_between};
use crate::weather::{Season, is_direct_sun};

/// Lower bound of the sunny-winter target.
const WINTER_DIRECT_SUN_FLOOR: u8 = 70;
/// Lower bound of the cloudy warm-season target.
const CLOUDY_FLOOR: u8 = 80;

/// A move the engine wants dispatched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveCommand {
    pub cover_id: CoverId,
    /// Target on the internal scale.
    pub target: Position,
    /// Target translated to the device's native scale.
    pub device_position: Position,
    /// Fresh causality token tagging the command.
    pub context: ContextId,
    pub issued_at: Timestamp,
}

/// What the engine decided for one cover.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Automation is off for this cover.
    Disabled,
    /// The cover's current position could not be determined.
    NotReady,
    /// The previous move is too recent.
    Throttled { elapsed_secs: i64 },
    /// The target is too close to the current position.
    BelowThreshold { delta: u8 },
    Move(MoveCommand),
}

/// Facts that led to the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetTrace {
    pub target: Position,
    pub quiet_hours: bool,
    pub direct_sun: bool,
    pub sun_in_front: bool,
    pub season: Season,
    pub indoor_temperature: Option<f64>,
}

/// Full result of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// `None` when evaluation stopped at the automation gate.
    pub trace: Option<TargetTrace>,
    /// Current position on the internal scale, when known.
    pub current: Option<Position>,
    pub outcome: Outcome,
}

impl Evaluation {
    /// The command to dispatch, if any.
    #[must_use]
    pub fn command(&self) -> Option<&MoveCommand> {
        match &self.outcome {
            Outcome::Move(command) => Some(command),
            _ => None,
        }
    }
}

/// Evaluate one cover for the tick at `now`.
///
/// Runs the automation gate, computes the target, reads the current
/// position and applies both hysteresis guards. On success the returned
/// [`MoveCommand`] carries a fresh [`ContextId`]; the caller applies it with
/// [`RuntimeCoverState::record_move`] before dispatching.
#[must_use]
pub fn evaluate(
    cover: &CoverConfig,
    global: &GlobalConfig,
    env: &EnvironmentSnapshot,
    runtime: &RuntimeCoverState,
    now: Timestamp,
) -> Evaluation {
    if !runtime.automation_enabled {
        return Evaluation {
            trace: None,
            current: None,
            outcome: Outcome::Disabled,
        };
    }

    let trace = compute_target(cover, global, env);
    let current = current_position(cover, env);
    let outcome = match current {
        None => Outcome::NotReady,
        Some(current) => hysteresis(cover, runtime, trace.target, current, now),
    };

    Evaluation {
        trace: Some(trace),
        current,
        outcome,
    }
}

/// Compute the target position from the environment alone.
#[must_use]
pub fn compute_target(
    cover: &CoverConfig,
    global: &GlobalConfig,
    env: &EnvironmentSnapshot,
) -> TargetTrace {
    let season = env.season.clone().unwrap_or_default();
    let indoor_temperature = env.indoor_temperature;

    let Some(sun) = env.sun else {
        return TargetTrace {
            target: cover.clamp(cover.default_day),
            quiet_hours: false,
            direct_sun: false,
            sun_in_front: false,
            season,
            indoor_temperature,
        };
    };

    // TODO: shift this gate by the sunrise/sunset offsets once the sun
    // source exposes next rising/setting times.
    if sun.is_below_horizon() {
        return TargetTrace {
            target: cover.clamp(cover.default_night),
            quiet_hours: true,
            direct_sun: false,
            sun_in_front: false,
            season,
            indoor_temperature,
        };
    }

    let direct_sun = match global.weather_entity() {
        Some(_) => env.weather_state.as_deref().is_some_and(is_direct_sun),
        None => true,
    };
    let sun_in_front = direct_sun && sun.faces(cover.window_azimuth, cover.fov_half);

    let target = if season.is_winter() {
        let wants_solar_gain = sun_in_front && indoor_temperature.is_some_and(|t| t < cover.t_min);
        // cloudy winter days keep the cover fully open as well
        if wants_solar_gain || !direct_sun {
            cover.max_day
        } else {
            cover.default_day.max(Position::saturating(WINTER_DIRECT_SUN_FLOOR.into()))
        }
    } else if sun_in_front && indoor_temperature.is_some_and(|t| t > cover.t_max) {
        cover.min_day
    } else if !direct_sun {
        cover.default_day.max(Position::saturating(CLOUDY_FLOOR.into()))
    } else {
        cover.default_day
    };

    TargetTrace {
        target: cover.clamp(target),
        quiet_hours: false,
        direct_sun,
        sun_in_front,
        season,
        indoor_temperature,
    }
}

/// The cover's current position on the internal scale.
#[must_use]
pub fn current_position(cover: &CoverConfig, env: &EnvironmentSnapshot) -> Option<Position> {
    env.cover
        .as_ref()
        .and_then(|reading| reading.native_position())
        .map(|native| cover.to_internal(native))
}

fn hysteresis(
    cover: &CoverConfig,
    runtime: &RuntimeCoverState,
    target: Position,
    current: Position,
    now: Timestamp,
) -> Outcome {
    if let Some(last_move_at) = runtime.last_move_at {
        let elapsed_secs = seconds_between(last_move_at, now);
        if elapsed_secs < i64::from(cover.min_delta_time_secs) {
            return Outcome::Throttled { elapsed_secs };
        }
    }

    let delta = target.abs_diff(current);
    if delta < cover.min_delta_position {
        return Outcome::BelowThreshold { delta };
    }

    Outcome::Move(MoveCommand {
        cover_id: cover.cover_id.clone(),
        target,
        device_position: cover.to_native(target),
        context: ContextId::new(),
        issued_at: now,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::environment::CoverReading;
    use crate::sun::{SunReading, SunState};
    use crate::time::now;

    fn cover() -> CoverConfig {
        CoverConfig::builder()
            .cover_id("cover.office")
            .temp_sensor("sensor.office_temperature")
            .window_azimuth(180.0)
            .fov_half(45.0)
            .default_day(60)
            .min_day(20)
            .max_day(90)
            .default_night(0)
            .t_min(20.0)
            .t_max(24.0)
            .min_delta_position(10)
            .min_delta_time_secs(300)
            .build()
            .unwrap()
    }

    fn with_weather() -> GlobalConfig {
        GlobalConfig {
            weather_entity: Some("weather.home".to_string()),
            ..GlobalConfig::default()
        }
    }

    fn sun_facing() -> SunReading {
        SunReading {
            state: SunState::AboveHorizon,
            elevation: 35.0,
            azimuth: 175.0,
        }
    }

    fn sun_behind() -> SunReading {
        SunReading {
            state: SunState::AboveHorizon,
            elevation: 35.0,
            azimuth: 20.0,
        }
    }

    fn env(
        sun: SunReading,
        weather: &str,
        season: Season,
        temp: Option<f64>,
    ) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            sun: Some(sun),
            weather_state: Some(weather.to_string()),
            season: Some(season),
            indoor_temperature: temp,
            cover: Some(CoverReading {
                position: Some(Position::saturating(50)),
                state: Some("open".to_string()),
            }),
        }
    }

    fn target(cover: &CoverConfig, global: &GlobalConfig, env: &EnvironmentSnapshot) -> u8 {
        compute_target(cover, global, env).target.value()
    }

    // ── Target computation ─────────────────────────────────────────

    #[test]
    fn should_use_clamped_night_position_below_horizon() {
        let cover = cover();
        let night = SunReading {
            state: SunState::BelowHorizon,
            elevation: -10.0,
            azimuth: 180.0,
        };
        for (weather, season, temp) in [
            ("sunny", Season::Winter, Some(5.0)),
            ("cloudy", Season::Summer, Some(35.0)),
            ("rainy", Season::Intermediate, None),
        ] {
            let trace = compute_target(&cover, &with_weather(), &env(night, weather, season, temp));
            assert!(trace.quiet_hours);
            // default_night 0 clamps up to min_day 20
            assert_eq!(trace.target.value(), 20);
        }
    }

    #[test]
    fn should_open_fully_on_cold_sunny_winter_day() {
        let cover = cover();
        let env = env(sun_facing(), "sunny", Season::Winter, Some(cover.t_min - 1.0));
        assert_eq!(target(&cover, &with_weather(), &env), 90);
    }

    #[test]
    fn should_open_fully_on_cloudy_winter_day() {
        let cover = cover();
        let env = env(sun_facing(), "cloudy", Season::Winter, Some(22.0));
        assert_eq!(target(&cover, &with_weather(), &env), 90);
    }

    #[test]
    fn should_keep_at_least_seventy_on_warm_sunny_winter_day() {
        let cover = cover();
        let env = env(sun_facing(), "sunny", Season::Winter, Some(22.0));
        assert_eq!(target(&cover, &with_weather(), &env), 70);
    }

    #[test]
    fn should_close_to_min_on_hot_summer_day_with_sun_in_front() {
        let cover = cover();
        let env = env(sun_facing(), "sunny", Season::Summer, Some(cover.t_max + 1.0));
        let trace = compute_target(&cover, &with_weather(), &env);
        assert!(trace.sun_in_front);
        assert_eq!(trace.target.value(), 20);
    }

    #[test]
    fn should_keep_default_when_hot_but_sun_behind() {
        let cover = cover();
        let env = env(sun_behind(), "sunny", Season::Summer, Some(30.0));
        assert_eq!(target(&cover, &with_weather(), &env), 60);
    }

    #[test]
    fn should_open_to_eighty_on_cloudy_warm_season_day() {
        let cover = cover();
        let env = env(sun_facing(), "cloudy", Season::Summer, Some(30.0));
        let trace = compute_target(&cover, &with_weather(), &env);
        assert!(!trace.direct_sun);
        assert!(!trace.sun_in_front);
        assert_eq!(trace.target.value(), 80);
    }

    #[test]
    fn should_clamp_cloudy_target_into_day_range() {
        let cover = CoverConfig::builder()
            .cover_id("cover.a")
            .temp_sensor("sensor.t")
            .window_azimuth(180.0)
            .min_day(10)
            .default_day(40)
            .max_day(50)
            .build()
            .unwrap();
        let env = env(sun_facing(), "rainy", Season::Autumn, None);
        assert_eq!(target(&cover, &with_weather(), &env), 50);
    }

    #[test]
    fn should_treat_spring_like_summer() {
        let cover = cover();
        let env = env(sun_facing(), "sunny", Season::Spring, Some(30.0));
        assert_eq!(target(&cover, &with_weather(), &env), 20);
    }

    #[test]
    fn should_assume_direct_sun_without_weather_source() {
        let cover = cover();
        let env = env(sun_facing(), "cloudy", Season::Summer, Some(30.0));
        let trace = compute_target(&cover, &GlobalConfig::default(), &env);
        assert!(trace.direct_sun);
        assert_eq!(trace.target.value(), 20);
    }

    #[test]
    fn should_assume_no_direct_sun_when_weather_record_missing() {
        let cover = cover();
        let mut env = env(sun_facing(), "sunny", Season::Summer, Some(30.0));
        env.weather_state = None;
        let trace = compute_target(&cover, &with_weather(), &env);
        assert!(!trace.direct_sun);
        assert_eq!(trace.target.value(), 80);
    }

    #[test]
    fn should_skip_temperature_branch_when_reading_absent() {
        let cover = cover();
        let env = env(sun_facing(), "sunny", Season::Summer, None);
        assert_eq!(target(&cover, &with_weather(), &env), 60);
    }

    #[test]
    fn should_default_to_intermediate_season() {
        let cover = cover();
        let mut env = env(sun_facing(), "sunny", Season::Winter, Some(10.0));
        env.season = None;
        let trace = compute_target(&cover, &with_weather(), &env);
        assert_eq!(trace.season, Season::Intermediate);
        assert_eq!(trace.target.value(), 60);
    }

    #[test]
    fn should_use_default_day_without_sun_record() {
        let cover = cover();
        let mut env = env(sun_facing(), "sunny", Season::Summer, Some(30.0));
        env.sun = None;
        let trace = compute_target(&cover, &with_weather(), &env);
        assert!(!trace.quiet_hours);
        assert_eq!(trace.target.value(), 60);
    }

    #[test]
    fn should_not_treat_sun_at_horizon_as_in_front() {
        let cover = cover();
        let sun = SunReading {
            elevation: 0.0,
            ..sun_facing()
        };
        let env = env(sun, "sunny", Season::Summer, Some(30.0));
        let trace = compute_target(&cover, &with_weather(), &env);
        assert!(!trace.sun_in_front);
        assert_eq!(trace.target.value(), 60);
    }

    // ── Current position ───────────────────────────────────────────

    #[test]
    fn should_invert_reported_position() {
        let cover = CoverConfig::builder()
            .cover_id("cover.a")
            .temp_sensor("sensor.t")
            .window_azimuth(180.0)
            .invert_position(true)
            .build()
            .unwrap();
        let env = env(sun_facing(), "sunny", Season::Summer, None);
        assert_eq!(current_position(&cover, &env), Some(Position::saturating(50)));

        let mut env = env;
        env.cover = Some(CoverReading {
            position: Some(Position::saturating(30)),
            state: None,
        });
        assert_eq!(current_position(&cover, &env), Some(Position::saturating(70)));
    }

    // ── Full evaluation ────────────────────────────────────────────

    #[test]
    fn should_skip_evaluation_when_automation_disabled() {
        let runtime = RuntimeCoverState {
            automation_enabled: false,
            ..RuntimeCoverState::default()
        };
        let env = env(sun_facing(), "cloudy", Season::Summer, None);
        let evaluation = evaluate(&cover(), &with_weather(), &env, &runtime, now());
        assert_eq!(evaluation.outcome, Outcome::Disabled);
        assert!(evaluation.trace.is_none());
    }

    #[test]
    fn should_report_not_ready_without_cover_position() {
        let mut env = env(sun_facing(), "cloudy", Season::Summer, None);
        env.cover = Some(CoverReading {
            position: None,
            state: Some("unavailable".to_string()),
        });
        let evaluation = evaluate(
            &cover(),
            &with_weather(),
            &env,
            &RuntimeCoverState::default(),
            now(),
        );
        assert_eq!(evaluation.outcome, Outcome::NotReady);
        assert!(evaluation.command().is_none());
    }

    #[test]
    fn should_issue_command_with_fresh_context() {
        let env = env(sun_facing(), "cloudy", Season::Summer, None);
        let ts = now();
        let evaluation = evaluate(
            &cover(),
            &with_weather(),
            &env,
            &RuntimeCoverState::default(),
            ts,
        );
        let command = evaluation.command().unwrap();
        assert_eq!(command.target.value(), 80);
        assert_eq!(command.device_position.value(), 80);
        assert_eq!(command.issued_at, ts);
        assert_eq!(command.cover_id.as_str(), "cover.office");

        let again = evaluate(
            &cover(),
            &with_weather(),
            &env,
            &RuntimeCoverState::default(),
            ts,
        );
        assert_ne!(again.command().unwrap().context, command.context);
    }

    #[test]
    fn should_translate_command_to_native_scale_when_inverted() {
        let cover = CoverConfig::builder()
            .cover_id("cover.a")
            .temp_sensor("sensor.t")
            .window_azimuth(180.0)
            .max_day(90)
            .invert_position(true)
            .build()
            .unwrap();
        // native 50 -> internal 50, cloudy target 80 -> native 20
        let env = env(sun_facing(), "cloudy", Season::Summer, None);
        let evaluation = evaluate(
            &cover,
            &with_weather(),
            &env,
            &RuntimeCoverState::default(),
            now(),
        );
        let command = evaluation.command().unwrap();
        assert_eq!(command.target.value(), 80);
        assert_eq!(command.device_position.value(), 20);
    }

    #[test]
    fn should_throttle_when_last_move_too_recent() {
        let ts = now();
        let runtime = RuntimeCoverState {
            last_move_at: Some(ts - TimeDelta::seconds(299)),
            ..RuntimeCoverState::default()
        };
        // target 20 vs current 50: large delta, still throttled
        let env = env(sun_facing(), "sunny", Season::Summer, Some(30.0));
        let evaluation = evaluate(&cover(), &with_weather(), &env, &runtime, ts);
        assert_eq!(evaluation.outcome, Outcome::Throttled { elapsed_secs: 299 });
    }

    #[test]
    fn should_move_once_min_delta_time_reached() {
        let ts = now();
        let runtime = RuntimeCoverState {
            last_move_at: Some(ts - TimeDelta::seconds(300)),
            ..RuntimeCoverState::default()
        };
        let env = env(sun_facing(), "sunny", Season::Summer, Some(30.0));
        let evaluation = evaluate(&cover(), &with_weather(), &env, &runtime, ts);
        assert!(evaluation.command().is_some());
    }

    #[test]
    fn should_skip_when_delta_below_min_position_delta() {
        // default 60 vs current 51: delta 9 < 10
        let mut env = env(sun_facing(), "sunny", Season::Summer, None);
        env.cover = Some(CoverReading {
            position: Some(Position::saturating(51)),
            state: None,
        });
        let evaluation = evaluate(
            &cover(),
            &with_weather(),
            &env,
            &RuntimeCoverState::default(),
            now(),
        );
        assert_eq!(evaluation.outcome, Outcome::BelowThreshold { delta: 9 });
    }

    #[test]
    fn should_move_when_delta_equals_min_position_delta() {
        // default 60 vs current 50: delta 10 == 10
        let env = env(sun_facing(), "sunny", Season::Summer, None);
        let evaluation = evaluate(
            &cover(),
            &with_weather(),
            &env,
            &RuntimeCoverState::default(),
            now(),
        );
        assert_eq!(evaluation.command().unwrap().target.value(), 60);
    }

    #[test]
    fn should_evaluate_normally_after_reenable() {
        let ts = now();
        let mut runtime = RuntimeCoverState {
            automation_enabled: false,
            last_move_at: Some(ts - TimeDelta::hours(1)),
            ..RuntimeCoverState::default()
        };
        let env = env(sun_facing(), "cloudy", Season::Summer, None);
        assert_eq!(
            evaluate(&cover(), &with_weather(), &env, &runtime, ts).outcome,
            Outcome::Disabled
        );

        runtime.automation_enabled = true;
        let evaluation = evaluate(&cover(), &with_weather(), &env, &runtime, ts);
        assert!(evaluation.command().is_some());
    }
}
