//! Tick coordinator — runs the decision engine over every managed cover.
//!
//! Each tick reads the environment through [`StateReader`], evaluates the
//! cover under the installation lock and records the move there before the
//! command leaves the process. Dispatch is fire-and-forget.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use sunshade_domain::config::{CoverConfig, GlobalConfig};
use sunshade_domain::decision::{Evaluation, MoveCommand, Outcome, evaluate};
use sunshade_domain::environment::{EnvironmentSnapshot, EnvironmentStates};
use sunshade_domain::error::SunshadeError;
use sunshade_domain::event::{Event, EventKind};
use sunshade_domain::id::CoverId;
use sunshade_domain::state::StateSnapshot;
use sunshade_domain::time::{Timestamp, now};

use crate::installation::InstallationState;
use crate::ports::{CoverCommander, EventPublisher, StateReader};

pub const DEFAULT_SUN_ENTITY: &str = "sun.sun";
pub const DEFAULT_SEASON_ENTITY: &str = "season.season";

/// Host entities shared by every cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSources {
    pub sun_entity: String,
    pub season_entity: String,
}

impl Default for EnvironmentSources {
    fn default() -> Self {
        Self {
            sun_entity: DEFAULT_SUN_ENTITY.to_string(),
            season_entity: DEFAULT_SEASON_ENTITY.to_string(),
        }
    }
}

/// Outcome of one cover within a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverOutcome {
    pub cover_id: CoverId,
    pub outcome: Outcome,
}

/// Everything one tick decided, in cover id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub outcomes: Vec<CoverOutcome>,
}

impl TickReport {
    /// Commands issued during the tick.
    pub fn moves(&self) -> impl Iterator<Item = &MoveCommand> {
        self.outcomes.iter().filter_map(|entry| match &entry.outcome {
            Outcome::Move(command) => Some(command),
            _ => None,
        })
    }

    #[must_use]
    pub fn outcome(&self, cover_id: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|entry| entry.cover_id.as_str() == cover_id)
            .map(|entry| &entry.outcome)
    }
}

/// Drives the periodic evaluation of one installation.
pub struct CoverCoordinator<S, C, P> {
    installation: Arc<InstallationState>,
    sources: EnvironmentSources,
    reader: S,
    commander: C,
    publisher: P,
}

impl<S, C, P> CoverCoordinator<S, C, P>
where
    S: StateReader,
    C: CoverCommander,
    P: EventPublisher,
{
    pub fn new(
        installation: Arc<InstallationState>,
        sources: EnvironmentSources,
        reader: S,
        commander: C,
        publisher: P,
    ) -> Self {
        Self {
            installation,
            sources,
            reader,
            commander,
            publisher,
        }
    }

    /// Evaluate every managed cover once.
    #[tracing::instrument(skip(self), fields(installation_id = %self.installation.id()))]
    pub async fn tick(&self, now: Timestamp) -> TickReport {
        let (global, covers) = self.installation.with_entry(|entry| {
            let covers: Vec<(CoverConfig, bool)> = entry
                .covers()
                .map(|cover| {
                    let enabled = entry.runtime(cover.cover_id.as_str()).automation_enabled;
                    (cover.clone(), enabled)
                })
                .collect();
            (entry.global().clone(), covers)
        });

        let mut report = TickReport::default();
        for (cover, enabled) in covers {
            let outcome = if enabled {
                self.tick_cover(&cover, &global, now).await
            } else {
                Outcome::Disabled
            };
            report.outcomes.push(CoverOutcome {
                cover_id: cover.cover_id,
                outcome,
            });
        }
        report
    }

    async fn tick_cover(
        &self,
        cover: &CoverConfig,
        global: &GlobalConfig,
        now: Timestamp,
    ) -> Outcome {
        let env = match self.read_environment(cover, global).await {
            Ok(env) => env,
            Err(err) => {
                tracing::warn!(
                    cover_id = %cover.cover_id,
                    error = %err,
                    "failed to read environment"
                );
                return Outcome::NotReady;
            }
        };

        // Re-evaluated against the live runtime record: the listener may
        // have disabled the cover while the environment was being read.
        let evaluation = self.installation.with_entry_mut(|entry| {
            let global = entry.global().clone();
            let (config, runtime) = entry.cover_and_runtime_mut(cover.cover_id.as_str())?;
            let evaluation = evaluate(config, &global, &env, runtime, now);
            if let Some(command) = evaluation.command() {
                runtime.record_move(command);
            }
            Some(evaluation)
        });
        let Some(evaluation) = evaluation else {
            return Outcome::NotReady;
        };
        log_evaluation(cover, &evaluation);

        if let Outcome::Move(command) = &evaluation.outcome {
            self.dispatch(command).await;
        }
        evaluation.outcome
    }

    async fn read_environment(
        &self,
        cover: &CoverConfig,
        global: &GlobalConfig,
    ) -> Result<EnvironmentSnapshot, SunshadeError> {
        let sun = self.reader.get_state(&self.sources.sun_entity).await?;
        let weather = match global.weather_entity() {
            Some(entity) => self.reader.get_state(entity).await?,
            None => None,
        };
        let season = self.reader.get_state(&self.sources.season_entity).await?;
        let temperature = self.reader.get_state(&cover.temp_sensor).await?;
        let cover_state: Option<StateSnapshot> =
            self.reader.get_state(cover.cover_id.as_str()).await?;

        Ok(EnvironmentSnapshot::from_states(EnvironmentStates {
            sun: sun.as_ref(),
            weather: weather.as_ref(),
            season: season.as_ref(),
            temperature: temperature.as_ref(),
            cover: cover_state.as_ref(),
        }))
    }

    async fn dispatch(&self, command: &MoveCommand) {
        tracing::info!(
            cover_id = %command.cover_id,
            target = %command.target,
            device_position = %command.device_position,
            context = %command.context,
            "moving cover"
        );
        if let Err(err) = self
            .commander
            .set_position(command.cover_id.clone(), command.device_position, command.context)
            .await
        {
            tracing::warn!(cover_id = %command.cover_id, error = %err, "failed to dispatch move");
        }

        let event = Event::new(EventKind::CoverMoved {
            installation_id: self.installation.id(),
            cover_id: command.cover_id.clone(),
            target: command.target,
            device_position: command.device_position,
            context: command.context,
        });
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(
                cover_id = %command.cover_id,
                error = %err,
                "failed to publish move event"
            );
        }
    }

    /// Tick every `period` until the task is dropped.
    ///
    /// The first tick fires immediately. Missed ticks are skipped, so at most
    /// one tick is ever in flight.
    pub async fn run(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let report = self.tick(now()).await;
            tracing::debug!(
                covers = report.outcomes.len(),
                moves = report.moves().count(),
                "tick complete"
            );
        }
    }
}

fn log_evaluation(cover: &CoverConfig, evaluation: &Evaluation) {
    let trace = evaluation.trace.as_ref();
    if cover.debug {
        tracing::info!(
            cover_id = %cover.cover_id,
            target = ?trace.map(|t| t.target),
            current = ?evaluation.current,
            quiet_hours = ?trace.map(|t| t.quiet_hours),
            direct_sun = ?trace.map(|t| t.direct_sun),
            sun_in_front = ?trace.map(|t| t.sun_in_front),
            season = ?trace.map(|t| &t.season),
            indoor_temperature = ?trace.and_then(|t| t.indoor_temperature),
            outcome = ?evaluation.outcome,
            "evaluated cover"
        );
    } else {
        tracing::debug!(
            cover_id = %cover.cover_id,
            target = ?trace.map(|t| t.target),
            current = ?evaluation.current,
            outcome = ?evaluation.outcome,
            "evaluated cover"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;

    use chrono::Duration as ChronoDuration;
    use sunshade_domain::id::{ContextId, InstallationId};
    use sunshade_domain::position::Position;
    use sunshade_domain::runtime::EntryData;
    use sunshade_domain::state::ATTR_CURRENT_POSITION;

    use crate::services::automation_service::tests::SpyPublisher;

    #[derive(Default)]
    struct InMemoryStates {
        states: Mutex<HashMap<String, StateSnapshot>>,
        fail: bool,
    }

    impl InMemoryStates {
        fn set(&self, entity: &str, snapshot: StateSnapshot) {
            self.states
                .lock()
                .unwrap()
                .insert(entity.to_string(), snapshot);
        }
    }

    impl StateReader for InMemoryStates {
        fn get_state(
            &self,
            entity_id: &str,
        ) -> impl Future<Output = Result<Option<StateSnapshot>, SunshadeError>> + Send {
            let result = if self.fail {
                Err(SunshadeError::Storage("host unreachable".into()))
            } else {
                Ok(self.states.lock().unwrap().get(entity_id).cloned())
            };
            async { result }
        }
    }

    /// Records every command together with the token stored at dispatch time.
    struct SpyCommander {
        installation: Arc<InstallationState>,
        sent: Mutex<Vec<(CoverId, Position, ContextId, Option<ContextId>)>>,
        fail: bool,
    }

    impl CoverCommander for SpyCommander {
        fn set_position(
            &self,
            cover_id: CoverId,
            position: Position,
            context: ContextId,
        ) -> impl Future<Output = Result<(), SunshadeError>> + Send {
            let recorded = self
                .installation
                .with_entry(|entry| entry.runtime(cover_id.as_str()).last_context);
            self.sent
                .lock()
                .unwrap()
                .push((cover_id, position, context, recorded));
            let result = if self.fail {
                Err(SunshadeError::Storage("command rejected".into()))
            } else {
                Ok(())
            };
            async { result }
        }
    }

    type TestCoordinator =
        CoverCoordinator<Arc<InMemoryStates>, Arc<SpyCommander>, Arc<SpyPublisher>>;

    struct Harness {
        coordinator: TestCoordinator,
        installation: Arc<InstallationState>,
        states: Arc<InMemoryStates>,
        commander: Arc<SpyCommander>,
        publisher: Arc<SpyPublisher>,
    }

    fn harness_with(cover: CoverConfig, reader_fails: bool, commander_fails: bool) -> Harness {
        let entry = EntryData::new(GlobalConfig::default(), [cover]).unwrap();
        let installation = Arc::new(InstallationState::new(InstallationId::new(), entry));
        let states = Arc::new(InMemoryStates {
            fail: reader_fails,
            ..InMemoryStates::default()
        });
        let commander = Arc::new(SpyCommander {
            installation: installation.clone(),
            sent: Mutex::new(Vec::new()),
            fail: commander_fails,
        });
        let publisher = Arc::new(SpyPublisher::default());
        let coordinator = CoverCoordinator::new(
            installation.clone(),
            EnvironmentSources::default(),
            states.clone(),
            commander.clone(),
            publisher.clone(),
        );
        Harness {
            coordinator,
            installation,
            states,
            commander,
            publisher,
        }
    }

    fn living_room() -> CoverConfig {
        CoverConfig::builder()
            .cover_id("cover.living")
            .temp_sensor("sensor.living")
            .window_azimuth(180.0)
            .build()
            .unwrap()
    }

    fn harness() -> Harness {
        harness_with(living_room(), false, false)
    }

    /// Hot summer afternoon with the sun in front of the window.
    fn seed_hot_sun(states: &InMemoryStates, cover_position: i64) {
        states.set(
            "sun.sun",
            StateSnapshot::new("above_horizon")
                .with_attribute("elevation", 40.0)
                .with_attribute("azimuth", 185.0),
        );
        states.set("season.season", StateSnapshot::new("summer"));
        states.set("sensor.living", StateSnapshot::new("28.5"));
        states.set(
            "cover.living",
            StateSnapshot::new("open").with_attribute(ATTR_CURRENT_POSITION, cover_position),
        );
    }

    #[tokio::test]
    async fn should_move_cover_and_record_token_before_dispatch() {
        let h = harness();
        seed_hot_sun(&h.states, 100);

        let report = h.coordinator.tick(now()).await;

        let moves: Vec<&MoveCommand> = report.moves().collect();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].target, Position::saturating(20));

        let sent = h.commander.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (cover_id, position, context, recorded) = &sent[0];
        assert_eq!(cover_id.as_str(), "cover.living");
        assert_eq!(*position, Position::saturating(20));
        assert_eq!(*recorded, Some(*context));

        let runtime = h.installation.with_entry(|entry| entry.runtime("cover.living"));
        assert_eq!(runtime.last_target, Some(Position::saturating(20)));
        assert!(runtime.last_move_at.is_some());

        let events = h.publisher.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].kind, EventKind::CoverMoved { .. }));
    }

    #[tokio::test]
    async fn should_skip_disabled_cover_without_reading_environment() {
        let h = harness_with(living_room(), true, false);
        h.installation.with_entry_mut(|entry| {
            entry
                .runtime_mut(&CoverId::from("cover.living"))
                .automation_enabled = false;
        });

        let report = h.coordinator.tick(now()).await;

        assert_eq!(report.outcome("cover.living"), Some(&Outcome::Disabled));
        assert!(h.commander.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_throttle_second_tick_within_min_delta_time() {
        let h = harness();
        seed_hot_sun(&h.states, 100);
        let start = now();
        h.coordinator.tick(start).await;

        // Someone else moved it back meanwhile; the time guard still holds.
        seed_hot_sun(&h.states, 100);
        let report = h.coordinator.tick(start + ChronoDuration::seconds(60)).await;

        assert!(matches!(
            report.outcome("cover.living"),
            Some(Outcome::Throttled { elapsed_secs: 60 })
        ));
        assert_eq!(h.commander.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_not_move_when_delta_below_threshold() {
        let h = harness();
        seed_hot_sun(&h.states, 25);

        let report = h.coordinator.tick(now()).await;

        assert!(matches!(
            report.outcome("cover.living"),
            Some(Outcome::BelowThreshold { delta: 5 })
        ));
        assert!(h.commander.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_report_not_ready_when_cover_position_unknown() {
        let h = harness();
        seed_hot_sun(&h.states, 100);
        h.states
            .set("cover.living", StateSnapshot::new("unavailable"));

        let report = h.coordinator.tick(now()).await;

        assert_eq!(report.outcome("cover.living"), Some(&Outcome::NotReady));
    }

    #[tokio::test]
    async fn should_degrade_to_not_ready_when_reader_fails() {
        let h = harness_with(living_room(), true, false);

        let report = h.coordinator.tick(now()).await;

        assert_eq!(report.outcome("cover.living"), Some(&Outcome::NotReady));
        assert!(h.commander.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_keep_bookkeeping_when_dispatch_fails() {
        let h = harness_with(living_room(), false, true);
        seed_hot_sun(&h.states, 100);

        let report = h.coordinator.tick(now()).await;

        assert_eq!(report.moves().count(), 1);
        assert_eq!(h.commander.sent.lock().unwrap().len(), 1);
        let runtime = h.installation.with_entry(|entry| entry.runtime("cover.living"));
        assert!(runtime.last_context.is_some());
    }

    #[tokio::test]
    async fn should_send_inverted_device_position() {
        let cover = CoverConfig::builder()
            .cover_id("cover.living")
            .temp_sensor("sensor.living")
            .window_azimuth(180.0)
            .invert_position(true)
            .build()
            .unwrap();
        let h = harness_with(cover, false, false);
        // Native 0 reads as internal 100 once inverted.
        seed_hot_sun(&h.states, 0);

        h.coordinator.tick(now()).await;

        let sent = h.commander.sent.lock().unwrap();
        assert_eq!(sent[0].1, Position::saturating(80));
    }
}
