//! # sunshade-adapter-virtual
//!
//! Virtual host that stands in for a home-automation platform.
//!
//! It keeps entity records in memory, answers [`StateReader`] lookups, moves
//! simulated covers on [`CoverCommander`] calls and publishes every record
//! change on a broadcast feed, tagged with the causality token that caused
//! it. [`VirtualHost::manual_move`] simulates someone using the wall switch.
//!
//! ## Demo entities
//!
//! | Entity ID | Initial state |
//! |-----------|---------------|
//! | `sun.sun` | `above_horizon`, elevation 35, azimuth 180 |
//! | `season.season` | `summer` |
//! | `sensor.living_room_temperature` | `26.5` |
//! | `cover.living_room` | `open`, position 100 |
//!
//! ## Dependency rule
//!
//! Depends on `sunshade-app` (port traits) and `sunshade-domain` only.

mod cover;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

use sunshade_app::ports::{CoverCommander, StateReader};
use sunshade_domain::error::{NotFoundError, SunshadeError};
use sunshade_domain::id::{ContextId, CoverId};
use sunshade_domain::overrides::StateChange;
use sunshade_domain::position::Position;
use sunshade_domain::state::{ATTR_CURRENT_POSITION, StateSnapshot};

const DEFAULT_FEED_CAPACITY: usize = 256;

/// In-memory host platform.
pub struct VirtualHost {
    states: Mutex<HashMap<String, StateSnapshot>>,
    changes: broadcast::Sender<StateChange>,
}

impl Default for VirtualHost {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl VirtualHost {
    /// Create an empty host whose feed buffers `capacity` notifications.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity);
        Self {
            states: Mutex::new(HashMap::new()),
            changes,
        }
    }

    /// Create a host seeded with the demo entities.
    #[must_use]
    pub fn demo() -> Self {
        Self::default().with_states([
            (
                "sun.sun".to_string(),
                StateSnapshot::new("above_horizon")
                    .with_attribute("elevation", 35.0)
                    .with_attribute("azimuth", 180.0),
            ),
            ("season.season".to_string(), StateSnapshot::new("summer")),
            (
                "sensor.living_room_temperature".to_string(),
                StateSnapshot::new("26.5"),
            ),
            (
                "cover.living_room".to_string(),
                StateSnapshot::new("open").with_attribute(ATTR_CURRENT_POSITION, 100_i64),
            ),
        ])
    }

    /// Seed records without emitting notifications.
    #[must_use]
    pub fn with_states(self, states: impl IntoIterator<Item = (String, StateSnapshot)>) -> Self {
        self.lock_states().extend(states);
        self
    }

    /// Subscribe to record changes made *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Replace a record and notify subscribers.
    pub fn set_state(&self, entity_id: &str, snapshot: StateSnapshot, context: Option<ContextId>) {
        let old = self
            .lock_states()
            .insert(entity_id.to_string(), snapshot.clone());
        self.notify(StateChange {
            entity_id: CoverId::from(entity_id),
            old,
            new: Some(snapshot),
            context,
        });
    }

    /// Move a cover as a person would, under a token of its own.
    ///
    /// # Errors
    ///
    /// Returns [`SunshadeError::NotFound`] when the host has no such cover.
    pub fn manual_move(
        &self,
        cover_id: &str,
        position: Position,
    ) -> Result<ContextId, SunshadeError> {
        let context = ContextId::new();
        self.move_cover(cover_id, position, context)?;
        Ok(context)
    }

    fn move_cover(
        &self,
        cover_id: &str,
        position: Position,
        context: ContextId,
    ) -> Result<(), SunshadeError> {
        let change = {
            let mut states = self.lock_states();
            let Some(old) = states.get(cover_id).cloned() else {
                return Err(NotFoundError {
                    entity: "Cover",
                    id: cover_id.to_string(),
                }
                .into());
            };
            let new = cover::moved_to(Some(&old), position);
            states.insert(cover_id.to_string(), new.clone());
            StateChange {
                entity_id: CoverId::from(cover_id),
                old: Some(old),
                new: Some(new),
                context: Some(context),
            }
        };
        self.notify(change);
        Ok(())
    }

    fn notify(&self, change: StateChange) {
        // send only fails with zero receivers
        let _ = self.changes.send(change);
    }

    fn lock_states(&self) -> std::sync::MutexGuard<'_, HashMap<String, StateSnapshot>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateReader for VirtualHost {
    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<StateSnapshot>, SunshadeError>> + Send {
        let snapshot = self.lock_states().get(entity_id).cloned();
        async { Ok(snapshot) }
    }
}

impl CoverCommander for VirtualHost {
    fn set_position(
        &self,
        cover_id: CoverId,
        position: Position,
        context: ContextId,
    ) -> impl Future<Output = Result<(), SunshadeError>> + Send {
        tracing::debug!(%cover_id, %position, %context, "virtual cover moving");
        let result = self.move_cover(cover_id.as_str(), position, context);
        async { result }
    }
}
