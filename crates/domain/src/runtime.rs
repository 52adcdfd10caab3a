//! Per-cover runtime bookkeeping and the installation record that owns it.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::{CoverConfig, GlobalConfig};
use crate::decision::MoveCommand;
use crate::error::ValidationError;
use crate::id::{ContextId, CoverId};
use crate::position::Position;
use crate::time::Timestamp;

/// Mutable state of one cover, kept in memory for the lifetime of the process.
///
/// Only `automation_enabled` survives a restart (through persistence); the
/// move bookkeeping always starts empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeCoverState {
    pub automation_enabled: bool,
    /// `None` until the engine has moved the cover once.
    pub last_move_at: Option<Timestamp>,
    pub last_target: Option<Position>,
    /// Causality token of the most recent command.
    pub last_context: Option<ContextId>,
}

impl Default for RuntimeCoverState {
    fn default() -> Self {
        Self {
            automation_enabled: true,
            last_move_at: None,
            last_target: None,
            last_context: None,
        }
    }
}

impl RuntimeCoverState {
    /// Apply the bookkeeping of an issued command.
    pub fn record_move(&mut self, command: &MoveCommand) {
        self.last_move_at = Some(command.issued_at);
        self.last_target = Some(command.target);
        self.last_context = Some(command.context);
    }
}

/// Read-only view of one managed cover.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverStatus {
    pub config: CoverConfig,
    pub runtime: RuntimeCoverState,
}

/// Everything one installation owns: global settings, cover configs and
/// the lazily populated runtime records.
#[derive(Debug, Clone, Default)]
pub struct EntryData {
    global: GlobalConfig,
    covers: BTreeMap<CoverId, CoverConfig>,
    runtime: HashMap<CoverId, RuntimeCoverState>,
}

impl EntryData {
    /// Build the record, rejecting duplicate cover ids and invalid offsets.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateCover`] or an offset range error.
    pub fn new(
        global: GlobalConfig,
        covers: impl IntoIterator<Item = CoverConfig>,
    ) -> Result<Self, ValidationError> {
        global.validate()?;
        let mut map = BTreeMap::new();
        for cover in covers {
            let id = cover.cover_id.clone();
            if map.insert(id.clone(), cover).is_some() {
                return Err(ValidationError::DuplicateCover(id.to_string()));
            }
        }
        Ok(Self {
            global,
            covers: map,
            runtime: HashMap::new(),
        })
    }

    #[must_use]
    pub fn global(&self) -> &GlobalConfig {
        &self.global
    }

    /// Configured covers, ordered by id.
    pub fn covers(&self) -> impl Iterator<Item = &CoverConfig> {
        self.covers.values()
    }

    #[must_use]
    pub fn cover(&self, id: &str) -> Option<&CoverConfig> {
        self.covers.get(id)
    }

    #[must_use]
    pub fn is_managed(&self, id: &str) -> bool {
        self.covers.contains_key(id)
    }

    /// Runtime record of a cover, or the defaults if it was never touched.
    #[must_use]
    pub fn runtime(&self, id: &str) -> RuntimeCoverState {
        self.runtime.get(id).cloned().unwrap_or_default()
    }

    /// Config plus runtime of a managed cover.
    #[must_use]
    pub fn status(&self, id: &str) -> Option<CoverStatus> {
        let config = self.covers.get(id)?;
        Some(CoverStatus {
            config: config.clone(),
            runtime: self.runtime(id),
        })
    }

    /// Status of every managed cover, ordered by id.
    #[must_use]
    pub fn statuses(&self) -> Vec<CoverStatus> {
        self.covers
            .values()
            .map(|config| CoverStatus {
                config: config.clone(),
                runtime: self.runtime(config.cover_id.as_str()),
            })
            .collect()
    }

    /// Mutable runtime record, created with defaults on first access.
    pub fn runtime_mut(&mut self, id: &CoverId) -> &mut RuntimeCoverState {
        self.runtime.entry(id.clone()).or_default()
    }

    /// Config and mutable runtime of one managed cover, borrowed together.
    pub fn cover_and_runtime_mut(
        &mut self,
        id: &str,
    ) -> Option<(&CoverConfig, &mut RuntimeCoverState)> {
        let config = self.covers.get(id)?;
        let runtime = self.runtime.entry(config.cover_id.clone()).or_default();
        Some((config, runtime))
    }

    /// Replace a cover's configuration wholesale; the runtime record is kept.
    pub fn replace_cover(&mut self, config: CoverConfig) {
        self.covers.insert(config.cover_id.clone(), config);
    }

    /// Stop managing a cover. Its runtime record is dropped as well.
    pub fn remove_cover(&mut self, id: &str) -> Option<CoverConfig> {
        self.runtime.remove(id);
        self.covers.remove(id)
    }
}
