//! Manual override classification.
//!
//! A position change observed on a managed cover is self-caused when it
//! carries the causality token of the engine's last command. Anything else
//! (a different token, or none at all) is a manual override.

use serde::{Deserialize, Serialize};

use crate::id::{ContextId, CoverId};
use crate::runtime::EntryData;
use crate::state::StateSnapshot;

/// A state transition reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub entity_id: CoverId,
    pub old: Option<StateSnapshot>,
    pub new: Option<StateSnapshot>,
    /// Causality token of whatever caused the transition.
    pub context: Option<ContextId>,
}

/// Why a notification was not treated as an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    UnmanagedCover,
    MissingSnapshot,
    MissingPosition,
    PositionUnchanged,
}

/// Classification of one [`StateChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Ignored(IgnoreReason),
    /// Carries the token of the engine's own last command.
    SelfCaused,
    /// Externally caused position change.
    Override,
}

/// Classify a notification against the installation's runtime records.
///
/// Never mutates anything; applying the verdict is the caller's job.
#[must_use]
pub fn classify(entry: &EntryData, change: &StateChange) -> Verdict {
    if !entry.is_managed(change.entity_id.as_str()) {
        return Verdict::Ignored(IgnoreReason::UnmanagedCover);
    }
    let (Some(old), Some(new)) = (&change.old, &change.new) else {
        return Verdict::Ignored(IgnoreReason::MissingSnapshot);
    };
    let (Some(old_position), Some(new_position)) = (old.current_position(), new.current_position())
    else {
        return Verdict::Ignored(IgnoreReason::MissingPosition);
    };
    if old_position == new_position {
        return Verdict::Ignored(IgnoreReason::PositionUnchanged);
    }

    let last_context = entry.runtime(change.entity_id.as_str()).last_context;
    match (last_context, change.context) {
        (Some(last), Some(event)) if last == event => Verdict::SelfCaused,
        _ => Verdict::Override,
    }
}
