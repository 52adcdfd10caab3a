//! Event — an immutable record of something the controller did or observed.
//!
//! Events are broadcast on the in-process bus; subscribers (the HTTP stream,
//! toggle UIs) reflect them.

use serde::{Deserialize, Serialize};

use crate::id::{ContextId, CoverId, EventId, InstallationId};
use crate::position::Position;
use crate::time::{Timestamp, now};

/// Why automation was switched on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleReason {
    /// An externally caused position change was observed.
    ManualOverride,
    /// Someone flipped the automation switch.
    User,
}

/// Payload of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    AutomationToggled {
        installation_id: InstallationId,
        cover_id: CoverId,
        enabled: bool,
        reason: ToggleReason,
    },
    CoverMoved {
        installation_id: InstallationId,
        cover_id: CoverId,
        target: Position,
        device_position: Position,
        context: ContextId,
    },
}

/// A timestamped, identified event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            timestamp: now(),
            kind,
        }
    }

    #[must_use]
    pub fn automation_toggled(
        installation_id: InstallationId,
        cover_id: CoverId,
        enabled: bool,
        reason: ToggleReason,
    ) -> Self {
        Self::new(EventKind::AutomationToggled {
            installation_id,
            cover_id,
            enabled,
            reason,
        })
    }

    #[must_use]
    pub fn cover_id(&self) -> &CoverId {
        match &self.kind {
            EventKind::AutomationToggled { cover_id, .. }
            | EventKind::CoverMoved { cover_id, .. } => cover_id,
        }
    }
}
