//! Simulated cover motion.

use sunshade_domain::position::Position;
use sunshade_domain::state::{ATTR_CURRENT_POSITION, StateSnapshot};

const STATE_OPEN: &str = "open";
const STATE_CLOSED: &str = "closed";

/// The record of a cover that has just reached `position`.
///
/// Covers move instantly. Attributes other than the position are carried
/// over from the previous record.
pub(crate) fn moved_to(previous: Option<&StateSnapshot>, position: Position) -> StateSnapshot {
    let state = if position == Position::CLOSED {
        STATE_CLOSED
    } else {
        STATE_OPEN
    };
    let mut snapshot = previous.cloned().unwrap_or_else(|| StateSnapshot::new(state));
    state.clone_into(&mut snapshot.state);
    snapshot.with_attribute(ATTR_CURRENT_POSITION, i64::from(position.value()))
}
