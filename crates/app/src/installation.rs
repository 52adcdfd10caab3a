//! Shared installation state.
//!
//! The tick loop and the state-change listener run as separate tasks and
//! both touch the per-cover runtime records. [`InstallationState`] owns the
//! [`EntryData`] behind a single mutex; callers only get at it through
//! synchronous closures, so the lock can never be held across an `.await`.

use std::sync::{Mutex, PoisonError};

use sunshade_domain::id::InstallationId;
use sunshade_domain::runtime::EntryData;

/// One configured installation and its in-memory runtime records.
#[derive(Debug)]
pub struct InstallationState {
    id: InstallationId,
    entry: Mutex<EntryData>,
}

impl InstallationState {
    #[must_use]
    pub fn new(id: InstallationId, entry: EntryData) -> Self {
        Self {
            id,
            entry: Mutex::new(entry),
        }
    }

    #[must_use]
    pub fn id(&self) -> InstallationId {
        self.id
    }

    /// Run `f` with shared access to the installation record.
    pub fn with_entry<R>(&self, f: impl FnOnce(&EntryData) -> R) -> R {
        let guard = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with exclusive access to the installation record.
    pub fn with_entry_mut<R>(&self, f: impl FnOnce(&mut EntryData) -> R) -> R {
        let mut guard = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
