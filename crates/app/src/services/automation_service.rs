//! Automation service — the per-cover automation switch.

use sunshade_domain::error::{NotFoundError, SunshadeError};
use sunshade_domain::event::{Event, ToggleReason};
use sunshade_domain::id::{CoverId, InstallationId};
use sunshade_domain::runtime::CoverStatus;

use std::sync::Arc;

use crate::installation::InstallationState;
use crate::ports::{AutomationStateRepository, EventPublisher};

/// Application service for reading and flipping automation flags.
pub struct AutomationService<R, P> {
    installation: Arc<InstallationState>,
    repo: R,
    publisher: P,
}

impl<R, P> AutomationService<R, P>
where
    R: AutomationStateRepository,
    P: EventPublisher,
{
    pub fn new(installation: Arc<InstallationState>, repo: R, publisher: P) -> Self {
        Self {
            installation,
            repo,
            publisher,
        }
    }

    #[must_use]
    pub fn installation_id(&self) -> InstallationId {
        self.installation.id()
    }

    /// Apply persisted flags to the runtime records of configured covers.
    ///
    /// Flags stored for covers that are no longer configured are ignored.
    /// Returns how many flags were applied.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self), fields(installation_id = %self.installation.id()))]
    pub async fn restore(&self) -> Result<usize, SunshadeError> {
        let persisted = self.repo.load(self.installation.id()).await?;
        let applied = self.installation.with_entry_mut(|entry| {
            let mut applied = 0;
            for (cover_id, enabled) in persisted {
                if entry.is_managed(cover_id.as_str()) {
                    entry.runtime_mut(&cover_id).automation_enabled = enabled;
                    applied += 1;
                } else {
                    tracing::debug!(%cover_id, "ignoring persisted flag of unconfigured cover");
                }
            }
            applied
        });
        tracing::info!(applied, "restored automation flags");
        Ok(applied)
    }

    /// Switch automation on or off for one cover.
    ///
    /// Re-enabling has no transition logic; the next tick evaluates the
    /// cover normally.
    ///
    /// # Errors
    ///
    /// Returns [`SunshadeError::NotFound`] when the cover is not managed, or
    /// a storage error when the flag could not be persisted.
    #[tracing::instrument(skip(self), fields(installation_id = %self.installation.id()))]
    pub async fn set_enabled(
        &self,
        cover_id: &str,
        enabled: bool,
        reason: ToggleReason,
    ) -> Result<CoverStatus, SunshadeError> {
        let status = self.installation.with_entry_mut(|entry| {
            let (_, runtime) = entry.cover_and_runtime_mut(cover_id)?;
            runtime.automation_enabled = enabled;
            entry.status(cover_id)
        });
        let status = status.ok_or_else(|| not_found(cover_id))?;
        tracing::info!(enabled, ?reason, "automation toggled");
        self.announce(status.config.cover_id.clone(), enabled, reason)
            .await?;
        Ok(status)
    }

    /// Broadcast and persist a flag that was already applied in memory.
    ///
    /// Subscribers hear about the change even when persisting it fails.
    ///
    /// # Errors
    ///
    /// Returns the publisher's or the repository's error.
    pub async fn announce(
        &self,
        cover_id: CoverId,
        enabled: bool,
        reason: ToggleReason,
    ) -> Result<(), SunshadeError> {
        let installation_id = self.installation.id();
        self.publisher
            .publish(Event::automation_toggled(
                installation_id,
                cover_id.clone(),
                enabled,
                reason,
            ))
            .await?;
        self.repo.save(installation_id, cover_id, enabled).await
    }

    /// Config and runtime view of one managed cover.
    ///
    /// # Errors
    ///
    /// Returns [`SunshadeError::NotFound`] when the cover is not managed.
    pub fn status(&self, cover_id: &str) -> Result<CoverStatus, SunshadeError> {
        self.installation
            .with_entry(|entry| entry.status(cover_id))
            .ok_or_else(|| not_found(cover_id))
    }

    /// Every managed cover, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<CoverStatus> {
        self.installation.with_entry(sunshade_domain::runtime::EntryData::statuses)
    }
}

fn not_found(cover_id: &str) -> SunshadeError {
    NotFoundError {
        entity: "Cover",
        id: cover_id.to_string(),
    }
    .into()
}
