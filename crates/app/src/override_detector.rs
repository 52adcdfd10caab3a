//! Override detector — turns automation off when someone else moves a cover.
//!
//! Every position change on a managed cover is compared against the
//! causality token of the engine's last command. A change that does not
//! carry that token is a manual override: automation is switched off for the
//! cover, the flag is persisted and one `AutomationToggled` event goes out.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use sunshade_domain::error::SunshadeError;
use sunshade_domain::event::ToggleReason;
use sunshade_domain::overrides::{StateChange, Verdict, classify};

use crate::installation::InstallationState;
use crate::ports::{AutomationStateRepository, EventPublisher};
use crate::services::automation_service::AutomationService;

/// Consumes the host's state-change feed.
pub struct OverrideDetector<R, P> {
    installation: Arc<InstallationState>,
    automation: Arc<AutomationService<R, P>>,
}

impl<R, P> OverrideDetector<R, P>
where
    R: AutomationStateRepository,
    P: EventPublisher,
{
    pub fn new(
        installation: Arc<InstallationState>,
        automation: Arc<AutomationService<R, P>>,
    ) -> Self {
        Self {
            installation,
            automation,
        }
    }

    /// Classify one notification and apply an override if it is one.
    ///
    /// Classification and the flag flip happen under one lock, so a tick
    /// running concurrently either sees the cover enabled with its token
    /// recorded, or disabled.
    ///
    /// # Errors
    ///
    /// Returns the publisher's or the repository's error. The in-memory flag
    /// is already off at that point.
    #[tracing::instrument(skip(self, change), fields(cover_id = %change.entity_id))]
    pub async fn on_state_changed(&self, change: &StateChange) -> Result<Verdict, SunshadeError> {
        let verdict = self.installation.with_entry_mut(|entry| {
            let verdict = classify(entry, change);
            if verdict == Verdict::Override {
                entry.runtime_mut(&change.entity_id).automation_enabled = false;
            }
            verdict
        });

        match verdict {
            Verdict::Ignored(reason) => tracing::trace!(?reason, "ignoring state change"),
            Verdict::SelfCaused => tracing::debug!("own move observed"),
            Verdict::Override => {
                tracing::info!(context = ?change.context, "manual override, disabling automation");
                self.automation
                    .announce(change.entity_id.clone(), false, ToggleReason::ManualOverride)
                    .await?;
            }
        }
        Ok(verdict)
    }

    /// Consume notifications until the feed closes.
    pub async fn run(&self, mut changes: broadcast::Receiver<StateChange>) {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if let Err(err) = self.on_state_changed(&change).await {
                        tracing::error!(
                            cover_id = %change.entity_id,
                            error = %err,
                            "failed to apply override"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "state-change feed lagged, notifications dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::info!("state-change feed closed");
                    break;
                }
            }
        }
    }
}
