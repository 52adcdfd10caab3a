//! Automation state repository port — persistence of the per-cover on/off flag.

use std::collections::HashMap;
use std::future::Future;

use sunshade_domain::error::SunshadeError;
use sunshade_domain::id::{CoverId, InstallationId};

/// Repository for the automation-enabled flag of each cover.
///
/// Only this flag is persisted; move bookkeeping starts fresh on every run.
pub trait AutomationStateRepository {
    /// Load every persisted flag of an installation.
    fn load(
        &self,
        installation_id: InstallationId,
    ) -> impl Future<Output = Result<HashMap<CoverId, bool>, SunshadeError>> + Send;

    /// Insert or replace the flag of one cover.
    fn save(
        &self,
        installation_id: InstallationId,
        cover_id: CoverId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), SunshadeError>> + Send;
}

impl<T: AutomationStateRepository + Send + Sync> AutomationStateRepository for std::sync::Arc<T> {
    fn load(
        &self,
        installation_id: InstallationId,
    ) -> impl Future<Output = Result<HashMap<CoverId, bool>, SunshadeError>> + Send {
        (**self).load(installation_id)
    }

    fn save(
        &self,
        installation_id: InstallationId,
        cover_id: CoverId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), SunshadeError>> + Send {
        (**self).save(installation_id, cover_id, enabled)
    }
}
