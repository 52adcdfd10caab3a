//! State store port — read access to the host's current entity states.

use std::future::Future;

use sunshade_domain::error::SunshadeError;
use sunshade_domain::state::StateSnapshot;

/// Keyed lookup of host entity states.
///
/// An absent entity is `Ok(None)`, never an error; errors are reserved for
/// a broken connection to the host.
pub trait StateReader {
    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<StateSnapshot>, SunshadeError>> + Send;
}

impl<T: StateReader + Send + Sync> StateReader for std::sync::Arc<T> {
    fn get_state(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<StateSnapshot>, SunshadeError>> + Send {
        (**self).get_state(entity_id)
    }
}
