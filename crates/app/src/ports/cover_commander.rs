//! Command channel port — moves covers on the host.

use std::future::Future;

use sunshade_domain::error::SunshadeError;
use sunshade_domain::id::{ContextId, CoverId};
use sunshade_domain::position::Position;

/// Sends move commands to covers.
///
/// Delivery is best-effort and non-blocking: implementations return once the
/// command is handed to the host, without waiting for the cover to move. The
/// resulting position change comes back through the state-change feed tagged
/// with `context`.
pub trait CoverCommander {
    /// Move `cover_id` to `position`, expressed on the device's native scale.
    fn set_position(
        &self,
        cover_id: CoverId,
        position: Position,
        context: ContextId,
    ) -> impl Future<Output = Result<(), SunshadeError>> + Send;
}

impl<T: CoverCommander + Send + Sync> CoverCommander for std::sync::Arc<T> {
    fn set_position(
        &self,
        cover_id: CoverId,
        position: Position,
        context: ContextId,
    ) -> impl Future<Output = Result<(), SunshadeError>> + Send {
        (**self).set_position(cover_id, position, context)
    }
}
