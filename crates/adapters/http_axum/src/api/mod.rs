//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod covers;
pub mod sse;

use axum::Router;
use axum::routing::{get, put};

use sunshade_app::ports::{AutomationStateRepository, EventPublisher};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R, P>() -> Router<AppState<R, P>>
where
    R: AutomationStateRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/covers", get(covers::list::<R, P>))
        .route("/covers/{id}", get(covers::get::<R, P>))
        .route("/covers/{id}/automation", put(covers::set_automation::<R, P>))
        .route("/events/stream", get(sse::stream::<R, P>))
}
