//! Server-Sent Events (SSE) stream for real-time updates.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use sunshade_app::ports::{AutomationStateRepository, EventPublisher};

use crate::state::AppState;

/// `GET /api/events/stream` — SSE stream of domain events.
///
/// Each event is sent as a JSON `data:` frame named after its kind
/// (`automation_toggled`, `cover_moved`). The stream continues until the
/// client disconnects or the event bus is closed.
pub async fn stream<R, P>(
    State(state): State<AppState<R, P>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    R: AutomationStateRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_value(&event) {
            Ok(json) => {
                let name = json["type"].as_str().unwrap_or("event").to_string();
                Some(Ok(Event::default().event(name).data(json.to_string())))
            }
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event to JSON for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some events were dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
