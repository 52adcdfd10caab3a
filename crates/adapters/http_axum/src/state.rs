//! Shared application state for axum handlers.

use std::sync::Arc;

use sunshade_app::event_bus::InProcessEventBus;
use sunshade_app::services::automation_service::AutomationService;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone` — only the `Arc` wrappers are cloned.
pub struct AppState<R, P> {
    /// Cover status and automation switch.
    pub automation_service: Arc<AutomationService<R, P>>,
    /// Event bus the SSE stream subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<R, P> Clone for AppState<R, P> {
    fn clone(&self) -> Self {
        Self {
            automation_service: Arc::clone(&self.automation_service),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<R, P> AppState<R, P> {
    /// Create a new application state from pre-wrapped `Arc` services.
    ///
    /// The service is shared with the override detector, hence the `Arc`.
    pub fn new(
        automation_service: Arc<AutomationService<R, P>>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            automation_service,
            event_bus,
        }
    }
}
