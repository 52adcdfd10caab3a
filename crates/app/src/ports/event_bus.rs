//! Event bus port — publish/subscribe for domain events.

use std::future::Future;

use sunshade_domain::error::SunshadeError;
use sunshade_domain::event::Event;

/// Publishes domain events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), SunshadeError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), SunshadeError>> + Send {
        (**self).publish(event)
    }
}
