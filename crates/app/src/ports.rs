//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the host
//! platform. They are defined here (in `app`) so that both the use-case layer
//! and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod automation_state_repo;
pub mod cover_commander;
pub mod event_bus;
pub mod state_store;

pub use automation_state_repo::AutomationStateRepository;
pub use cover_commander::CoverCommander;
pub use event_bus::EventPublisher;
pub use state_store::StateReader;
