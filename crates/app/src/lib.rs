//! # sunshade-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `StateReader` — keyed lookup of host entity states
//!   - `CoverCommander` — best-effort cover move commands
//!   - `EventPublisher` — broadcast of domain events
//!   - `AutomationStateRepository` — persistence of automation flags
//! - Drive the domain:
//!   - `CoverCoordinator` — periodic evaluation and dispatch
//!   - `OverrideDetector` — classification of observed state changes
//!   - `AutomationService` — the per-cover automation switch
//! - Provide **in-process infrastructure** (event bus, shared installation state)
//!
//! ## Dependency rule
//! Depends on `sunshade-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod coordinator;
pub mod event_bus;
pub mod installation;
pub mod override_detector;
pub mod ports;
pub mod services;
