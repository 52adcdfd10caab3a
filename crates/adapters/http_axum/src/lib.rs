//! # sunshade-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a small JSON API over the managed covers
//!   (`/api/covers`, `/api/covers/{id}`, `/api/covers/{id}/automation`)
//! - Stream domain events live over Server-Sent Events (`/api/events/stream`)
//! - Map HTTP requests into application service calls (driving adapter)
//!
//! ## Dependency rule
//! Depends on `sunshade-app` (for port traits and services) and `sunshade-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
