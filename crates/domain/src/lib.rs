//! # sunshade-domain
//!
//! Pure domain model for the sunshade cover controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps, positions
//! - Define **configuration records** (installation-wide and per cover) and
//!   enforce their invariants at construction time
//! - Define **runtime records** (automation flag, last-move bookkeeping)
//! - Interpret host state records into an **environment snapshot**
//! - The **decision engine**: target computation, hysteresis, move commands
//! - **Override classification** of observed state changes by causality token
//! - Define **events** broadcast to subscribers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod config;
pub mod decision;
pub mod environment;
pub mod event;
pub mod overrides;
pub mod position;
pub mod runtime;
pub mod state;
pub mod sun;
pub mod weather;
