//! Application-level orchestration.
//!
//! Owns the analysis client and serializes submissions: at most one request
//! is in flight at a time. Presentation layers drive it with commands and
//! consume the events it emits.

mod controller;

pub use controller::{run_controller, UiCommand};
