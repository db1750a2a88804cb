//! Client-side workflow for batch PDF signature detection: collect a
//! validated batch, submit it to the analysis service, interpret the
//! response, and export the results.

pub mod batch;
pub mod cli;
pub mod client;
pub mod export;
pub mod model;
pub mod orchestrator;
pub mod request;
pub mod store;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
pub mod view;
