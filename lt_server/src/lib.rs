//! HTTP server for the esports tournament manager.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! build the router directly through [`api::create_router`].

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
