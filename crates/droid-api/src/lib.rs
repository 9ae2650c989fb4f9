//! droid-api: HTTP API for Droid
//!
//! REST endpoints over the orchestrator: inspect tools, define agents, tasks
//! and crews, run crews and read the memory history. Built with axum.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::{ApiError, Result};
pub use server::{app, start_server, AppState};
