//! `cura-server` exposes the interaction analysis pipeline over HTTP.
//! The index is populated, if empty, before the listener binds.

pub mod config;
pub mod protocol;
pub mod server;
pub mod telemetry;

pub use config::{ChunkerKind, ServerConfig};
pub use server::{AppState, Startup, app_router, run_server};
