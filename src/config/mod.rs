//! # Configuration
//!
//! Controller and server settings loaded from environment variables, plus the
//! reserved marker keys the reconciler stamps on managed secrets.

mod controller;
mod env;
mod markers;
mod server;

pub use controller::ControllerConfig;
pub use markers::SyncMarkers;
pub use server::ServerConfig;
