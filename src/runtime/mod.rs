//! # Runtime
//!
//! Controller runtime wiring.
//!
//! - `initialization`: rustls, tracing, metrics, probe server, client setup
//! - `watch_loop`: controller and trigger streams
//! - `error_policy`: requeue policy and stream error logging

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult};
pub use watch_loop::run_watch_loop;
