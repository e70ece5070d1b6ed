//! ClusterSecret Controller Library
//!
//! Distributes a cluster-scoped `ClusterSecret` into every namespace its
//! selector admits and keeps the copies in sync.
//!
//! ## Quick Start
//!
//! ```rust
//! use cluster_secret_controller::prelude::*;
//! ```
//!
//! This brings commonly used types into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod server;
pub mod store;
