//! # Controller
//!
//! Core controller modules for the ClusterSecret controller.
//!
//! - `admission`: Defaulting and validation shared by admission and tooling
//! - `reconciler`: Core reconciliation logic
//! - `selector`: Namespace selector engine

pub mod admission;
pub mod reconciler;
pub mod selector;
