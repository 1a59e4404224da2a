//! Common types and utilities for the TreeDN content-distribution controller.
//!
//! This crate provides the identifiers, wire codec, error type and metrics
//! primitives shared by the controller, its daemon and the operator CLI.

pub mod wire;
pub mod metrics;
pub mod types;
pub mod error;

/// Reexport of common types
pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
