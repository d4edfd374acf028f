//! Shared types and startup configuration.
//!
//! # Invariants
//! - `ModelId` values are never reused within a process.
//! - `Config` is constructed once and passed by reference; there is no global state.

mod config;
mod types;

pub use config::{Config, ConfigError};
pub use types::{ModelId, Rotation, Transform};
