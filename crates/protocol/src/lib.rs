//! # ap-protocol
//!
//! Shared data models for automl-playground.
//!
//! This crate defines every structure that crosses the boundary between the
//! playground core and whatever renders it:
//! - Fixture files (YAML) and playback configuration (TOML)
//! - Timelines, entity states and playback snapshots
//! - Drift weeks and stage result objects
//! - Operations and Events for UI-core communication
//!
//! ## Modules
//!
//! - [`config_models`]: Playback pacing settings from config.toml
//! - [`drift_models`]: Simulated production drift
//! - [`fixture_models`]: Precomputed per-dataset fixtures
//! - [`metrics_models`]: Model quality metrics
//! - [`stage_models`]: Stage ids, log entries and stage results
//! - [`timeline_models`]: Timeline events and playback state
//! - [`ipc`]: Operations and Events
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: all types derive `TS` for client compatibility
//! - Independent compilation: no dependencies on other playground crates

pub mod config_models;
pub mod drift_models;
pub mod fixture_models;
pub mod ipc;
pub mod metrics_models;
pub mod stage_models;
pub mod timeline_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use drift_models::*;
pub use fixture_models::*;
pub use ipc::*;
pub use metrics_models::*;
pub use stage_models::*;
pub use timeline_models::*;
