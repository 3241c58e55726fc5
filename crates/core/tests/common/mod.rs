//! Common test utilities for the stage integration tests.
//!
//! This module provides:
//! - Engines and controllers wired to the built-in fixtures
//! - Event collection helpers
//! - Custom assertions over snapshots and event streams

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
