//! # ap-core
//!
//! Deterministic playback core for the AutoML playground.
//!
//! This crate provides:
//! - Interpolation and drift synthesis with an injectable random source
//! - Timeline construction from per-entity duration budgets
//! - A cancellable playback scheduler driven by an injectable clock
//! - The six-stage pipeline session and its result cache
//! - The stage engine that ties them together, with cache rehydration
//!
//! ## Modules
//!
//! - [`synthesis`]: Interpolation, Gaussian sampling and the weekly drift series
//! - [`timeline`]: Timeline builder
//! - [`playback`]: Clocks, scheduler and the subscribable playback board
//! - [`session`]: Pipeline session state machine
//! - [`fixtures`]: Fixture lookup and validation
//! - [`config`]: Configuration loading from `.playground/`
//! - [`engine`]: Stage engine and op controller

pub mod config;
pub mod engine;
pub mod fixtures;
pub mod playback;
pub mod session;
pub mod synthesis;
pub mod timeline;
