//! Configuration loading.
//!
//! A playground directory may carry a `.playground/` folder with pacing
//! settings and extra fixtures. Everything is optional.

pub mod error;
pub mod loader;
pub mod models;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_config;
pub use models::AppConfig;
