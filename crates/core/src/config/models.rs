//! The aggregated configuration of a playground directory.

use ap_protocol::config_models::PlaybackConfig;
use ap_protocol::fixture_models::Fixture;

use crate::fixtures::{FixtureResult, FixtureSet};

/// Everything loaded from `.playground/`.
///
/// # Example
///
/// ```rust,no_run
/// use ap_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("step = {}ms, {} fixture overrides",
///          config.playback.step_ms,
///          config.fixtures.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Pacing settings from `config.toml`.
    pub playback: PlaybackConfig,

    /// Fixtures from `fixtures/*.yaml`, in file name order.
    pub fixtures: Vec<Fixture>,
}

impl AppConfig {
    /// The built-in fixtures with this directory's fixtures layered on top.
    pub fn fixture_set(&self) -> FixtureResult<FixtureSet> {
        let mut set = FixtureSet::builtin()?;
        set.extend(self.fixtures.iter().cloned())?;
        Ok(set)
    }
}
