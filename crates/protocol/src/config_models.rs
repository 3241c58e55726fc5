//! Playback configuration models for `.playground/config.toml`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

fn default_step_ms() -> u64 {
    200
}

fn default_max_wait_ms() -> u64 {
    100
}

fn default_champion_pause_ms() -> u64 {
    2000
}

/// Pacing and randomness settings shared by every stage's playback.
///
/// # Example
///
/// ```toml
/// # .playground/config.toml
/// step-ms = 200
/// max-wait-ms = 100
/// champion-pause-ms = 2000
/// seed = 42
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(rename_all = "kebab-case")]
pub struct PlaybackConfig {
    /// Granularity of timeline events, in milliseconds.
    #[serde(default = "default_step_ms")]
    #[ts(type = "number")]
    pub step_ms: u64,

    /// Ceiling on any single inter-event wait, in milliseconds. Longer gaps
    /// in a timeline are compressed to this value during playback.
    #[serde(default = "default_max_wait_ms")]
    #[ts(type = "number")]
    pub max_wait_ms: u64,

    /// Pause between the last training event and the champion reveal.
    #[serde(default = "default_champion_pause_ms")]
    #[ts(type = "number")]
    pub champion_pause_ms: u64,

    /// Seed for drift synthesis. Entropy-seeded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_ms: default_step_ms(),
            max_wait_ms: default_max_wait_ms(),
            champion_pause_ms: default_champion_pause_ms(),
            seed: None,
        }
    }
}
