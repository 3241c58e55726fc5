//! Failures while loading a `.playground/` directory.
//!
//! A missing directory, `config.toml` or `fixtures/` folder is not an
//! error: the loader falls back to the built-in playback settings and
//! datasets. Everything here is about files that exist but are unusable.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// `config.toml` or a fixture exists but could not be read.
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `config.toml` is not valid playback settings.
    #[error("Playback settings in {path} do not parse: {source}")]
    SettingsSyntax {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Pacing values that would stall or skip playback, such as `step-ms = 0`.
    #[error("Playback settings in {path} are unusable: {reason}")]
    SettingsOutOfRange { path: PathBuf, reason: String },

    /// The `fixtures/` folder could not be listed.
    #[error("Cannot list dataset fixtures in {path}: {source}")]
    FixtureListing {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// A `fixtures/*.yaml` file is not a dataset fixture.
    #[error("Dataset fixture {path} does not parse: {source}")]
    FixtureSyntax {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The fixture parsed but cannot be played, e.g. a candidate with no duration.
    #[error("Dataset fixture {path} cannot be played: {reason}")]
    FixtureRejected { path: PathBuf, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
