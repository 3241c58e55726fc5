//! Configuration file loader for the `.playground/` directory.
//!
//! This module loads:
//! - `config.toml`: playback pacing and the optional synthesis seed
//! - `fixtures/*.yaml`: dataset fixtures that add to or replace the built-ins

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use crate::fixtures::validate_fixture;
use ap_protocol::config_models::PlaybackConfig;
use ap_protocol::fixture_models::Fixture;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".playground";

/// Loads all configuration from the `.playground/` directory.
///
/// # Arguments
///
/// * `root` - Directory containing the `.playground/` folder
///
/// # Returns
///
/// An `AppConfig`. A missing directory or missing files yield defaults
/// rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid TOML or YAML syntax
/// - A value cannot drive playback (zero step, fixture with no entities, ...)
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let config_dir = root.join(CONFIG_DIR);

    if !config_dir.exists() {
        debug!(path = %config_dir.display(), "no config directory, using defaults");
        return Ok(AppConfig::default());
    }

    let playback = load_playback_config(&config_dir)?;
    let fixtures = load_fixtures(&config_dir)?;
    info!(
        step_ms = playback.step_ms,
        fixtures = fixtures.len(),
        "loaded playground configuration"
    );

    Ok(AppConfig { playback, fixtures })
}

/// Loads playback settings from `config.toml`.
fn load_playback_config(config_dir: &Path) -> ConfigResult<PlaybackConfig> {
    let config_path = config_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(PlaybackConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Unreadable {
            path: config_path.clone(),
            source,
        })?;

    let config: PlaybackConfig =
        toml::from_str(&content).map_err(|source| ConfigError::SettingsSyntax {
            path: config_path.clone(),
            source,
        })?;

    if config.step_ms == 0 {
        return Err(ConfigError::SettingsOutOfRange {
            path: config_path,
            reason: "step-ms must be positive".to_string(),
        });
    }

    Ok(config)
}

/// Loads all fixtures from `fixtures/*.yaml`, sorted by file name.
fn load_fixtures(config_dir: &Path) -> ConfigResult<Vec<Fixture>> {
    let fixtures_dir = config_dir.join("fixtures");

    if !fixtures_dir.exists() {
        return Ok(Vec::new());
    }

    let mut fixtures = Vec::new();

    for entry in WalkDir::new(&fixtures_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::FixtureListing {
            path: fixtures_dir.clone(),
            source,
        })?;

        let path = entry.path();

        let ext = path.extension().and_then(|s| s.to_str());
        if ext != Some("yaml") && ext != Some("yml") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let fixture: Fixture =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::FixtureSyntax {
                path: path.to_path_buf(),
                source,
            })?;

        validate_fixture(&fixture).map_err(|e| ConfigError::FixtureRejected {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), dataset_id = fixture.id(), "loaded fixture");
        fixtures.push(fixture);
    }

    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::FixtureProvider;
    use std::fs;
    use tempfile::tempdir;

    const STORE_FIXTURE: &str = r#"dataset:
  id: store-demand
  name: Retail Demand Forecasting
  domain: retail
  task-type: time-series
  rows: 45000
  features: 15
objectives:
  - id: demand-forecast
    label: Forecast demand
    target-column: sales
    metric: rmse
drift:
  healthy: { accuracy: 0.9, precision: 0.8, recall: 0.7, f1: 0.75, auc: 0.92 }
  critical: { accuracy: 0.7, precision: 0.6, recall: 0.5, f1: 0.55, auc: 0.78 }
  features: [sales, dcoilwtico]
  retraining:
    old_metrics: { accuracy: 0.7, precision: 0.6, recall: 0.5, f1: 0.55, auc: 0.78 }
    new_metrics: { accuracy: 0.91, precision: 0.81, recall: 0.72, f1: 0.76, auc: 0.93 }
    improvement: 19.2
profiling:
  quality-score: 79
  modules:
    - name: Data Shape & Types
      duration-ms: 1500
      insight: { id: ins-1, text: Three years across 10 stores., kind: info }
patterns:
  cluster-count: 4
  anomaly-count: 89
  anomaly-percent: 0.2
  phases:
    - name: Cluster analysis
      duration-ms: 2500
      insight: { id: pat-1, text: Weekday demand is the baseline., kind: info }
models:
  champion: LightGBM
  candidates:
    - name: LightGBM
      duration-ms: 3000
      metrics: { accuracy: 0.9, precision: 0.8, recall: 0.7, f1: 0.75, auc: 0.92 }
"#;

    fn playground_dir(root: &Path) -> std::path::PathBuf {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(dir.join("fixtures")).expect("Failed to create fixtures dir");
        dir
    }

    #[tokio::test]
    async fn test_load_config_acceptance() {
        let dir = tempdir().expect("Failed to create temp dir");
        let pg_dir = playground_dir(dir.path());

        fs::write(
            pg_dir.join("config.toml"),
            "step-ms = 100\nmax-wait-ms = 50\nchampion-pause-ms = 0\nseed = 7\n",
        )
        .expect("Failed to write config.toml");
        fs::write(pg_dir.join("fixtures/store-demand.yaml"), STORE_FIXTURE)
            .expect("Failed to write fixture");
        fs::write(pg_dir.join("fixtures/README.md"), "not a fixture")
            .expect("Failed to write readme");

        let config = load_config(dir.path()).await.expect("Failed to load config");

        assert_eq!(config.playback.step_ms, 100);
        assert_eq!(config.playback.max_wait_ms, 50);
        assert_eq!(config.playback.champion_pause_ms, 0);
        assert_eq!(config.playback.seed, Some(7));

        assert_eq!(config.fixtures.len(), 1);
        let store = &config.fixtures[0];
        assert_eq!(store.id(), "store-demand");
        assert_eq!(store.models.champion, "LightGBM");
        assert_eq!(store.validation.week_duration_ms, 400);

        let set = config.fixture_set().expect("Failed to merge fixtures");
        assert_eq!(
            set.dataset_ids(),
            vec!["credit-fraud", "store-demand", "telco-churn"]
        );
    }

    #[tokio::test]
    async fn test_load_config_empty_directory() {
        let dir = tempdir().expect("Failed to create temp dir");

        let config = load_config(dir.path())
            .await
            .expect("Should handle missing .playground");

        assert_eq!(config.playback, PlaybackConfig::default());
        assert!(config.fixtures.is_empty());
    }

    #[tokio::test]
    async fn test_load_config_partial() {
        let dir = tempdir().expect("Failed to create temp dir");
        let pg_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&pg_dir).expect("Failed to create config dir");
        fs::write(pg_dir.join("config.toml"), "seed = 42").expect("Failed to write config.toml");

        let config = load_config(dir.path()).await.expect("Failed to load config");

        assert_eq!(config.playback.step_ms, 200);
        assert_eq!(config.playback.max_wait_ms, 100);
        assert_eq!(config.playback.seed, Some(42));
        assert!(config.fixtures.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let pg_dir = playground_dir(dir.path());
        fs::write(pg_dir.join("config.toml"), "step-ms = \"fast\"")
            .expect("Failed to write config.toml");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::SettingsSyntax { .. })));
    }

    #[tokio::test]
    async fn test_zero_step_is_invalid() {
        let dir = tempdir().expect("Failed to create temp dir");
        let pg_dir = playground_dir(dir.path());
        fs::write(pg_dir.join("config.toml"), "step-ms = 0").expect("Failed to write config.toml");

        let err = load_config(dir.path()).await.unwrap_err();
        assert!(matches!(err, ConfigError::SettingsOutOfRange { .. }));
        let message = err.to_string();
        assert!(message.starts_with("Playback settings in"), "message was: {}", message);
        assert!(message.contains("config.toml"), "message was: {}", message);
        assert!(message.contains("step-ms must be positive"), "message was: {}", message);
    }

    #[tokio::test]
    async fn test_invalid_yaml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let pg_dir = playground_dir(dir.path());
        fs::write(pg_dir.join("fixtures/broken.yaml"), "dataset: [unclosed")
            .expect("Failed to write fixture");

        let result = load_config(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::FixtureSyntax { .. })));
    }

    #[tokio::test]
    async fn test_fixture_with_zero_duration_is_invalid() {
        let dir = tempdir().expect("Failed to create temp dir");
        let pg_dir = playground_dir(dir.path());
        fs::write(
            pg_dir.join("fixtures/store-demand.yaml"),
            STORE_FIXTURE.replace("duration-ms: 3000", "duration-ms: 0"),
        )
        .expect("Failed to write fixture");

        match load_config(dir.path()).await {
            Err(ConfigError::FixtureRejected { reason, .. }) => {
                assert!(reason.contains("LightGBM"), "reason was: {}", reason);
            }
            other => panic!("Expected FixtureRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_override_replaces_builtin() {
        let dir = tempdir().expect("Failed to create temp dir");
        let pg_dir = playground_dir(dir.path());
        fs::write(
            pg_dir.join("fixtures/telco.yaml"),
            STORE_FIXTURE.replace("id: store-demand", "id: telco-churn"),
        )
        .expect("Failed to write fixture");

        let config = load_config(dir.path()).await.expect("Failed to load config");
        let set = config.fixture_set().expect("Failed to merge fixtures");

        assert_eq!(set.dataset_ids(), vec!["credit-fraud", "telco-churn"]);
        assert_eq!(
            set.get_fixture("telco-churn").unwrap().models.champion,
            "LightGBM"
        );
    }
}
