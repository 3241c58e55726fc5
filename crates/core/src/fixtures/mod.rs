//! Fixture lookup.
//!
//! A fixture holds every precomputed number one dataset needs. The core
//! reads fixtures through [`FixtureProvider`] and treats their content as
//! opaque, checking only what playback needs to be safe: non-empty entity
//! sets, positive durations and at least one monitored feature.

pub mod builtin;
pub mod error;

use ap_protocol::fixture_models::{Fixture, RevealFixture};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub use error::{FixtureError, FixtureResult};

/// Dataset used by [`FixtureProvider::get_or_default`] when an id is unknown.
pub const DEFAULT_DATASET_ID: &str = "telco-churn";

/// Source of fixtures keyed by dataset id.
pub trait FixtureProvider: Send + Sync {
    /// Look up the fixture for `dataset_id`.
    ///
    /// # Errors
    ///
    /// Returns `FixtureError::NotFound` when no fixture has that id.
    fn get_fixture(&self, dataset_id: &str) -> FixtureResult<&Fixture>;

    /// Every registered dataset id, sorted.
    fn dataset_ids(&self) -> Vec<String>;

    /// Look up `dataset_id`, falling back to [`DEFAULT_DATASET_ID`].
    fn get_or_default(&self, dataset_id: &str) -> FixtureResult<&Fixture> {
        match self.get_fixture(dataset_id) {
            Ok(fixture) => Ok(fixture),
            Err(FixtureError::NotFound { .. }) if dataset_id != DEFAULT_DATASET_ID => {
                warn!(dataset_id, fallback = DEFAULT_DATASET_ID, "unknown dataset, using fallback");
                self.get_fixture(DEFAULT_DATASET_ID)
            }
            Err(e) => Err(e),
        }
    }
}

/// An in-memory, validated fixture registry.
#[derive(Debug, Clone, Default)]
pub struct FixtureSet {
    fixtures: BTreeMap<String, Fixture>,
}

impl FixtureSet {
    /// Register `fixtures` after validating each one.
    ///
    /// A later fixture with the same id replaces an earlier one.
    pub fn from_fixtures(fixtures: impl IntoIterator<Item = Fixture>) -> FixtureResult<Self> {
        let mut set = Self::default();
        set.extend(fixtures)?;
        Ok(set)
    }

    /// The fixtures embedded in the binary.
    pub fn builtin() -> FixtureResult<Self> {
        Self::from_fixtures(builtin::load_builtin()?)
    }

    /// Add or replace fixtures, validating each one first.
    pub fn extend(&mut self, fixtures: impl IntoIterator<Item = Fixture>) -> FixtureResult<()> {
        for fixture in fixtures {
            validate_fixture(&fixture)?;
            let id = fixture.id().to_string();
            if self.fixtures.insert(id.clone(), fixture).is_some() {
                debug!(dataset_id = %id, "fixture overridden");
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

impl FixtureProvider for FixtureSet {
    fn get_fixture(&self, dataset_id: &str) -> FixtureResult<&Fixture> {
        self.fixtures
            .get(dataset_id)
            .ok_or_else(|| FixtureError::NotFound {
                dataset_id: dataset_id.to_string(),
            })
    }

    fn dataset_ids(&self) -> Vec<String> {
        self.fixtures.keys().cloned().collect()
    }
}

fn check_durations<'a>(
    dataset_id: &str,
    section: &'static str,
    entities: impl IntoIterator<Item = (&'a str, i64)>,
) -> FixtureResult<()> {
    let mut count = 0;
    for (entity, duration_ms) in entities {
        count += 1;
        if duration_ms <= 0 {
            return Err(FixtureError::NonPositiveDuration {
                dataset_id: dataset_id.to_string(),
                entity: entity.to_string(),
                duration_ms,
            });
        }
    }
    if count == 0 {
        return Err(FixtureError::EmptyEntities {
            dataset_id: dataset_id.to_string(),
            section,
        });
    }
    Ok(())
}

fn reveal_durations(reveals: &[RevealFixture]) -> impl Iterator<Item = (&str, i64)> {
    reveals.iter().map(|r| (r.name.as_str(), r.duration_ms))
}

/// Check that a fixture can drive every stage's playback.
///
/// # Errors
///
/// - `EmptyEntities` if the candidates, profiling modules or discovery phases are empty
/// - `NonPositiveDuration` if any entity or the validation week has a duration ≤ 0
/// - `MissingFeatures` if drift lists no features
pub fn validate_fixture(fixture: &Fixture) -> FixtureResult<()> {
    let id = fixture.id();

    check_durations(
        id,
        "models",
        fixture
            .models
            .candidates
            .iter()
            .map(|c| (c.name.as_str(), c.duration_ms)),
    )?;
    check_durations(id, "profiling", reveal_durations(&fixture.profiling.modules))?;
    check_durations(id, "patterns", reveal_durations(&fixture.patterns.phases))?;
    check_durations(
        id,
        "validation",
        [("week", fixture.validation.week_duration_ms)],
    )?;

    if fixture.drift.features.is_empty() {
        return Err(FixtureError::MissingFeatures {
            dataset_id: id.to_string(),
        });
    }
    Ok(())
}
