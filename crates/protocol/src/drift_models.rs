//! Simulated production drift models.
//!
//! A [`DriftSimulation`] holds twelve [`DriftWeek`]s generated once per
//! dataset selection, plus the precomputed outcome of retraining.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::metrics_models::ModelMetrics;

/// Number of simulated production weeks.
pub const DRIFT_WEEKS: u8 = 12;

/// Health band of a simulated week.
///
/// Weeks 1-4 are healthy, 5-8 warning, 9-12 critical.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum HealthClassification {
    Healthy,
    Warning,
    Critical,
}

/// Pass/fail verdict for a feature's population stability index.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum PsiStatus {
    Pass,
    Fail,
}

/// Population stability index of one monitored feature in one week.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct FeaturePsi {
    pub feature: String,
    pub psi: f64,
    pub status: PsiStatus,
}

/// Paired histograms of a feature at training time and in the current week.
///
/// Values are non-negative integer counts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct DistributionPair {
    pub feature: String,
    pub original: Vec<u32>,
    pub current: Vec<u32>,
}

/// Simulated production health at week `week` (1-based).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct DriftWeek {
    pub week: u8,
    pub health: HealthClassification,
    pub metrics: ModelMetrics,
    pub drift_score: f64,
    pub psi_values: Vec<FeaturePsi>,
    pub distributions: Vec<DistributionPair>,
}

impl DriftWeek {
    /// Features whose PSI crossed the failure threshold this week.
    pub fn failing_features(&self) -> impl Iterator<Item = &str> {
        self.psi_values
            .iter()
            .filter(|psi| psi.status == PsiStatus::Fail)
            .map(|psi| psi.feature.as_str())
    }
}

/// Metrics before and after the simulated retraining run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, TS)]
pub struct RetrainingResult {
    pub old_metrics: ModelMetrics,
    pub new_metrics: ModelMetrics,
    /// Relative improvement in percent.
    pub improvement: f64,
}

/// The full drift scenario for one dataset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct DriftSimulation {
    pub weeks: Vec<DriftWeek>,
    pub retraining: RetrainingResult,
}

impl DriftSimulation {
    /// Look up a week by its 1-based index.
    pub fn week(&self, week: u8) -> Option<&DriftWeek> {
        self.weeks.iter().find(|w| w.week == week)
    }
}
