//! Model quality metrics shared by training timelines and drift weeks.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Classification quality metrics for one model at one point in time.
///
/// All values are fractions in `[0, 1]`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, TS)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub auc: f64,
}

impl ModelMetrics {
    /// Apply `f` to each metric pair, producing a new metrics record.
    ///
    /// Used by interpolation code to blend two anchors field by field.
    pub fn zip_with(&self, other: &ModelMetrics, mut f: impl FnMut(f64, f64) -> f64) -> ModelMetrics {
        ModelMetrics {
            accuracy: f(self.accuracy, other.accuracy),
            precision: f(self.precision, other.precision),
            recall: f(self.recall, other.recall),
            f1: f(self.f1, other.f1),
            auc: f(self.auc, other.auc),
        }
    }
}
