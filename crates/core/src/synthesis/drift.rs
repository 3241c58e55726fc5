//! Twelve-week production drift synthesis.
//!
//! Each week `w` gets a parameter `t = (w - 1) / 12`. Metrics are linearly
//! interpolated from the healthy anchor towards the critical anchor, drift
//! score and per-feature PSI grow with `t` plus bounded uniform noise, and
//! the top features get a pair of histograms whose mean drifts with `t`.

use ap_protocol::drift_models::{
    DistributionPair, DriftSimulation, DriftWeek, FeaturePsi, HealthClassification, PsiStatus,
    DRIFT_WEEKS,
};
use ap_protocol::fixture_models::DriftFixture;
use ap_protocol::metrics_models::ModelMetrics;
use rand::Rng;

use super::{build_distribution_pair, lerp, round3};

/// PSI above this value marks a feature as failing.
pub const PSI_FAIL_THRESHOLD: f64 = 0.25;

const LAST_HEALTHY_WEEK: u8 = 4;
const LAST_WARNING_WEEK: u8 = 8;

const DRIFT_SCORE_SCALE: f64 = 0.8;
const DRIFT_SCORE_NOISE: f64 = 0.05;
const PSI_SCALE: f64 = 0.5;
const PSI_NOISE: f64 = 0.1;

const DISTRIBUTION_FEATURES: usize = 3;
const DISTRIBUTION_SAMPLES: usize = 20;
const BASE_MEAN: f64 = 50.0;
const BASE_SPREAD: f64 = 10.0;
const MEAN_SHIFT_SCALE: f64 = 20.0;
const SPREAD_DELTA_SCALE: f64 = 5.0;

/// Health band of week `week`.
pub fn classify_week(week: u8) -> HealthClassification {
    if week <= LAST_HEALTHY_WEEK {
        HealthClassification::Healthy
    } else if week <= LAST_WARNING_WEEK {
        HealthClassification::Warning
    } else {
        HealthClassification::Critical
    }
}

/// Interpolation parameter of week `week`: `(week - 1) / 12`.
pub fn week_parameter(week: u8) -> f64 {
    f64::from(week.saturating_sub(1)) / f64::from(DRIFT_WEEKS)
}

/// Uniform noise in `[0, max)`.
fn noise<R: Rng + ?Sized>(max: f64, rng: &mut R) -> f64 {
    rng.gen::<f64>() * max
}

fn feature_psi<R: Rng + ?Sized>(feature: &str, t: f64, rng: &mut R) -> FeaturePsi {
    let psi = (t * PSI_SCALE + noise(PSI_NOISE, rng)).max(0.0);
    FeaturePsi {
        feature: feature.to_string(),
        psi: round3(psi),
        status: if psi > PSI_FAIL_THRESHOLD {
            PsiStatus::Fail
        } else {
            PsiStatus::Pass
        },
    }
}

fn distribution<R: Rng + ?Sized>(feature: &str, t: f64, rng: &mut R) -> DistributionPair {
    let (original, current) = build_distribution_pair(
        BASE_MEAN,
        BASE_SPREAD,
        t * MEAN_SHIFT_SCALE,
        t * SPREAD_DELTA_SCALE,
        DISTRIBUTION_SAMPLES,
        rng,
    );
    DistributionPair {
        feature: feature.to_string(),
        original,
        current,
    }
}

/// Build the twelve simulated weeks between two metric anchors.
///
/// Metrics are exactly reproducible; drift score, PSI and histograms depend
/// on `rng`.
pub fn build_weekly_series<R: Rng + ?Sized>(
    healthy: &ModelMetrics,
    critical: &ModelMetrics,
    features: &[String],
    rng: &mut R,
) -> Vec<DriftWeek> {
    (1..=DRIFT_WEEKS)
        .map(|week| {
            let t = week_parameter(week);
            let metrics = healthy.zip_with(critical, |h, c| lerp(h, c, t));
            let drift_score = round3(t * DRIFT_SCORE_SCALE + noise(DRIFT_SCORE_NOISE, rng));
            let psi_values = features
                .iter()
                .map(|feature| feature_psi(feature, t, rng))
                .collect();
            let distributions = features
                .iter()
                .take(DISTRIBUTION_FEATURES)
                .map(|feature| distribution(feature, t, rng))
                .collect();

            DriftWeek {
                week,
                health: classify_week(week),
                metrics,
                drift_score,
                psi_values,
                distributions,
            }
        })
        .collect()
}

/// Build the full drift scenario of a fixture.
pub fn build_drift_simulation<R: Rng + ?Sized>(fixture: &DriftFixture, rng: &mut R) -> DriftSimulation {
    DriftSimulation {
        weeks: build_weekly_series(&fixture.healthy, &fixture.critical, &fixture.features, rng),
        retraining: fixture.retraining,
    }
}

/// UI-controlled pointer into the twelve drift weeks.
///
/// Always points at a valid week; out-of-range moves are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftCursor {
    week: u8,
}

impl Default for DriftCursor {
    fn default() -> Self {
        Self { week: 1 }
    }
}

impl DriftCursor {
    pub fn week(&self) -> u8 {
        self.week
    }

    /// Point at `week`, clamped into `1..=12`. Returns the resulting week.
    pub fn set(&mut self, week: u8) -> u8 {
        self.week = week.clamp(1, DRIFT_WEEKS);
        self.week
    }

    /// The week under the cursor, if the simulation has it.
    pub fn current<'a>(&self, simulation: &'a DriftSimulation) -> Option<&'a DriftWeek> {
        simulation.week(self.week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ap_protocol::drift_models::RetrainingResult;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn healthy() -> ModelMetrics {
        ModelMetrics {
            accuracy: 0.873,
            precision: 0.781,
            recall: 0.694,
            f1: 0.735,
            auc: 0.912,
        }
    }

    fn critical() -> ModelMetrics {
        ModelMetrics {
            accuracy: 0.741,
            precision: 0.628,
            recall: 0.542,
            f1: 0.582,
            auc: 0.779,
        }
    }

    fn features() -> Vec<String> {
        ["tenure", "MonthlyCharges", "TotalCharges", "Contract", "PaymentMethod"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn series(seed: u64) -> Vec<DriftWeek> {
        build_weekly_series(&healthy(), &critical(), &features(), &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_classification_boundaries() {
        let weeks = series(1);
        let health = |w: usize| weeks[w - 1].health;
        assert_eq!(health(1), HealthClassification::Healthy);
        assert_eq!(health(4), HealthClassification::Healthy);
        assert_eq!(health(5), HealthClassification::Warning);
        assert_eq!(health(8), HealthClassification::Warning);
        assert_eq!(health(9), HealthClassification::Critical);
        assert_eq!(health(12), HealthClassification::Critical);
    }

    #[test]
    fn test_twelve_weeks_numbered_in_order() {
        let weeks = series(2);
        assert_eq!(weeks.len(), 12);
        for (i, week) in weeks.iter().enumerate() {
            assert_eq!(usize::from(week.week), i + 1);
        }
    }

    #[test]
    fn test_metrics_are_exact_interpolations() {
        let weeks = series(3);
        assert_eq!(weeks[0].metrics, healthy());

        let t = 11.0 / 12.0;
        let expected = lerp(healthy().auc, critical().auc, t);
        assert_eq!(weeks[11].metrics.auc, expected);

        // Same anchors, different seed: metrics unchanged.
        assert_eq!(series(99)[6].metrics, weeks[6].metrics);
    }

    #[test]
    fn test_metrics_degrade_monotonically() {
        let weeks = series(4);
        for pair in weeks.windows(2) {
            assert!(pair[1].metrics.accuracy <= pair[0].metrics.accuracy);
            assert!(pair[1].metrics.auc <= pair[0].metrics.auc);
        }
    }

    #[test]
    fn test_drift_score_and_psi_stay_in_noise_band() {
        let weeks = series(5);
        for week in &weeks {
            let t = week_parameter(week.week);
            assert!(week.drift_score >= round3(t * 0.8) - 1e-9);
            assert!(week.drift_score <= round3(t * 0.8 + 0.05) + 1e-9);

            assert_eq!(week.psi_values.len(), features().len());
            for psi in &week.psi_values {
                assert!(psi.psi >= round3(t * 0.5) - 1e-9);
                assert!(psi.psi <= round3(t * 0.5 + 0.1) + 1e-9);
            }
        }
    }

    #[test]
    fn test_psi_status_follows_threshold() {
        let weeks = series(6);
        // Week 1: t = 0, psi < 0.1, always passing.
        assert!(weeks[0].psi_values.iter().all(|p| p.status == PsiStatus::Pass));
        // Week 12: t = 11/12, psi >= 0.458, always failing.
        assert!(weeks[11].psi_values.iter().all(|p| p.status == PsiStatus::Fail));
        assert_eq!(weeks[11].failing_features().count(), features().len());
    }

    #[test]
    fn test_distributions_cover_top_three_features() {
        let weeks = series(7);
        for week in &weeks {
            assert_eq!(week.distributions.len(), 3);
            assert_eq!(week.distributions[0].feature, "tenure");
            assert_eq!(week.distributions[0].original.len(), 20);
            assert_eq!(week.distributions[0].current.len(), 20);
        }
    }

    #[test]
    fn test_fewer_features_than_distribution_slots() {
        let one = vec!["amount".to_string()];
        let weeks = build_weekly_series(&healthy(), &critical(), &one, &mut StdRng::seed_from_u64(8));
        assert!(weeks.iter().all(|w| w.distributions.len() == 1 && w.psi_values.len() == 1));
    }

    #[test]
    fn test_seeded_series_is_reproducible() {
        assert_eq!(series(10), series(10));
    }

    #[test]
    fn test_build_drift_simulation_carries_retraining() {
        let retraining = RetrainingResult {
            old_metrics: critical(),
            new_metrics: healthy(),
            improvement: 18.2,
        };
        let fixture = DriftFixture {
            healthy: healthy(),
            critical: critical(),
            features: features(),
            retraining,
        };
        let simulation = build_drift_simulation(&fixture, &mut StdRng::seed_from_u64(12));
        assert_eq!(simulation.weeks.len(), 12);
        assert_eq!(simulation.retraining, retraining);
        assert_eq!(simulation.week(9).map(|w| w.health), Some(HealthClassification::Critical));
    }

    #[test]
    fn test_drift_cursor_clamps() {
        let mut cursor = DriftCursor::default();
        assert_eq!(cursor.week(), 1);
        assert_eq!(cursor.set(0), 1);
        assert_eq!(cursor.set(40), 12);
        assert_eq!(cursor.set(6), 6);

        let weeks = series(13);
        let simulation = DriftSimulation {
            weeks,
            retraining: RetrainingResult {
                old_metrics: critical(),
                new_metrics: healthy(),
                improvement: 1.0,
            },
        };
        assert_eq!(cursor.current(&simulation).map(|w| w.week), Some(6));
    }
}
