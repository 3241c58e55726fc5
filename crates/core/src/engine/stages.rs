//! Per-stage inputs and results.
//!
//! Turns fixture sections into timeline entities and turns finished
//! playback back into stage results. Nothing here touches the clock or
//! the session.

use ap_protocol::drift_models::{DriftSimulation, DriftWeek, HealthClassification};
use ap_protocol::fixture_models::{ModelFixture, RevealFixture};
use ap_protocol::stage_models::{
    Insight, InsightKind, ModelSelectionResults, ModuleFinding, StageResult, ValidationResults,
};
use ap_protocol::timeline_models::{LeaderboardEntry, TerminalPayload};

use crate::playback::board::rank_by_auc;
use crate::timeline::{EntitySpec, Timeline};

pub fn reveal_specs(reveals: &[RevealFixture]) -> Vec<EntitySpec> {
    reveals
        .iter()
        .map(|r| EntitySpec::new(&r.name, r.duration_ms, TerminalPayload::Finding(r.insight.clone())))
        .collect()
}

pub fn reveal_findings(reveals: &[RevealFixture]) -> Vec<ModuleFinding> {
    reveals
        .iter()
        .map(|r| ModuleFinding {
            module: r.name.clone(),
            insight: r.insight.clone(),
        })
        .collect()
}

pub fn week_entity(week: u8) -> String {
    format!("Week {}", week)
}

fn health_label(health: HealthClassification) -> &'static str {
    match health {
        HealthClassification::Healthy => "Healthy",
        HealthClassification::Warning => "Warning",
        HealthClassification::Critical => "Critical",
    }
}

/// The insight revealed when a week's validation check completes.
pub fn week_finding(week: &DriftWeek) -> Insight {
    let failing: Vec<&str> = week.failing_features().collect();
    let mut text = format!(
        "{}: AUC {:.3}, drift score {:.3}",
        health_label(week.health),
        week.metrics.auc,
        week.drift_score
    );
    if !failing.is_empty() {
        text.push_str(&format!(", PSI failing on {}", failing.join(", ")));
    }
    Insight {
        id: format!("week-{}", week.week),
        text,
        kind: match week.health {
            HealthClassification::Healthy => InsightKind::Success,
            HealthClassification::Warning => InsightKind::Info,
            HealthClassification::Critical => InsightKind::Warning,
        },
    }
}

pub fn week_specs(simulation: &DriftSimulation, week_duration_ms: i64) -> Vec<EntitySpec> {
    simulation
        .weeks
        .iter()
        .map(|week| {
            EntitySpec::new(
                week_entity(week.week),
                week_duration_ms,
                TerminalPayload::Finding(week_finding(week)),
            )
        })
        .collect()
}

/// Summarize a drift simulation as the validation stage's result.
pub fn validation_results(simulation: &DriftSimulation) -> ValidationResults {
    let first_in = |health: HealthClassification| {
        simulation
            .weeks
            .iter()
            .find(|w| w.health == health)
            .map(|w| w.week)
    };
    let last = simulation.weeks.last();

    ValidationResults {
        checks: simulation
            .weeks
            .iter()
            .map(|week| ModuleFinding {
                module: week_entity(week.week),
                insight: week_finding(week),
            })
            .collect(),
        weeks_checked: u8::try_from(simulation.weeks.len()).unwrap_or(u8::MAX),
        first_warning_week: first_in(HealthClassification::Warning),
        first_critical_week: first_in(HealthClassification::Critical),
        failing_features: last
            .map(|w| w.failing_features().map(str::to_string).collect())
            .unwrap_or_default(),
        final_drift_score: last.map_or(0.0, |w| w.drift_score),
        retraining: simulation.retraining,
    }
}

pub fn candidate_specs(models: &ModelFixture) -> Vec<EntitySpec> {
    models
        .candidates
        .iter()
        .map(|c| EntitySpec::new(&c.name, c.duration_ms, TerminalPayload::Metrics(c.metrics)))
        .collect()
}

/// Final standings as the board builds them: candidates in the order their
/// terminal events play, ranked by AUC.
pub fn timeline_leaderboard(timeline: &Timeline) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = timeline
        .events()
        .iter()
        .filter_map(|event| {
            let metrics = event.payload.as_ref().and_then(TerminalPayload::metrics)?;
            Some(LeaderboardEntry {
                name: event.entity.clone(),
                metrics: *metrics,
            })
        })
        .collect();
    rank_by_auc(&mut entries);
    entries
}

/// The declared champion, or the leaderboard leader if it is not a candidate.
pub fn choose_champion(models: &ModelFixture, leaderboard: &[LeaderboardEntry]) -> Option<LeaderboardEntry> {
    leaderboard
        .iter()
        .find(|e| e.name == models.champion)
        .or_else(|| leaderboard.first())
        .cloned()
}

pub fn model_selection_results(models: &ModelFixture, timeline: &Timeline) -> Option<ModelSelectionResults> {
    let leaderboard = timeline_leaderboard(timeline);
    let champion = choose_champion(models, &leaderboard)?;
    Some(ModelSelectionResults {
        leaderboard,
        champion: champion.name,
        champion_metrics: champion.metrics,
    })
}

/// What the playback board shows for a stage restored from its cached result.
pub struct Rehydration {
    pub entities: Vec<(String, TerminalPayload)>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub champion: Option<String>,
}

fn findings_rehydration(findings: &[ModuleFinding]) -> Rehydration {
    Rehydration {
        entities: findings
            .iter()
            .map(|f| (f.module.clone(), TerminalPayload::Finding(f.insight.clone())))
            .collect(),
        leaderboard: Vec::new(),
        champion: None,
    }
}

/// Rebuild the finished board state from a cached result.
///
/// Returns `None` for stages without playback.
pub fn rehydration(result: &StageResult) -> Option<Rehydration> {
    match result {
        StageResult::Dataset(_) | StageResult::Business(_) => None,
        StageResult::Profiling(r) => Some(findings_rehydration(&r.modules)),
        StageResult::Patterns(r) => Some(findings_rehydration(&r.phases)),
        StageResult::Validation(r) => Some(findings_rehydration(&r.checks)),
        StageResult::ModelSelection(r) => Some(Rehydration {
            entities: r
                .leaderboard
                .iter()
                .map(|e| (e.name.clone(), TerminalPayload::Metrics(e.metrics)))
                .collect(),
            leaderboard: r.leaderboard.clone(),
            champion: Some(r.champion.clone()),
        }),
    }
}
