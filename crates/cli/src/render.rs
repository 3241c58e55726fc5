//! Terminal formatting for session logs, leaderboards and drift weeks.

use ap_protocol::drift_models::{DriftSimulation, DriftWeek, HealthClassification, PsiStatus};
use ap_protocol::fixture_models::Fixture;
use ap_protocol::metrics_models::ModelMetrics;
use ap_protocol::stage_models::{LogEntry, LogLevel};
use ap_protocol::timeline_models::LeaderboardEntry;
use colored::{ColoredString, Colorize};
use std::fmt::Write;

fn level_tag(level: LogLevel) -> ColoredString {
    match level {
        LogLevel::Info => "info".blue(),
        LogLevel::Success => "done".green(),
        LogLevel::Warning => "warn".yellow(),
        LogLevel::Action => " >> ".cyan().bold(),
    }
}

fn health_tag(health: HealthClassification) -> ColoredString {
    match health {
        HealthClassification::Healthy => "healthy".green(),
        HealthClassification::Warning => "warning".yellow(),
        HealthClassification::Critical => "critical".red().bold(),
    }
}

pub fn log_line(entry: &LogEntry) -> String {
    format!(
        "{} [{}] {}",
        entry.timestamp.format("%H:%M:%S").to_string().dimmed(),
        level_tag(entry.level),
        entry.message
    )
}

fn metrics_row(metrics: &ModelMetrics) -> String {
    format!(
        "{:>8.3} {:>9.3} {:>8.3} {:>8.3} {:>8.3}",
        metrics.auc, metrics.accuracy, metrics.precision, metrics.recall, metrics.f1
    )
}

/// Ranked model table with the champion highlighted.
pub fn leaderboard(entries: &[LeaderboardEntry], champion: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!(
            "{:<4} {:<22} {:>8} {:>9} {:>8} {:>8} {:>8}",
            "#", "Model", "AUC", "Accuracy", "Prec", "Recall", "F1"
        )
        .bold()
    );
    for (rank, entry) in entries.iter().enumerate() {
        let row = format!("{:<4} {:<22} {}", rank + 1, entry.name, metrics_row(&entry.metrics));
        if entry.name == champion {
            let _ = writeln!(out, "{} {}", row.green().bold(), "champion".green());
        } else {
            let _ = writeln!(out, "{row}");
        }
    }
    out
}

/// One line per simulated week.
pub fn drift_table(simulation: &DriftSimulation) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}",
        format!("{:<6} {:<10} {:>8} {:>8}  {}", "Week", "Health", "AUC", "Drift", "Failing PSI").bold()
    );
    for week in &simulation.weeks {
        let failing: Vec<&str> = week.failing_features().collect();
        let _ = writeln!(
            out,
            "{:<6} {:<10} {:>8.3} {:>8.3}  {}",
            week.week,
            health_tag(week.health),
            week.metrics.auc,
            week.drift_score,
            if failing.is_empty() {
                "-".to_string()
            } else {
                failing.join(", ")
            }
        );
    }
    let retraining = &simulation.retraining;
    let _ = writeln!(
        out,
        "Retraining: AUC {:.3} -> {:.3} (+{:.1}%)",
        retraining.old_metrics.auc, retraining.new_metrics.auc, retraining.improvement
    );
    out
}

/// Metrics, PSI values and histograms for a single week.
pub fn week_detail(week: &DriftWeek) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Week {} ({})", week.week, health_tag(week.health));
    let _ = writeln!(
        out,
        "  AUC {:.3}  accuracy {:.3}  precision {:.3}  recall {:.3}  F1 {:.3}",
        week.metrics.auc, week.metrics.accuracy, week.metrics.precision, week.metrics.recall, week.metrics.f1
    );
    let _ = writeln!(out, "  Drift score {:.3}", week.drift_score);
    for psi in &week.psi_values {
        let status = match psi.status {
            PsiStatus::Pass => "pass".green(),
            PsiStatus::Fail => "FAIL".red().bold(),
        };
        let _ = writeln!(out, "  PSI {:<18} {:>6.3} {}", psi.feature, psi.psi, status);
    }
    for pair in &week.distributions {
        let _ = writeln!(out, "  {}", pair.feature.bold());
        let _ = writeln!(out, "    original {:?}", pair.original);
        let _ = writeln!(out, "    current  {:?}", pair.current);
    }
    out
}

pub fn dataset_summary(fixture: &Fixture) -> String {
    let dataset = &fixture.dataset;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} ({} rows, {} features, {})",
        dataset.id.bold(),
        dataset.name,
        dataset.rows,
        dataset.features,
        dataset.domain
    );
    for objective in &fixture.objectives {
        let _ = writeln!(
            out,
            "  {:<16} {} [target {}, metric {}]",
            objective.id, objective.label, objective.target_column, objective.metric
        );
    }
    out
}
