//! The pipeline session: stage navigation, completion, results and log.
//!
//! A session is an explicitly constructed value. Whoever drives the stages
//! owns it and lends it out: stages read upstream results through shared
//! borrows and write their own result through the session's methods only.

use ap_protocol::stage_models::{
    BusinessSetup, DatasetChoice, LogEntry, LogLevel, ModelSelectionResults, PatternResults,
    ProfilingResults, SessionSnapshot, StageId, StageResult, ValidationResults,
};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::{SessionError, SessionResult};

/// Whether `write_result` filled an empty slot or replaced a cached result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Fresh,
    Overwritten,
}

#[derive(Debug, Clone)]
pub struct PipelineSession {
    id: Uuid,
    current: StageId,
    completed: BTreeSet<StageId>,
    results: BTreeMap<StageId, StageResult>,
    log: Vec<LogEntry>,
}

impl Default for PipelineSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineSession {
    /// A fresh session at stage 1 with nothing completed.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            current: StageId::FIRST,
            completed: BTreeSet::new(),
            results: BTreeMap::new(),
            log: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_stage(&self) -> StageId {
        self.current
    }

    pub fn completed_stages(&self) -> &BTreeSet<StageId> {
        &self.completed
    }

    pub fn is_complete(&self, stage: StageId) -> bool {
        self.completed.contains(&stage)
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Move from `from` to the stage after it.
    ///
    /// `from` must be the active stage and must not be the last stage.
    pub fn advance(&mut self, from: StageId) -> SessionResult<StageId> {
        if from != self.current {
            return Err(SessionError::CannotAdvance {
                from,
                current: self.current,
            });
        }
        let next = from.next().ok_or(SessionError::AtLastStage(from))?;
        debug!(from = from.number(), to = next.number(), "advance");
        self.current = next;
        Ok(next)
    }

    /// Jump back to any stage before the active one.
    pub fn retreat(&mut self, to: StageId) -> SessionResult<StageId> {
        if to >= self.current {
            return Err(SessionError::CannotRetreat {
                to,
                current: self.current,
            });
        }
        debug!(from = self.current.number(), to = to.number(), "retreat");
        self.current = to;
        Ok(to)
    }

    /// Add `stage` to the completed set. Returns `false` if it was already there.
    pub fn mark_complete(&mut self, stage: StageId) -> bool {
        self.completed.insert(stage)
    }

    /// Store a stage's result in its slot.
    ///
    /// A second write before `reset` replaces the cached value: re-running a
    /// stage after an upstream change is a legitimate action. Downstream
    /// results are left untouched. The overwrite is logged as a warning.
    pub fn write_result(&mut self, result: StageResult) -> WriteOutcome {
        let stage = result.stage();
        match self.results.insert(stage, result) {
            None => WriteOutcome::Fresh,
            Some(_) => {
                warn!(stage = stage.number(), "overwriting cached stage result");
                self.append_log(
                    format!("{} result replaced; later stages keep their cached results", stage.label()),
                    LogLevel::Warning,
                );
                WriteOutcome::Overwritten
            }
        }
    }

    /// The cached result of `stage`, if it has been written.
    pub fn result_for(&self, stage: StageId) -> Option<&StageResult> {
        self.results.get(&stage)
    }

    pub fn has_result(&self, stage: StageId) -> bool {
        self.results.contains_key(&stage)
    }

    pub fn dataset_choice(&self) -> Option<&DatasetChoice> {
        match self.result_for(StageId::ChooseDataset) {
            Some(StageResult::Dataset(choice)) => Some(choice),
            _ => None,
        }
    }

    pub fn business_setup(&self) -> Option<&BusinessSetup> {
        match self.result_for(StageId::BusinessSetup) {
            Some(StageResult::Business(setup)) => Some(setup),
            _ => None,
        }
    }

    pub fn profiling_results(&self) -> Option<&ProfilingResults> {
        match self.result_for(StageId::DataProfiling) {
            Some(StageResult::Profiling(results)) => Some(results),
            _ => None,
        }
    }

    pub fn pattern_results(&self) -> Option<&PatternResults> {
        match self.result_for(StageId::PatternDiscovery) {
            Some(StageResult::Patterns(results)) => Some(results),
            _ => None,
        }
    }

    pub fn validation_results(&self) -> Option<&ValidationResults> {
        match self.result_for(StageId::Validation) {
            Some(StageResult::Validation(results)) => Some(results),
            _ => None,
        }
    }

    pub fn model_selection_results(&self) -> Option<&ModelSelectionResults> {
        match self.result_for(StageId::ModelSelection) {
            Some(StageResult::ModelSelection(results)) => Some(results),
            _ => None,
        }
    }

    /// The dataset choice that every stage after business setup reads.
    pub fn require_dataset(&self, stage: StageId) -> SessionResult<&DatasetChoice> {
        self.dataset_choice().ok_or(SessionError::MissingUpstream {
            stage,
            requires: StageId::ChooseDataset,
        })
    }

    /// Append a line to the session log and return it.
    pub fn append_log(&mut self, message: impl Into<String>, level: LogLevel) -> &LogEntry {
        let index = self.log.len();
        self.log.push(LogEntry {
            timestamp: Utc::now(),
            message: message.into(),
            level,
        });
        &self.log[index]
    }

    /// Return to stage 1 with no completions, results or log.
    ///
    /// The whole session is replaced in a single assignment, so no caller
    /// can observe a partially cleared state. A new session id is issued.
    pub fn reset(&mut self) {
        debug!(session = %self.id, "session reset");
        *self = PipelineSession::new();
    }

    /// Owned copy of the whole session for read-only consumers.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            current_stage: self.current,
            completed_stages: self.completed.clone(),
            results: self.results.values().cloned().collect(),
            log: self.log.clone(),
        }
    }
}
