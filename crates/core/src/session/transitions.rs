//! Session transitions that notify listeners.
//!
//! Each function mutates the session through its own methods and then
//! emits the matching `Event`s. A closed channel is not an error: the
//! session remains the authoritative state.

use ap_protocol::ipc::Event;
use ap_protocol::stage_models::{LogLevel, StageId, StageResult};
use tokio::sync::mpsc::Sender;

use super::error::SessionResult;
use super::pipeline::{PipelineSession, WriteOutcome};

/// Append a log line and emit it.
pub async fn log(
    session: &mut PipelineSession,
    message: impl Into<String>,
    level: LogLevel,
    events_tx: &Sender<Event>,
) {
    let entry = session.append_log(message, level).clone();
    let _ = events_tx.send(Event::LogAppended { entry }).await;
}

/// Store a stage result and emit `ResultWritten`.
///
/// An overwrite also emits the warning line the session appended.
pub async fn write_result(
    session: &mut PipelineSession,
    result: StageResult,
    events_tx: &Sender<Event>,
) -> WriteOutcome {
    let stage = result.stage();
    let outcome = session.write_result(result);
    if outcome == WriteOutcome::Overwritten {
        if let Some(entry) = session.log().last().cloned() {
            let _ = events_tx.send(Event::LogAppended { entry }).await;
        }
    }
    let _ = events_tx
        .send(Event::ResultWritten {
            stage,
            overwritten: outcome == WriteOutcome::Overwritten,
        })
        .await;
    outcome
}

/// Mark `stage` complete, then advance past it.
///
/// # Errors
///
/// Returns the navigation error from `advance`. The completion mark is
/// only recorded when the advance succeeds.
pub async fn proceed(
    session: &mut PipelineSession,
    stage: StageId,
    events_tx: &Sender<Event>,
) -> SessionResult<StageId> {
    let next = session.advance(stage)?;
    if session.mark_complete(stage) {
        let _ = events_tx.send(Event::StageCompleted { stage }).await;
    }
    let _ = events_tx.send(Event::StageChanged { stage: next }).await;
    Ok(next)
}

/// Navigate back to an earlier stage and emit `StageChanged`.
pub async fn retreat(
    session: &mut PipelineSession,
    to: StageId,
    events_tx: &Sender<Event>,
) -> SessionResult<StageId> {
    let stage = session.retreat(to)?;
    let _ = events_tx.send(Event::StageChanged { stage }).await;
    Ok(stage)
}

/// Clear the session and emit `SessionReset` with the new id.
pub async fn reset(session: &mut PipelineSession, events_tx: &Sender<Event>) {
    session.reset();
    let _ = events_tx
        .send(Event::SessionReset {
            session_id: session.id(),
        })
        .await;
    let _ = events_tx
        .send(Event::StageChanged {
            stage: session.current_stage(),
        })
        .await;
}
