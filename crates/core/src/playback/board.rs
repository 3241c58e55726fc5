//! Subscribable playback state.
//!
//! The board is the single source of truth a rendering layer reads while a
//! stage plays: one [`EntityState`] per entity, a leaderboard and the
//! champion. Every mutation is published synchronously through a
//! `tokio::sync::watch` channel, so subscribers always see the latest
//! snapshot and never a half-applied event.

use ap_protocol::stage_models::StageId;
use ap_protocol::timeline_models::{
    EntityState, EntityStatus, LeaderboardEntry, PlaybackSnapshot, TerminalPayload, TimelineEvent,
};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// Rank completed entities by AUC, best first. Ties keep completion order.
pub fn rank_by_auc(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| b.metrics.auc.total_cmp(&a.metrics.auc));
}

#[derive(Debug, Clone)]
pub struct PlaybackBoard {
    tx: watch::Sender<PlaybackSnapshot>,
}

impl Default for PlaybackBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackBoard {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(PlaybackSnapshot::default());
        Self { tx }
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every subsequent update.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.tx.subscribe()
    }

    /// Snapshot stream, starting with the current value.
    pub fn stream(&self) -> WatchStream<PlaybackSnapshot> {
        WatchStream::new(self.subscribe())
    }

    /// Reset the board for `stage` with every entity waiting.
    pub fn load(&self, stage: StageId, entities: &[String]) {
        self.tx.send_replace(PlaybackSnapshot {
            stage: Some(stage),
            entities: entities.iter().map(EntityState::waiting).collect(),
            ..PlaybackSnapshot::default()
        });
    }

    /// Switch every waiting entity to running.
    pub fn begin(&self) {
        self.tx.send_modify(|snapshot| {
            for entity in &mut snapshot.entities {
                if entity.status == EntityStatus::Waiting {
                    entity.status = EntityStatus::Running;
                }
            }
        });
    }

    /// Apply one timeline event.
    ///
    /// Completed entities are frozen: events for them are ignored. Progress
    /// never moves backwards. A terminal event completes the entity and, for
    /// metric payloads, inserts it into the leaderboard.
    pub fn apply(&self, event: &TimelineEvent) {
        self.tx.send_modify(|snapshot| {
            let Some(entity) = snapshot
                .entities
                .iter_mut()
                .find(|entity| entity.name == event.entity)
            else {
                return;
            };
            if entity.status == EntityStatus::Complete {
                return;
            }

            entity.progress = entity.progress.max(event.progress).min(100.0);
            entity.status = EntityStatus::Running;

            if let Some(payload) = &event.payload {
                entity.status = EntityStatus::Complete;
                entity.progress = 100.0;
                entity.payload = Some(payload.clone());

                if let Some(metrics) = payload.metrics() {
                    snapshot.leaderboard.push(LeaderboardEntry {
                        name: event.entity.clone(),
                        metrics: *metrics,
                    });
                    rank_by_auc(&mut snapshot.leaderboard);
                }
            }
        });
    }

    /// Drop all entities and return to the empty snapshot.
    pub fn clear(&self) {
        self.tx.send_replace(PlaybackSnapshot::default());
    }

    /// Flag the stage's analysis as complete.
    pub fn mark_analysis_complete(&self) {
        self.tx.send_modify(|snapshot| snapshot.analysis_complete = true);
    }

    pub fn reveal_champion(&self, name: &str) {
        self.tx
            .send_modify(|snapshot| snapshot.champion = Some(name.to_string()));
    }

    /// Publish the finished state of `stage` in one update, without playback.
    ///
    /// Used when a stage is re-entered and its result is already cached.
    pub fn rehydrate(
        &self,
        stage: StageId,
        entities: Vec<(String, TerminalPayload)>,
        leaderboard: Vec<LeaderboardEntry>,
        champion: Option<String>,
    ) {
        self.tx.send_replace(PlaybackSnapshot {
            stage: Some(stage),
            entities: entities
                .into_iter()
                .map(|(name, payload)| EntityState::completed(name, payload))
                .collect(),
            analysis_complete: true,
            leaderboard,
            champion,
        });
    }
}
