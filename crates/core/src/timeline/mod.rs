//! Timeline construction.
//!
//! A timeline turns a set of entities, each with a duration budget and a
//! terminal payload, into a single time-ordered list of progress events.
//!
//! Two layouts are supported:
//! - [`build_timeline`]: all entities progress concurrently from offset 0
//!   (the model training arena).
//! - [`build_staged_timeline`]: entities run back to back, each starting when
//!   the previous one completes (profiling modules, discovery phases).
//!
//! In both layouts every entity gets at least one step, so every entity
//! reaches 100% and reveals its payload exactly once.

pub mod error;

use ap_protocol::timeline_models::{TerminalPayload, TimelineEvent};
use std::collections::HashSet;

pub use error::{TimelineError, TimelineResult};

/// Default event granularity in milliseconds.
pub const DEFAULT_STEP_MS: u64 = 200;

/// One entity to be laid out on a timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySpec {
    pub name: String,
    pub duration_ms: i64,
    pub payload: TerminalPayload,
}

impl EntitySpec {
    pub fn new(name: impl Into<String>, duration_ms: i64, payload: TerminalPayload) -> Self {
        Self {
            name: name.into(),
            duration_ms,
            payload,
        }
    }
}

/// An immutable, time-ordered event sequence plus the entities it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    entities: Vec<String>,
    events: Vec<TimelineEvent>,
}

impl Timeline {
    /// Entity names in declaration order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Events in non-decreasing offset order.
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Offset of the last event.
    pub fn duration_ms(&self) -> u64 {
        self.events.last().map_or(0, |event| event.offset_ms)
    }

    /// All events for one entity, in order.
    pub fn events_for<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a TimelineEvent> + 'a {
        self.events.iter().filter(move |event| event.entity == entity)
    }
}

/// Check the entity list and compute each entity's step count.
fn plan_steps(entities: &[EntitySpec], step_ms: u64) -> TimelineResult<Vec<u64>> {
    if step_ms == 0 {
        return Err(TimelineError::InvalidStep);
    }
    if entities.is_empty() {
        return Err(TimelineError::EmptyEntities);
    }

    let mut seen = HashSet::new();
    entities
        .iter()
        .map(|entity| {
            if !seen.insert(entity.name.as_str()) {
                return Err(TimelineError::DuplicateEntity(entity.name.clone()));
            }
            let duration = u64::try_from(entity.duration_ms)
                .ok()
                .filter(|&d| d > 0)
                .ok_or_else(|| TimelineError::NonPositiveDuration {
                    entity: entity.name.clone(),
                    duration_ms: entity.duration_ms,
                })?;
            // Durations shorter than one step still get one step.
            Ok((duration / step_ms).max(1))
        })
        .collect()
}

/// Progress events for one entity, starting at `start_ms`.
fn entity_events(entity: &EntitySpec, steps: u64, step_ms: u64, start_ms: u64) -> Vec<TimelineEvent> {
    (1..=steps)
        .map(|i| TimelineEvent {
            offset_ms: start_ms + i * step_ms,
            entity: entity.name.clone(),
            progress: if i == steps {
                100.0
            } else {
                (i as f64 / steps as f64 * 100.0).min(100.0)
            },
            payload: (i == steps).then(|| entity.payload.clone()),
        })
        .collect()
}

/// Lay out entities concurrently from offset 0.
///
/// Entity `e` with `steps = max(1, floor(duration / step_ms))` gets one
/// event at each `i * step_ms` for `i` in `1..=steps`; the last carries its
/// payload. Events are merged by offset; ties keep entity declaration order.
pub fn build_timeline(entities: &[EntitySpec], step_ms: u64) -> TimelineResult<Timeline> {
    let steps = plan_steps(entities, step_ms)?;

    let mut events: Vec<TimelineEvent> = entities
        .iter()
        .zip(&steps)
        .flat_map(|(entity, &steps)| entity_events(entity, steps, step_ms, 0))
        .collect();
    // Stable: equal offsets keep the order entities were declared in.
    events.sort_by_key(|event| event.offset_ms);

    Ok(Timeline {
        entities: entities.iter().map(|e| e.name.clone()).collect(),
        events,
    })
}

/// Lay out entities back to back: each starts where the previous one ended.
pub fn build_staged_timeline(entities: &[EntitySpec], step_ms: u64) -> TimelineResult<Timeline> {
    let steps = plan_steps(entities, step_ms)?;

    let mut events = Vec::new();
    let mut start_ms = 0;
    for (entity, &steps) in entities.iter().zip(&steps) {
        events.extend(entity_events(entity, steps, step_ms, start_ms));
        start_ms += steps * step_ms;
    }

    Ok(Timeline {
        entities: entities.iter().map(|e| e.name.clone()).collect(),
        events,
    })
}
