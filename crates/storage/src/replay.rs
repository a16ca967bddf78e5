// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 the agent-substrate authors

//! Replay.
//!
//! Read-only reconstructor: merges transitions, events, and audits for one
//! task into a single timeline ordered by `created_at`, ties broken by
//! source order. Safe to call concurrently; touches no state.

use substrate_core::{ReplaySummary, SubstrateResult, TimelineEntry, TimelineSource};

use crate::audit;
use crate::db::Database;

pub struct Replay {
    pub timeline: Vec<TimelineEntry>,
    pub summary: ReplaySummary,
}

pub fn replay(db: &Database, task_id: &str) -> SubstrateResult<Replay> {
    let transitions = audit::list_transitions(db, task_id)?;
    let events = audit::list_events(db, task_id)?;
    let audits = audit::list_audits(db, task_id)?;

    let mut timeline: Vec<TimelineEntry> = Vec::with_capacity(transitions.len() + events.len() + audits.len());
    let mut status_sequence = Vec::with_capacity(transitions.len() + 1);

    for t in &transitions {
        status_sequence.push(t.to_status.clone());
        timeline.push(TimelineEntry {
            created_at: t.created_at,
            source_order: TimelineSource::Transition.order(),
            source: TimelineSource::Transition,
            summary: format!("{} -> {} by {}", t.from_status, t.to_status, t.actor),
        });
    }
    for e in &events {
        timeline.push(TimelineEntry {
            created_at: e.created_at,
            source_order: TimelineSource::Event.order(),
            source: TimelineSource::Event,
            summary: format!("{} (seq {})", e.event_type, e.event_seq),
        });
    }
    for a in &audits {
        timeline.push(TimelineEntry {
            created_at: a.created_at,
            source_order: TimelineSource::Audit.order(),
            source: TimelineSource::Audit,
            summary: format!("[{}] {}", a.level, a.event_type),
        });
    }

    timeline.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.source_order.cmp(&b.source_order)));

    let duration_ms = match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) => Some(last.created_at - first.created_at),
        _ => None,
    };

    let summary = ReplaySummary {
        transition_count: transitions.len(),
        event_count: events.len(),
        audit_count: audits.len(),
        status_sequence,
        duration_ms,
    };

    Ok(Replay { timeline, summary })
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
