use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use aurora_nwscript::{ObjectId, ScriptState};
use serde::Serialize;

#[derive(Debug, Clone)]
pub enum ActionKind {
    /// Run or resume a script.
    Script {
        script: String,
        state: Option<ScriptState>,
    },
    /// Destroy the owner.
    Destroy,
}

/// Work scheduled for a future tick.
#[derive(Debug, Clone)]
pub struct DelayedAction {
    pub kind: ActionKind,
    pub owner: ObjectId,
    pub triggerer: ObjectId,
    pub timestamp: u64,
}

impl DelayedAction {
    pub fn script(
        script: &str,
        state: Option<ScriptState>,
        owner: ObjectId,
        triggerer: ObjectId,
        timestamp: u64,
    ) -> Self {
        Self {
            kind: ActionKind::Script {
                script: script.to_string(),
                state,
            },
            owner,
            triggerer,
            timestamp,
        }
    }

    pub fn destroy(owner: ObjectId, timestamp: u64) -> Self {
        Self {
            kind: ActionKind::Destroy,
            owner,
            triggerer: ObjectId::INVALID,
            timestamp,
        }
    }

    pub fn label(&self) -> String {
        match &self.kind {
            ActionKind::Script { script, .. } => format!("script {script}"),
            ActionKind::Destroy => "destroy".to_string(),
        }
    }
}

#[derive(Debug)]
struct Queued {
    timestamp: u64,
    sequence: u64,
    action: DelayedAction,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.timestamp, self.sequence).cmp(&(other.timestamp, other.sequence))
    }
}

/// Summary of a pending action, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct PendingAction {
    pub label: String,
    pub owner: ObjectId,
    pub timestamp: u64,
}

/// Delayed actions ordered by due time; equal times keep insertion order.
#[derive(Debug, Default)]
pub struct ActionQueue {
    heap: BinaryHeap<Reverse<Queued>>,
    next_sequence: u64,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: DelayedAction) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(Reverse(Queued {
            timestamp: action.timestamp,
            sequence,
            action,
        }));
    }

    /// Remove and return everything due at `now`, earliest first.
    ///
    /// Actions pushed while the returned batch runs wait for the next call.
    pub fn drain_due(&mut self, now: u64) -> Vec<DelayedAction> {
        let mut due = Vec::new();
        while self
            .heap
            .peek()
            .is_some_and(|Reverse(queued)| queued.timestamp <= now)
        {
            if let Some(Reverse(queued)) = self.heap.pop() {
                due.push(queued.action);
            }
        }
        due
    }

    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(queued)| queued.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn pending(&self) -> Vec<PendingAction> {
        let mut queued: Vec<&Queued> = self.heap.iter().map(|Reverse(queued)| queued).collect();
        queued.sort();
        queued
            .into_iter()
            .map(|queued| PendingAction {
                label: queued.action.label(),
                owner: queued.action.owner,
                timestamp: queued.timestamp,
            })
            .collect()
    }
}
