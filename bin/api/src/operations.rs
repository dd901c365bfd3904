//! In-memory registry of operations started through the API.

use std::{
    collections::BTreeMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokenkit_chain::{CreatedToken, TxOutcome};
use tokenkit_core::OperationTracker;
use tokenkit_deploy::DeploymentResult;

/// Finished operations beyond this many are forgotten, oldest first.
const MAX_OPERATIONS: usize = 1024;

/// A tracker of any of the kinds the API starts.
#[derive(Clone)]
pub enum Tracked {
    Call(Arc<OperationTracker<TxOutcome>>),
    Registration(Arc<OperationTracker<Option<TxOutcome>>>),
    Creation(Arc<OperationTracker<CreatedToken>>),
    Deployment(Arc<OperationTracker<DeploymentResult>>),
}

impl Tracked {
    fn kind(&self) -> &'static str {
        match self {
            Tracked::Call(_) => "token_call",
            Tracked::Registration(_) => "registration",
            Tracked::Creation(_) => "token_creation",
            Tracked::Deployment(_) => "deployment",
        }
    }

    fn is_busy(&self) -> bool {
        match self {
            Tracked::Call(t) => t.is_busy(),
            Tracked::Registration(t) => t.is_busy(),
            Tracked::Creation(t) => t.is_busy(),
            Tracked::Deployment(t) => t.is_busy(),
        }
    }

    fn state_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Tracked::Call(t) => serde_json::to_value(t.snapshot()),
            Tracked::Registration(t) => serde_json::to_value(t.snapshot()),
            Tracked::Creation(t) => serde_json::to_value(t.snapshot()),
            Tracked::Deployment(t) => serde_json::to_value(t.snapshot()),
        }
    }
}

struct Entry {
    started_at: DateTime<Utc>,
    tracked: Tracked,
}

/// What `GET /api/v1/operations/:id` returns.
#[derive(Debug, Serialize)]
pub struct OperationView {
    pub id: u64,
    pub kind: &'static str,
    pub started_at: DateTime<Utc>,
    pub busy: bool,
    pub state: serde_json::Value,
}

pub struct OperationRegistry {
    next_id: AtomicU64,
    capacity: usize,
    entries: RwLock<BTreeMap<u64, Entry>>,
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_capacity(MAX_OPERATIONS)
    }
}

impl OperationRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            capacity,
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register `tracked` and return its id, forgetting the oldest finished
    /// operations to make room.
    ///
    /// Returns `None` when every slot holds an operation still in flight.
    pub fn insert(&self, tracked: Tracked) -> Option<u64> {
        let mut entries = self.entries.write().unwrap_or_else(|p| p.into_inner());

        if entries.len() >= self.capacity {
            let excess = entries.len() + 1 - self.capacity;
            let finished: Vec<u64> = entries
                .iter()
                .filter(|(_, entry)| !entry.tracked.is_busy())
                .map(|(id, _)| *id)
                .take(excess)
                .collect();
            for id in finished {
                entries.remove(&id);
            }
        }
        if entries.len() >= self.capacity {
            tracing::warn!(
                capacity = self.capacity,
                "Operation registry full, rejecting new operation"
            );
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        entries.insert(
            id,
            Entry {
                started_at: Utc::now(),
                tracked,
            },
        );
        Some(id)
    }

    pub fn view(&self, id: u64) -> Option<serde_json::Result<OperationView>> {
        let entries = self.entries.read().unwrap_or_else(|p| p.into_inner());
        let entry = entries.get(&id)?;
        Some(entry.tracked.state_json().map(|state| OperationView {
            id,
            kind: entry.tracked.kind(),
            started_at: entry.started_at,
            busy: entry.tracked.is_busy(),
            state,
        }))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|p| p.into_inner()).len()
    }
}
