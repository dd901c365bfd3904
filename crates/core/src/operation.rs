//! Lifecycle tracking for one logical asynchronous action.
//!
//! An [`OperationTracker`] holds the current [`OperationState`] in a watch
//! channel so any number of observers can follow it. Every `start` hands out a
//! [`Ticket`]; settling through the ticket lets the tracker discard results of
//! operations that were reset or, under [`SettlementPolicy::LatestStartOnly`],
//! superseded by a newer start.

use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex},
};

use serde::Serialize;
use tokio::sync::watch;

use crate::AppError;

/// Advisory progress label for an in-flight operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Stage {
    Reading,
    Submitting,
    Confirming { tx_hash: String },
    // The deployment pipeline runs remotely and answers in one response, so
    // a deployment only enters `Deploying`. The rest name the service's
    // sub-stages; `Registering` is also entered by factory registration.
    Deploying,
    Activating,
    Initializing,
    Registering,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Reading => "reading",
            Stage::Submitting => "submitting",
            Stage::Confirming { .. } => "confirming",
            Stage::Deploying => "deploying",
            Stage::Activating => "activating",
            Stage::Initializing => "initializing",
            Stage::Registering => "registering",
        }
    }

    /// One of the stages of the remote deployment pipeline.
    pub fn is_deployment(&self) -> bool {
        matches!(
            self,
            Stage::Deploying | Stage::Activating | Stage::Initializing | Stage::Registering
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalised failure recorded by a tracker.
#[derive(Debug, Clone, Serialize)]
pub struct OperationError {
    message: String,
    #[serde(skip)]
    cause: Option<Arc<AppError>>,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error the message was derived from, if any.
    pub fn cause(&self) -> Option<&AppError> {
        self.cause.as_deref()
    }
}

impl From<AppError> for OperationError {
    fn from(err: AppError) -> Self {
        Self {
            message: err.to_string(),
            cause: Some(Arc::new(err)),
        }
    }
}

impl PartialEq for OperationError {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for OperationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Lifecycle of one asynchronous unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OperationState<T> {
    Idle,
    InFlight { stage: Option<Stage> },
    Succeeded { result: T },
    Failed { error: OperationError },
}

impl<T> OperationState<T> {
    pub fn is_busy(&self) -> bool {
        matches!(self, OperationState::InFlight { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, OperationState::Idle)
    }

    pub fn stage(&self) -> Option<&Stage> {
        match self {
            OperationState::InFlight { stage } => stage.as_ref(),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            OperationState::Succeeded { result } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&OperationError> {
        match self {
            OperationState::Failed { error } => Some(error),
            _ => None,
        }
    }
}

impl<T> Default for OperationState<T> {
    fn default() -> Self {
        OperationState::Idle
    }
}

/// Which settlements a tracker accepts when starts overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SettlementPolicy {
    /// Whichever operation settles last determines the state, even if it was
    /// started before another one.
    #[default]
    LastSettlementWins,
    /// Only the most recently started operation may settle.
    LatestStartOnly,
}

/// Fencing token handed out by [`OperationTracker::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    epoch: u64,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Default)]
struct Fence {
    issued: u64,
    epoch: u64,
}

impl Fence {
    fn accepts(&self, ticket: &Ticket, policy: SettlementPolicy) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        match policy {
            SettlementPolicy::LastSettlementWins => true,
            SettlementPolicy::LatestStartOnly => ticket.seq == self.issued,
        }
    }
}

/// Tracks the lifecycle of exactly one logical asynchronous action.
pub struct OperationTracker<T> {
    state: watch::Sender<OperationState<T>>,
    fence: Mutex<Fence>,
    policy: SettlementPolicy,
}

impl<T> fmt::Debug for OperationTracker<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationTracker")
            .field("state", &*self.state.borrow())
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T> Default for OperationTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OperationTracker<T> {
    /// New tracker in `Idle` with last-settlement-wins semantics.
    pub fn new() -> Self {
        Self::with_policy(SettlementPolicy::default())
    }

    pub fn with_policy(policy: SettlementPolicy) -> Self {
        Self {
            state: watch::Sender::new(OperationState::Idle),
            fence: Mutex::new(Fence::default()),
            policy,
        }
    }

    pub fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<OperationState<T>> {
        self.state.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().is_busy()
    }

    /// Enter `InFlight` from any state. Clears any recorded error.
    pub fn start(&self, stage: Option<Stage>) -> Ticket {
        let mut fence = self.lock_fence();
        fence.issued += 1;
        let ticket = Ticket {
            seq: fence.issued,
            epoch: fence.epoch,
        };
        self.state.send_replace(OperationState::InFlight { stage });
        ticket
    }

    /// Update the stage label. Ignored unless the tracker is `InFlight`.
    pub fn advance(&self, stage: Stage) {
        self.state.send_if_modified(|state| match state {
            OperationState::InFlight { stage: current } => {
                *current = Some(stage);
                true
            }
            _ => false,
        });
    }

    /// [`advance`](Self::advance), but only if `ticket` may still settle.
    pub fn advance_for(&self, ticket: &Ticket, stage: Stage) {
        let fence = self.lock_fence();
        if fence.accepts(ticket, self.policy) {
            self.advance(stage);
        }
    }

    pub fn succeed(&self, result: T) {
        self.state.send_replace(OperationState::Succeeded { result });
    }

    pub fn fail(&self, error: impl Into<OperationError>) {
        self.state.send_replace(OperationState::Failed {
            error: error.into(),
        });
    }

    /// Force `Idle`. Operations started before the reset can no longer settle.
    pub fn reset(&self) {
        let mut fence = self.lock_fence();
        fence.epoch += 1;
        self.state.send_replace(OperationState::Idle);
    }

    fn lock_fence(&self) -> std::sync::MutexGuard<'_, Fence> {
        // The fence only holds two counters; a poisoned lock leaves them usable.
        self.fence.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> OperationTracker<T> {
    /// Clone of the current state.
    pub fn snapshot(&self) -> OperationState<T> {
        self.state.borrow().clone()
    }

    /// Record the outcome of the operation identified by `ticket`.
    ///
    /// The outcome is returned to the caller whether or not the tracker
    /// accepted it.
    pub fn settle(
        &self,
        ticket: &Ticket,
        outcome: Result<T, AppError>,
    ) -> Result<T, OperationError> {
        let outcome = outcome.map_err(OperationError::from);
        let fence = self.lock_fence();
        if !fence.accepts(ticket, self.policy) {
            tracing::debug!(seq = ticket.seq, "Discarding stale settlement");
            return outcome;
        }
        match &outcome {
            Ok(result) => self.succeed(result.clone()),
            Err(error) => self.fail(error.clone()),
        }
        outcome
    }

    /// Start, await `operation`, then settle with its outcome.
    pub async fn track<F>(&self, stage: Option<Stage>, operation: F) -> Result<T, OperationError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let ticket = self.start(stage);
        let outcome = operation.await;
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "Operation failed");
        }
        self.settle(&ticket, outcome)
    }
}
