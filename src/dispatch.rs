//! Dispatch results and pipeline phases.

use crate::actions::ActionType;
use crate::error::{ReducerError, Result, StoreError};
use crate::middleware::Veto;
use crate::types::ActionId;
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::fmt;
use std::time::Duration;

/// What a dispatch did.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    /// A new state was installed, recorded and broadcast.
    Committed {
        action_id: ActionId,
        action_type: ActionType,
    },

    /// Nothing changed. `handled` is false when no reducer handles the
    /// action type.
    NoOp { handled: bool },

    /// A middleware vetoed the action before it reached the reducer.
    Blocked { middleware: String, veto: Veto },

    /// The reducer failed; the previous state is kept.
    Failed(ReducerError),
}

impl DispatchOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, DispatchOutcome::Committed { .. })
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, DispatchOutcome::NoOp { .. })
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, DispatchOutcome::Blocked { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DispatchOutcome::Failed(_))
    }

    /// True when the store's state changed.
    pub fn changed_state(&self) -> bool {
        self.is_committed()
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Committed { action_type, .. } => write!(f, "committed {}", action_type),
            DispatchOutcome::NoOp { handled: true } => f.write_str("no change"),
            DispatchOutcome::NoOp { handled: false } => f.write_str("no reducer"),
            DispatchOutcome::Blocked { middleware, veto } => {
                write!(f, "{} by {}", veto, middleware)
            }
            DispatchOutcome::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Where the store's dispatch pipeline currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DispatchPhase {
    Idle = 0,
    Entering = 1,
    MiddlewarePre = 2,
    Reducing = 3,
    Committing = 4,
    MiddlewarePost = 5,
    Notifying = 6,
    /// Vetoed during `MiddlewarePre`.
    Aborted = 7,
    /// The reducer failed.
    Failed = 8,
}

impl DispatchPhase {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => DispatchPhase::Entering,
            2 => DispatchPhase::MiddlewarePre,
            3 => DispatchPhase::Reducing,
            4 => DispatchPhase::Committing,
            5 => DispatchPhase::MiddlewarePost,
            6 => DispatchPhase::Notifying,
            7 => DispatchPhase::Aborted,
            8 => DispatchPhase::Failed,
            _ => DispatchPhase::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchPhase::Idle => "idle",
            DispatchPhase::Entering => "entering",
            DispatchPhase::MiddlewarePre => "middleware_pre",
            DispatchPhase::Reducing => "reducing",
            DispatchPhase::Committing => "committing",
            DispatchPhase::MiddlewarePost => "middleware_post",
            DispatchPhase::Notifying => "notifying",
            DispatchPhase::Aborted => "aborted",
            DispatchPhase::Failed => "failed",
        }
    }
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pending result of [`Store::dispatch_async`](crate::Store::dispatch_async).
pub struct DispatchTicket {
    action_id: ActionId,
    receiver: Receiver<Result<DispatchOutcome>>,
}

impl DispatchTicket {
    pub(crate) fn new(action_id: ActionId, receiver: Receiver<Result<DispatchOutcome>>) -> Self {
        Self {
            action_id,
            receiver,
        }
    }

    pub fn action_id(&self) -> &ActionId {
        &self.action_id
    }

    /// Block until the dispatch finishes.
    pub fn wait(self) -> Result<DispatchOutcome> {
        self.receiver
            .recv()
            .map_err(|_| StoreError::WorkerDisconnected)?
    }

    /// Block for at most `timeout`. `None` if the dispatch is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<DispatchOutcome>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(StoreError::WorkerDisconnected)),
        }
    }

    /// Non-blocking poll.
    pub fn try_outcome(&self) -> Option<Result<DispatchOutcome>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(StoreError::WorkerDisconnected)),
        }
    }
}

impl fmt::Debug for DispatchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTicket")
            .field("action_id", &self.action_id)
            .finish()
    }
}
