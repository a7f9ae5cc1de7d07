//! Error types for the state store.

use crate::actions::ActionType;
use std::any::Any;
use thiserror::Error;

/// Main error type for store operations.
///
/// Only [`StoreError::ReentrantDispatch`] can come out of a dispatch; every
/// other dispatch result (veto, no-op, reducer failure) is reported through
/// [`DispatchOutcome`](crate::DispatchOutcome).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reentrant dispatch rejected: {attempted} while a dispatch is in progress")]
    ReentrantDispatch { attempted: String },

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Async dispatch worker disconnected before reporting an outcome")]
    WorkerDisconnected,
}

impl StoreError {
    pub(crate) fn reentrant(attempted: impl Into<String>) -> Self {
        StoreError::ReentrantDispatch {
            attempted: attempted.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for StoreError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// A reducer could not compute the next state.
///
/// The store turns this into a failed dispatch that leaves the current state
/// untouched.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ReducerError {
    #[error("Invalid payload for {action_type}: {reason}")]
    InvalidPayload {
        action_type: ActionType,
        reason: String,
    },

    #[error("Reducer failed: {0}")]
    Failed(String),

    #[error("Reducer panicked: {0}")]
    Panicked(String),
}

/// Raised by validation-style middleware.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Validation failed: {message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure inside a middleware's `after_dispatch` hook.
///
/// Reported and counted, never rolls back the committed mutation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MiddlewareError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Middleware failed: {0}")]
    Failed(String),

    #[error("Middleware panicked: {0}")]
    Panicked(String),
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
