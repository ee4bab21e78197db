//! Coordinator error types.

use crossing_transport::TransportError;
use crossing_types::{CoordinationState, ProcessId};
use thiserror::Error;

/// Errors surfaced by coordinator operations.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// A parameter failed validation before any state changed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not legal from the current coordination state.
    #[error("{op} not allowed from state {state}")]
    InvalidState {
        op: &'static str,
        state: CoordinationState,
    },

    /// A drag session is already active.
    #[error("a drag session is already active (started by pid {0})")]
    ConflictingSession(ProcessId),

    /// A thumbnail delegate is already registered.
    #[error("a thumbnail delegate is already registered")]
    AlreadyRegistered,

    /// No drag session is active.
    #[error("no active drag session")]
    NoActiveSession,

    /// The remote peer rejected the request, or never acknowledged it.
    #[error("remote operation failed: {0}")]
    RemoteFailure(String),

    /// Configuration could not be loaded or parsed.
    #[error("config error: {0}")]
    Config(String),

    /// The coordinator event pump is already running.
    #[error("already running")]
    AlreadyRunning,
}

impl From<TransportError> for CoordinatorError {
    fn from(err: TransportError) -> Self {
        Self::RemoteFailure(err.to_string())
    }
}
