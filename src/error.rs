use std::time::Duration;

use thiserror::Error;

use crate::address::Address;

/// The error surface of the actor runtime core.
///
/// Every failure that can reach application code (as opposed to a failure
/// that is converted into a supervision message) is one of these kinds.
#[derive(Error, Debug, Clone)]
pub enum AsysError {
    #[error("request to {target} timed out after {after:?}")]
    Timeout { target: Address, after: Duration },

    #[error("message to {address} was routed to dead letters")]
    DeadLetter { address: Address },

    #[error("reply from {target} did not match the expected type")]
    TypeMismatch { target: Address },

    #[error("invalid spawn: {reason}")]
    InvalidSpawn { reason: String },

    #[error("actor {who} failed: {reason}")]
    ActorFailure { who: Address, reason: String },

    #[error("supervisor for {who} escalated after {failures} failures")]
    SupervisorEscalated { who: Address, failures: u32 },

    #[error("operation attempted after system shutdown")]
    Shutdown,
}

impl AsysError {
    pub fn dead_letter(address: Address) -> Self {
        AsysError::DeadLetter { address }
    }
}
