use std::time::SystemTime;

use crate::address::Address;
use crate::supervision::RestartStatistics;

/// System-level messages, always drained ahead of user messages by the
/// mailbox (spec: system queue is unbounded and high priority).
#[derive(Debug, Clone)]
pub enum SystemMsg {
    Started,
    Stop,
    /// Carries the backoff delay a supervisor decided to apply before the
    /// restarted child resumes (`None` for strategies without one).
    Restart(Option<std::time::Duration>),
    SuspendMailbox,
    ResumeMailbox,
    Failure(Failure),
    Watch(Address),
    Unwatch(Address),
    Terminated(Terminated),
    Continuation(Continuation),
}

#[derive(Debug, Clone)]
pub struct Failure {
    pub who: Address,
    pub reason: String,
    pub stats: RestartStatistics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminatedReason {
    Stopped,
    AddressTerminated,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct Terminated {
    pub who: Address,
    pub reason: TerminatedReason,
}

/// Carries the captured original message back to the actor once the
/// external task awaited via `reenter_after` completes.
#[derive(Debug, Clone)]
pub struct Continuation {
    pub id: u64,
}

/// A user-level marker message requesting the target stop after draining
/// everything enqueued ahead of it (spec §4.3 `poison`).
#[derive(Debug, Clone, Copy)]
pub struct PoisonPill;

/// Injected by the mailbox when a receive-timeout fires.
#[derive(Debug, Clone, Copy)]
pub struct ReceiveTimeout;

/// Messages tagged with this marker do not reset an armed receive-timeout
/// (spec §4.3, §8 property 8).
pub trait NonInfluencing {}
impl NonInfluencing for ReceiveTimeout {}

/// Published to the [`EventStream`](crate::event_stream::EventStream) for
/// every message that lands in [`DeadLetterProcess`](crate::dead_letter::DeadLetterProcess).
#[derive(Debug, Clone)]
pub struct DeadLetterEvent {
    pub address: Address,
    pub message: String,
    pub sender: Option<Address>,
    pub at: SystemTime,
}

/// Sent back to a requester whose target was a dead letter, so
/// `request_reply` fails fast instead of waiting out the timeout.
#[derive(Debug, Clone)]
pub struct DeadLetterResponse {
    pub address: Address,
}
