use std::any::Any;
use std::sync::Arc;

use crate::address::Address;
use crate::context::ActorContext;
use crate::dead_letter::DeadLetterProcess;
use crate::event_stream::EventStream;
use crate::future::FutureProcess;
use crate::message::AnyMessage;
use crate::protocol::SystemMsg;

/// An endpoint accepting user and system messages for one address (spec
/// §3 Process). A `Process` lives in the
/// [`ProcessRegistry`](crate::registry::ProcessRegistry); the registry
/// owns the one strong reference, every `Address` is only a weak
/// logical key back to it.
///
/// `LocalProcess` is just `Arc<ActorContext>`: a context already knows
/// how to enqueue into its own mailbox and trigger a turn, so no
/// separate wrapper type is needed (unlike the teacher, which keeps a
/// generic `ActorRef<Msg>` split from `ActorCell`; this crate erases
/// `Msg` at the context boundary from the start, so the context itself
/// can serve as the uniform process handle).
///
/// `RemoteProcess` is intentionally absent: remote transport is an
/// external collaborator behind this same seam (spec §1), not part of
/// the core. A pluggable implementation would add a variant here
/// without touching anything else on this enum's call sites, which is
/// exactly the seam spec §6 describes.
#[derive(Clone)]
pub enum Process {
    Local(Arc<ActorContext>),
    DeadLetter(Arc<DeadLetterProcess>),
    Future(Arc<FutureProcess>),
    EventStream(Arc<EventStreamProcess>),
}

impl Process {
    /// Deliver directly to this process as though it were the intended
    /// target. Routing a message to dead letters because the *real*
    /// target was missing goes through
    /// [`DeadLetterProcess::record`](crate::dead_letter::DeadLetterProcess::record)
    /// instead, since that path needs the original address, which this
    /// process (when it happens to be the dead-letter sink itself) does
    /// not otherwise have.
    pub fn send_user(&self, msg: AnyMessage, sender: Option<Address>) {
        match self {
            Process::Local(ctx) => ctx.enqueue_user(msg, sender),
            Process::DeadLetter(p) => p.record(p.address.clone(), msg, sender),
            Process::Future(p) => p.send_user(msg),
            Process::EventStream(p) => p.send_user(msg),
        }
    }

    pub fn send_system(&self, msg: SystemMsg) {
        if let Process::Local(ctx) = self {
            ctx.enqueue_system(msg);
        }
    }

    pub fn address(&self) -> &Address {
        match self {
            Process::Local(ctx) => ctx.myself(),
            Process::DeadLetter(p) => &p.address,
            Process::Future(p) => &p.address,
            Process::EventStream(p) => &p.address,
        }
    }
}

/// The system-wide event stream exposed as a `Process` so it can be
/// addressed uniformly (spec §4.7: EventStream is reachable the same
/// way any other process is), in addition to the direct `Arc<EventStream>`
/// handle components hold for publishing without an address lookup.
pub struct EventStreamProcess {
    pub address: Address,
    pub stream: Arc<EventStream>,
}

impl EventStreamProcess {
    pub fn send_user(&self, msg: AnyMessage) {
        if let Some(boxed) = msg.into_any() {
            self.stream.publish_boxed(boxed as Box<dyn Any + Send>);
        }
    }
}
