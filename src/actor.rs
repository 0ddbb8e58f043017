use std::sync::Arc;

use async_trait::async_trait;

use crate::address::Address;
use crate::context::ActorContext;
use crate::error::AsysError;
use crate::mailbox::MailboxConfig;
use crate::message::{AnyMessage, Message};
use crate::middleware::Middleware;
use crate::protocol::Terminated;
use crate::supervision::Strategy;

/// The Producer seam (spec §6): an actor factory `produce() -> Actor`,
/// and an Actor exposing one operation, `recv`.
///
/// Async so that a receive may suspend; `reenter_after` is the only
/// sanctioned way to interleave an external wait with other messages
/// while still honoring the single-threaded-per-actor invariant (spec
/// §5). Grounded on the teacher's `async_trait`-based `Actor` definition
/// (`src/actor/actor.rs`), which this crate treats as the live lineage
/// (the top-level, synchronous `Actor` trait found elsewhere in the same
/// retrieval predates it and is not used).
#[async_trait]
pub trait Actor: Send + 'static {
    type Msg: Message;

    /// Delivered to the fresh instance immediately after `Started`
    /// (spec §3: "`Started` is always the first user-level message an
    /// actor observes").
    async fn pre_start(&mut self, _ctx: &ActorContext) {}
    async fn post_start(&mut self, _ctx: &ActorContext) {}

    /// Delivered to the *old* instance the moment a restart begins,
    /// before its children are stopped (spec §4.4 restart protocol:
    /// "delivers `Restarting` user message to the current actor").
    async fn pre_restart(&mut self, _ctx: &ActorContext) {}

    /// Delivered to the current instance the moment a stop begins,
    /// before its children are stopped (spec §4.4 stop protocol:
    /// "delivers `Stopping`").
    async fn pre_stop(&mut self, _ctx: &ActorContext) {}

    /// Delivered last, once every child has terminated, right before
    /// the instance is disposed (spec §3: "`Stopped` is always the last
    /// [message]").
    async fn post_stop(&mut self, _ctx: &ActorContext) {}

    /// Default strategy used when this actor supervises children and no
    /// `Props::with_supervisor` override was given.
    fn supervisor_strategy(&self) -> Strategy {
        Strategy::default()
    }

    async fn recv(&mut self, ctx: &ActorContext, msg: Self::Msg, sender: Option<Address>);

    /// Delivered when a watched address terminates (spec §4.5: "deliver
    /// as a user message to actor receive"). Kept as its own hook rather
    /// than forced through `Self::Msg`: an arbitrary actor's message
    /// type has no reason to know about `Terminated`, so this mirrors how
    /// `Started`/`Stopping`/`Stopped` already became dedicated hooks here.
    async fn on_terminated(&mut self, _ctx: &ActorContext, _terminated: Terminated) {}
}

/// Type-erased view of an [`Actor`] the mailbox turn drives without
/// being generic over any concrete `Msg`. Blanket-implemented for every
/// `Actor`, mirroring how the teacher's `BoxActor<Msg>` lets the kernel
/// hold actors without naming their type.
#[async_trait]
pub(crate) trait ErasedActor: Send {
    async fn pre_start(&mut self, ctx: &ActorContext);
    async fn post_start(&mut self, ctx: &ActorContext);
    async fn pre_restart(&mut self, ctx: &ActorContext);
    async fn pre_stop(&mut self, ctx: &ActorContext);
    async fn post_stop(&mut self, ctx: &ActorContext);
    fn supervisor_strategy(&self) -> Strategy;
    async fn recv_any(
        &mut self,
        ctx: &ActorContext,
        msg: AnyMessage,
        sender: Option<Address>,
    ) -> Result<(), AsysError>;
    async fn on_terminated(&mut self, ctx: &ActorContext, terminated: Terminated);
}

#[async_trait]
impl<A: Actor> ErasedActor for A {
    async fn pre_start(&mut self, ctx: &ActorContext) {
        Actor::pre_start(self, ctx).await
    }

    async fn post_start(&mut self, ctx: &ActorContext) {
        Actor::post_start(self, ctx).await
    }

    async fn pre_restart(&mut self, ctx: &ActorContext) {
        Actor::pre_restart(self, ctx).await
    }

    async fn pre_stop(&mut self, ctx: &ActorContext) {
        Actor::pre_stop(self, ctx).await
    }

    async fn post_stop(&mut self, ctx: &ActorContext) {
        Actor::post_stop(self, ctx).await
    }

    fn supervisor_strategy(&self) -> Strategy {
        Actor::supervisor_strategy(self)
    }

    async fn recv_any(
        &mut self,
        ctx: &ActorContext,
        mut msg: AnyMessage,
        sender: Option<Address>,
    ) -> Result<(), AsysError> {
        match msg.take::<A::Msg>() {
            Ok(typed) => {
                Actor::recv(self, ctx, typed, sender).await;
                Ok(())
            }
            Err(_) => Err(AsysError::TypeMismatch {
                target: ctx.myself().clone(),
            }),
        }
    }

    async fn on_terminated(&mut self, ctx: &ActorContext, terminated: Terminated) {
        Actor::on_terminated(self, ctx, terminated).await
    }
}

/// Produces a fresh, boxed, type-erased actor instance. One `Props` is
/// kept per address so the same factory can be invoked again on restart
/// (spec §4.4 restart protocol: "call Producer").
pub(crate) trait ActorProducer: Send + Sync {
    fn produce(&self) -> Box<dyn ErasedActor>;
}

struct FnProducer<F>(F);
impl<A, F> ActorProducer for FnProducer<F>
where
    A: Actor,
    F: Fn() -> A + Send + Sync + 'static,
{
    fn produce(&self) -> Box<dyn ErasedActor> {
        Box::new((self.0)())
    }
}

/// Configuration bundle used to spawn an actor (spec §6 Props). Built
/// with `Props::new`/`new_args` then decorated with the `with_*`
/// builders, the same progressive-builder shape as the teacher's
/// `Props::new`/`new_args` pair (`src/actor/props.rs`), collapsed here
/// into a single type since this crate erases `Msg` at the cell
/// boundary rather than keeping every `ActorRef` generic over it.
pub struct Props {
    pub(crate) producer: Arc<dyn ActorProducer>,
    pub mailbox: Option<MailboxConfig>,
    pub supervisor_strategy: Option<Strategy>,
    pub guardian_strategy: bool,
    pub sender_middleware: Vec<Middleware>,
    pub receiver_middleware: Vec<Middleware>,
}

impl Props {
    pub fn new<A, F>(factory: F) -> Self
    where
        A: Actor,
        F: Fn() -> A + Send + Sync + 'static,
    {
        Props {
            producer: Arc::new(FnProducer(factory)),
            mailbox: None,
            supervisor_strategy: None,
            guardian_strategy: false,
            sender_middleware: Vec::new(),
            receiver_middleware: Vec::new(),
        }
    }

    pub fn new_args<A, F, Args>(factory: F, args: Args) -> Self
    where
        A: Actor,
        Args: Clone + Send + Sync + 'static,
        F: Fn(Args) -> A + Send + Sync + 'static,
    {
        Props::new(move || factory(args.clone()))
    }

    pub fn with_supervisor(mut self, strategy: Strategy) -> Self {
        self.supervisor_strategy = Some(strategy);
        self
    }

    /// Marks this `Props` as only spawnable directly from the root
    /// (spec §4.8): attaches the actor under the guardian matching this
    /// strategy instead of the caller's own context.
    pub fn with_guardian_strategy(mut self, strategy: Strategy) -> Self {
        self.guardian_strategy = true;
        self.supervisor_strategy = Some(strategy);
        self
    }

    pub fn with_mailbox_throughput(mut self, throughput: usize) -> Self {
        self.mailbox = Some(MailboxConfig { throughput });
        self
    }

    pub fn with_sender_middleware(mut self, mw: Middleware) -> Self {
        self.sender_middleware.push(mw);
        self
    }

    pub fn with_receiver_middleware(mut self, mw: Middleware) -> Self {
        self.receiver_middleware.push(mw);
        self
    }
}
