use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::sleep;

use crate::actor::{ActorProducer, ErasedActor, Props};
use crate::address::Address;
use crate::error::AsysError;
use crate::future::request_reply;
use crate::mailbox::Mailbox;
use crate::message::{AnyMessage, Envelope, Message};
use crate::middleware::{run_chain, Middleware};
use crate::process::Process;
use crate::protocol::{
    Continuation, Failure, PoisonPill, ReceiveTimeout, SystemMsg, Terminated, TerminatedReason,
};
use crate::registry::deliver_user;
use crate::supervision::{Directive, RestartStatistics, Strategy};
use crate::system::SystemHandle;

/// Ordinal lifecycle state (spec §3: `Alive -> Restarting -> Stopping ->
/// Stopped`, forward-only). Backed by an `AtomicU8` so a concurrent
/// `stop()` racing a supervisor-driven `restart()` just picks whichever
/// transition got there first; the loser's `advance` call is a no-op.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Lifecycle {
    Alive = 0,
    Restarting = 1,
    Stopping = 2,
    Stopped = 3,
}

impl Lifecycle {
    fn from_u8(v: u8) -> Lifecycle {
        match v {
            0 => Lifecycle::Alive,
            1 => Lifecycle::Restarting,
            2 => Lifecycle::Stopping,
            _ => Lifecycle::Stopped,
        }
    }
}

type Continue = Box<dyn FnOnce(&ActorContext) + Send>;

/// Per-actor state machine: lifecycle, children, watchers, restart
/// statistics, stash, receive-timeout, and the mailbox turn runner. Also
/// the object handed to `Actor::recv` as `&ActorContext`. Unlike the
/// teacher, which splits this into a generic `ActorRef<Msg>` plus an
/// internal `ActorCell`, this crate erases `Msg` at construction, so one
/// concrete, non-generic type can serve both roles (it is also exactly
/// what `Process::Local` wraps; see `process.rs`).
///
/// Grounded on the teacher's `ActorCell`/`Context<Msg>` split
/// (`kernel/kernel_ref.rs`, `actor/actor_cell.rs`) and the turn loop in
/// `kernel/mailbox.rs::run_mailbox`.
pub struct ActorContext {
    address: Address,
    parent: Option<Address>,
    pub(crate) system: SystemHandle,
    mailbox: Arc<Mailbox>,
    actor: AsyncMutex<Option<Box<dyn ErasedActor>>>,
    producer: Arc<dyn ActorProducer>,
    supervisor_strategy: Strategy,
    guardian_strategy: bool,
    sender_middleware: Vec<Middleware>,
    receiver_middleware: Vec<Middleware>,
    lifecycle: AtomicU8,
    children: DashMap<String, Address>,
    watchers: Mutex<Vec<Address>>,
    restart_stats: Mutex<RestartStatistics>,
    /// Restart statistics as observed by *this* context acting as a
    /// supervisor of its children, keyed by child id. Kept separately
    /// from each child's own `restart_stats` (which a child owns for its
    /// own bookkeeping) because the `within` window that governs when a
    /// count resets is a property of *this* context's configured
    /// strategy, not of the child.
    supervised_children: DashMap<String, RestartStatistics>,
    stash: Mutex<Vec<(AnyMessage, Option<Address>)>>,
    receive_timeout: Mutex<Option<ReceiveTimeoutHandle>>,
    reenter_counter: AtomicU64,
    reenter_pending: DashMap<u64, Continue>,
    current_sender: Mutex<Option<Address>>,
    self_weak: Mutex<Weak<ActorContext>>,
}

struct ReceiveTimeoutHandle {
    duration: Duration,
    generation: u64,
}

impl ActorContext {
    /// Constructs a context and its backing `LocalProcess`, registers it,
    /// spawns the `Started`/`pre_start`/`post_start` sequence, and returns
    /// the address. `Arc::new_cyclic` lets the context hand a `Weak<Self>`
    /// to itself before construction finishes, so it can re-trigger its
    /// own mailbox turns without a separate post-construction wiring step.
    pub(crate) fn create(
        address: Address,
        parent: Option<Address>,
        system: SystemHandle,
        props: Props,
    ) -> Address {
        let throughput = props
            .mailbox
            .map(|m| m.throughput)
            .unwrap_or_else(|| system.config.mailbox_throughput);
        let mailbox = Arc::new(Mailbox::new(throughput));
        let supervisor_strategy = props.supervisor_strategy.clone().unwrap_or_default();

        let ctx = Arc::new_cyclic(|weak: &Weak<ActorContext>| ActorContext {
            address: address.clone(),
            parent,
            system: system.clone(),
            mailbox,
            actor: AsyncMutex::new(None),
            producer: props.producer.clone(),
            supervisor_strategy,
            guardian_strategy: props.guardian_strategy,
            sender_middleware: props.sender_middleware.clone(),
            receiver_middleware: props.receiver_middleware.clone(),
            lifecycle: AtomicU8::new(Lifecycle::Alive as u8),
            children: DashMap::new(),
            watchers: Mutex::new(Vec::new()),
            restart_stats: Mutex::new(RestartStatistics::default()),
            supervised_children: DashMap::new(),
            stash: Mutex::new(Vec::new()),
            receive_timeout: Mutex::new(None),
            reenter_counter: AtomicU64::new(0),
            reenter_pending: DashMap::new(),
            current_sender: Mutex::new(None),
            self_weak: Mutex::new(weak.clone()),
        });

        system.registry.try_add(address.clone(), Process::Local(ctx.clone()));

        tokio::spawn(async move {
            ctx.init().await;
        });

        address
    }

    async fn init(self: Arc<Self>) {
        let mut instance = self.producer.produce();
        instance.pre_start(&self).await;
        instance.post_start(&self).await;
        *self.actor.lock().await = Some(instance);
        self.mailbox.resume();
        if self.mailbox.try_schedule() {
            self.spawn_turn();
        }
    }

    pub fn myself(&self) -> &Address {
        &self.address
    }

    /// Schedules one mailbox turn on the runtime. Stored nowhere as a
    /// closure (unlike an earlier draft of this crate); every call site
    /// that needs to re-trigger a turn already holds (or can cheaply
    /// reconstruct) an `Arc<ActorContext>`, which keeps the ownership
    /// story for "who may run a turn" explicit.
    fn spawn_turn(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            this.run_turn().await;
        });
    }

    fn upgrade(&self) -> Arc<ActorContext> {
        self.self_weak
            .lock()
            .unwrap()
            .upgrade()
            .expect("context always outlives its own weak handle")
    }

    pub(crate) fn enqueue_user(&self, msg: AnyMessage, sender: Option<Address>) {
        self.mailbox.post_user(Envelope { sender, msg });
        if self.mailbox.try_schedule() {
            self.upgrade().spawn_turn();
        }
    }

    pub(crate) fn enqueue_system(&self, msg: SystemMsg) {
        self.mailbox.post_system(msg);
        if self.mailbox.try_schedule() {
            self.upgrade().spawn_turn();
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }

    /// Advance the lifecycle if `next` is strictly ahead of the current
    /// state. Returns whether the transition was actually taken.
    fn advance_lifecycle(&self, next: Lifecycle) -> bool {
        loop {
            let current = self.lifecycle.load(Ordering::Acquire);
            if current >= next as u8 {
                return false;
            }
            if self
                .lifecycle
                .compare_exchange(current, next as u8, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return true;
            }
        }
    }

    // ---- mailbox turn loop -------------------------------------------------

    async fn run_turn(self: Arc<Self>) {
        loop {
            let system_msgs = self.mailbox.drain_system().await;
            for msg in system_msgs {
                match msg {
                    SystemMsg::SuspendMailbox => self.mailbox.suspend(),
                    SystemMsg::ResumeMailbox => self.mailbox.resume(),
                    other => self.clone().handle_system(other).await,
                }
            }

            if self.lifecycle() < Lifecycle::Stopping {
                let envelopes = self.mailbox.drain_user().await;
                for envelope in envelopes {
                    self.clone().handle_user(envelope).await;
                }
            }

            self.mailbox.clear_scheduled();
            if self.mailbox.is_empty().await || self.lifecycle() >= Lifecycle::Stopped {
                break;
            }
            if !self.mailbox.try_schedule() {
                break;
            }
        }
    }

    async fn handle_user(self: Arc<Self>, envelope: Envelope) {
        let Envelope { sender, msg } = envelope;

        if self.lifecycle() >= Lifecycle::Stopped {
            crate::registry::deliver_user(&self.system.registry, &self.address, msg, sender);
            return;
        }

        if msg.is_a::<PoisonPill>() {
            self.do_stop().await;
            return;
        }

        let non_influencing = msg.is_a::<ReceiveTimeout>();
        if !non_influencing {
            self.rearm_receive_timeout();
        }

        *self.current_sender.lock().unwrap() = sender.clone();
        let msg = run_chain(&self.receiver_middleware, Envelope { sender, msg });

        let outcome = {
            let mut guard = self.actor.lock().await;
            let actor = match guard.as_mut() {
                Some(a) => a,
                None => return,
            };
            AssertUnwindSafe(actor.recv_any(&self, msg.msg, msg.sender))
                .catch_unwind()
                .await
        };

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.clone().report_failure(e.to_string()).await,
            Err(_) => {
                self.clone()
                    .report_failure("actor panicked while handling a message".to_string())
                    .await
            }
        }
    }

    async fn handle_system(self: Arc<Self>, msg: SystemMsg) {
        match msg {
            SystemMsg::Started => {}
            SystemMsg::Stop => self.do_stop().await,
            SystemMsg::Restart(backoff) => self.do_restart(backoff).await,
            SystemMsg::SuspendMailbox | SystemMsg::ResumeMailbox => unreachable!(
                "intercepted directly in run_turn before reaching handle_system"
            ),
            SystemMsg::Failure(f) => self.handle_failure(f).await,
            SystemMsg::Watch(watcher) => self.handle_watch(watcher),
            SystemMsg::Unwatch(watcher) => {
                self.watchers.lock().unwrap().retain(|w| w != &watcher);
            }
            SystemMsg::Terminated(t) => self.handle_terminated(t).await,
            SystemMsg::Continuation(c) => self.handle_continuation(c).await,
        }
    }

    fn handle_watch(&self, watcher: Address) {
        if self.lifecycle() >= Lifecycle::Stopping {
            if let Some(process) = self.system.registry.get(&watcher) {
                process.send_system(SystemMsg::Terminated(Terminated {
                    who: self.address.clone(),
                    reason: TerminatedReason::Stopped,
                }));
            }
        } else {
            let mut watchers = self.watchers.lock().unwrap();
            if !watchers.contains(&watcher) {
                watchers.push(watcher);
            }
        }
    }

    async fn handle_terminated(self: Arc<Self>, t: Terminated) {
        self.children.remove(t.who.name());
        self.supervised_children.remove(t.who.id.as_str());
        let mut guard = self.actor.lock().await;
        if let Some(actor) = guard.as_mut() {
            actor.on_terminated(&self, t).await;
        }
    }

    async fn handle_continuation(&self, c: Continuation) {
        if let Some((_, cont)) = self.reenter_pending.remove(&c.id) {
            cont(self);
        }
    }

    // ---- failure / supervision --------------------------------------------

    async fn report_failure(self: Arc<Self>, reason: String) {
        self.mailbox.suspend();
        let stats = {
            let mut s = self.restart_stats.lock().unwrap();
            s.fail_within(Duration::from_secs(u64::MAX / 2));
            s.clone()
        };
        slog::warn!(self.system.log, "actor failed"; "actor" => %self.address, "reason" => &reason);

        let failure = Failure {
            who: self.address.clone(),
            reason,
            stats,
        };
        match &self.parent {
            Some(parent) => {
                if let Some(Process::Local(parent_ctx)) = self.system.registry.get(parent) {
                    parent_ctx.enqueue_system(SystemMsg::Failure(failure));
                }
            }
            None => {
                // Root guardian: spec §9.1(b), fixed default strategy,
                // only overridable by constructing System with a custom
                // root Props.
                slog::error!(self.system.log, "root guardian failed, restarting"; "reason" => &failure.reason);
                self.enqueue_system(SystemMsg::Restart(None));
            }
        }
    }

    async fn handle_failure(self: Arc<Self>, f: Failure) {
        let window = match &self.supervisor_strategy {
            Strategy::OneForOne { within, .. } | Strategy::AllForOne { within, .. } => *within,
            _ => Duration::from_secs(u64::MAX / 4),
        };
        let snapshot = {
            let mut entry = self
                .supervised_children
                .entry(f.who.id.clone())
                .or_insert_with(RestartStatistics::default);
            let count = entry.fail_within(window);
            RestartStatistics {
                failure_count: count,
                last_failure: entry.last_failure,
            }
        };

        let directive = self.supervisor_strategy.decide(&snapshot);
        let backoff = self.supervisor_strategy.backoff_for(&snapshot);

        match directive {
            Directive::Resume => {
                if let Some(Process::Local(child)) = self.system.registry.get(&f.who) {
                    child.mailbox.resume();
                    if child.mailbox.try_schedule() {
                        child.spawn_turn();
                    }
                }
            }
            Directive::Restart => {
                if self.supervisor_strategy.is_all_for_one() {
                    for child in self.children.iter() {
                        if let Some(Process::Local(c)) = self.system.registry.get(child.value()) {
                            c.enqueue_system(SystemMsg::Restart(backoff));
                        }
                    }
                } else if let Some(Process::Local(child)) = self.system.registry.get(&f.who) {
                    child.enqueue_system(SystemMsg::Restart(backoff));
                }
            }
            Directive::Stop => {
                if let Some(Process::Local(child)) = self.system.registry.get(&f.who) {
                    tokio::spawn(async move { child.do_stop().await });
                }
            }
            Directive::Escalate => {
                slog::error!(self.system.log, "supervisor escalating"; "child" => %f.who, "failures" => snapshot.failure_count);
                match &self.parent {
                    Some(parent) => {
                        if let Some(Process::Local(parent_ctx)) = self.system.registry.get(parent)
                        {
                            parent_ctx.enqueue_system(SystemMsg::Failure(Failure {
                                who: self.address.clone(),
                                reason: f.reason,
                                stats: snapshot,
                            }));
                        }
                    }
                    None => self.enqueue_system(SystemMsg::Restart(None)),
                }
            }
        }
    }

    // ---- restart / stop protocols ------------------------------------------

    async fn stop_children_and_wait(&self) {
        let children: Vec<Address> = self.children.iter().map(|e| e.value().clone()).collect();
        let joins: Vec<_> = children
            .into_iter()
            .filter_map(|addr| match self.system.registry.get(&addr) {
                Some(Process::Local(child)) => Some(tokio::spawn(async move {
                    child.do_stop().await;
                })),
                _ => None,
            })
            .collect();
        for j in joins {
            let _ = j.await;
        }
        // Every child just got stopped, but each one's own `Terminated`
        // notification back to us is only queued, not processed yet (it
        // arrives through our own mailbox like any other system message).
        // Clear the table now rather than waiting for that round trip, so
        // a `pre_start` running right after this (restart) can reuse a
        // just-freed child name immediately.
        self.children.clear();
    }

    async fn do_restart(self: Arc<Self>, backoff: Option<Duration>) {
        if !self.advance_lifecycle(Lifecycle::Restarting) {
            return;
        }
        self.cancel_receive_timeout();
        {
            let mut guard = self.actor.lock().await;
            if let Some(actor) = guard.as_mut() {
                actor.pre_restart(&self).await;
            }
        }

        self.stop_children_and_wait().await;

        let mut fresh = self.producer.produce();
        fresh.pre_start(&self).await;
        fresh.post_start(&self).await;
        *self.actor.lock().await = Some(fresh);

        let stashed: Vec<_> = std::mem::take(&mut *self.stash.lock().unwrap());
        self.lifecycle.store(Lifecycle::Alive as u8, Ordering::Release);

        if let Some(delay) = backoff {
            sleep(delay).await;
        }

        for (msg, sender) in stashed {
            self.clone().handle_user(Envelope { sender, msg }).await;
        }

        self.mailbox.resume();
        if self.mailbox.try_schedule() {
            self.spawn_turn();
        }
    }

    pub(crate) async fn do_stop(self: Arc<Self>) {
        if !self.advance_lifecycle(Lifecycle::Stopping) {
            return;
        }
        self.cancel_receive_timeout();
        {
            let mut guard = self.actor.lock().await;
            if let Some(actor) = guard.as_mut() {
                actor.pre_stop(&self).await;
            }
        }

        self.stop_children_and_wait().await;

        {
            let mut guard = self.actor.lock().await;
            if let Some(actor) = guard.as_mut() {
                actor.post_stop(&self).await;
            }
            *guard = None;
        }

        self.system.registry.remove(&self.address);

        // Anything still queued when we stopped is never silently
        // dropped (spec §4 Process lifecycle): flush it to dead letters.
        let (users, _systems) = self.mailbox.flush().await;
        for envelope in users {
            deliver_user(
                &self.system.registry,
                &self.address,
                envelope.msg,
                envelope.sender,
            );
        }

        let terminated = Terminated {
            who: self.address.clone(),
            reason: TerminatedReason::Stopped,
        };
        let watchers: Vec<Address> = self.watchers.lock().unwrap().drain(..).collect();
        for watcher in watchers {
            if let Some(process) = self.system.registry.get(&watcher) {
                process.send_system(SystemMsg::Terminated(terminated.clone()));
            }
        }
        if let Some(parent) = &self.parent {
            if let Some(Process::Local(parent_ctx)) = self.system.registry.get(parent) {
                parent_ctx.enqueue_system(SystemMsg::Terminated(terminated));
            }
        }

        self.lifecycle.store(Lifecycle::Stopped as u8, Ordering::Release);
    }

    // ---- receive-timeout ----------------------------------------------------

    fn rearm_receive_timeout(&self) {
        let duration = match self.receive_timeout.lock().unwrap().as_ref() {
            Some(h) => h.duration,
            None => return,
        };
        self.arm_receive_timeout(duration);
    }

    fn arm_receive_timeout(&self, duration: Duration) {
        let generation = {
            let mut guard = self.receive_timeout.lock().unwrap();
            let generation = guard.as_ref().map(|h| h.generation + 1).unwrap_or(0);
            *guard = Some(ReceiveTimeoutHandle { duration, generation });
            generation
        };
        let this = self.upgrade();
        tokio::spawn(async move {
            sleep(duration).await;
            let still_current = matches!(
                this.receive_timeout.lock().unwrap().as_ref(),
                Some(h) if h.generation == generation
            );
            if still_current && this.lifecycle() == Lifecycle::Alive {
                this.enqueue_user(AnyMessage::new(ReceiveTimeout), None);
            }
        });
    }

    pub fn cancel_receive_timeout(&self) {
        *self.receive_timeout.lock().unwrap() = None;
    }

    // ---- public operations exposed to actor code (spec §4.3) ---------------

    fn current_sender(&self) -> Option<Address> {
        self.current_sender.lock().unwrap().clone()
    }

    pub async fn spawn(&self, props: Props) -> Result<Address, AsysError> {
        let name = self.system.registry.next_id();
        self.spawn_named(props, &name).await
    }

    pub async fn spawn_prefix(
        &self,
        props: Props,
        prefix: &str,
    ) -> Result<Address, AsysError> {
        let name = format!("{}-{}", prefix, self.system.registry.next_id());
        self.spawn_named(props, &name).await
    }

    pub async fn spawn_named(
        &self,
        props: Props,
        name: &str,
    ) -> Result<Address, AsysError> {
        crate::validate::validate_name(name).map_err(|e| AsysError::InvalidSpawn {
            reason: e,
        })?;
        if props.guardian_strategy {
            return Err(AsysError::InvalidSpawn {
                reason: format!(
                    "props carrying a guardian strategy may only be spawned from the root, not from {}",
                    self.address
                ),
            });
        }
        if self.children.contains_key(name) {
            return Err(AsysError::InvalidSpawn {
                reason: format!("a child named '{}' already exists under {}", name, self.address),
            });
        }
        let child_address = self.address.child(name);
        ActorContext::create(
            child_address.clone(),
            Some(self.address.clone()),
            self.system.clone(),
            props,
        );
        self.children.insert(name.to_string(), child_address.clone());
        Ok(child_address)
    }

    /// Runs an outgoing envelope through the sender middleware chain
    /// configured on this actor's `Props` before handing it to the
    /// registry (spec §2 component 13, §9 "function-composition
    /// pipeline built at props construction").
    fn send_out(&self, target: &Address, msg: AnyMessage, sender: Option<Address>) {
        let envelope = run_chain(&self.sender_middleware, Envelope { sender, msg });
        deliver_user(&self.system.registry, target, envelope.msg, envelope.sender);
    }

    pub fn send<M: Message>(&self, target: &Address, msg: M) {
        self.send_out(target, AnyMessage::new(msg), None);
    }

    pub fn request<M: Message>(&self, target: &Address, msg: M, sender: Option<Address>) {
        let sender = sender.or_else(|| Some(self.address.clone()));
        self.send_out(target, AnyMessage::new(msg), sender);
    }

    pub async fn request_reply<M: Message, R: Message>(
        &self,
        target: &Address,
        msg: M,
        timeout: Duration,
    ) -> Result<R, AsysError> {
        request_reply(&self.system.registry, target, AnyMessage::new(msg), timeout).await
    }

    /// Resends `msg` (the value the actor's own `recv` was just given) to
    /// `target`, preserving the original sender. Spec §4.3 describes this
    /// as resending "the current message"; since `recv` already took
    /// ownership of the typed value by the time user code can call this,
    /// the actor simply passes it back in rather than the context
    /// re-deriving it from an implicit slot.
    pub fn forward<M: Message>(&self, target: &Address, msg: M) {
        let sender = self.current_sender();
        self.send_out(target, AnyMessage::new(msg), sender);
    }

    pub fn respond<M: Message>(&self, msg: M) {
        match self.current_sender() {
            Some(sender) => {
                let me = self.address.clone();
                self.send_out(&sender, AnyMessage::new(msg), Some(me));
            }
            None => slog::warn!(self.system.log, "respond() called with no sender"; "actor" => %self.address),
        }
    }

    /// Pushes `msg` onto this context's stash, to be redelivered in push
    /// order immediately after the next restart completes (spec §4.3,
    /// §8 property 4).
    pub fn stash<M: Message>(&self, msg: M) {
        let sender = self.current_sender();
        self.stash.lock().unwrap().push((AnyMessage::new(msg), sender));
    }

    pub fn watch(&self, target: &Address) {
        match self.system.registry.get(target) {
            Some(process) => process.send_system(SystemMsg::Watch(self.address.clone())),
            None => self.enqueue_system(SystemMsg::Terminated(Terminated {
                who: target.clone(),
                reason: TerminatedReason::NotFound,
            })),
        }
    }

    pub fn unwatch(&self, target: &Address) {
        if let Some(process) = self.system.registry.get(target) {
            process.send_system(SystemMsg::Unwatch(self.address.clone()));
        }
    }

    pub fn stop(&self, target: &Address) {
        if let Some(Process::Local(ctx)) = self.system.registry.get(target) {
            tokio::spawn(async move { ctx.do_stop().await });
        }
    }

    pub async fn stop_async(&self, target: &Address) {
        if let Some(Process::Local(ctx)) = self.system.registry.get(target) {
            ctx.do_stop().await;
        }
    }

    pub fn poison(&self, target: &Address) {
        deliver_user(&self.system.registry, target, AnyMessage::new(PoisonPill), None);
    }

    pub async fn poison_async(&self, target: &Address) {
        self.poison(target);
        self.stop_async(target).await;
    }

    /// Arms a timer that delivers `ReceiveTimeout` after `duration` of
    /// idleness. A second call with the same duration is a no-op (spec
    /// §9.1(a)); a different duration re-arms from now.
    pub fn set_receive_timeout(&self, duration: Duration) {
        assert!(duration > Duration::from_millis(0), "receive timeout must be strictly positive");
        let unchanged = matches!(
            self.receive_timeout.lock().unwrap().as_ref(),
            Some(h) if h.duration == duration
        );
        if unchanged {
            return;
        }
        self.arm_receive_timeout(duration);
    }

    /// Runs `task` in the background and, on completion, schedules
    /// `continuation` to run during a later turn with `&self` as if it
    /// were the current message, the only sanctioned way to interleave
    /// an external wait without another message dispatching concurrently
    /// (spec §5 "Suspension points").
    pub fn reenter_after<F, C>(&self, task: F, continuation: C)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
        C: FnOnce(&ActorContext) + Send + 'static,
    {
        let id = self.reenter_counter.fetch_add(1, Ordering::Relaxed);
        self.reenter_pending.insert(id, Box::new(continuation));
        let address = self.address.clone();
        let registry = self.system.registry.clone();
        tokio::spawn(async move {
            task.await;
            if let Some(process) = registry.get(&address) {
                process.send_system(SystemMsg::Continuation(Continuation { id }));
            }
        });
    }
}
