use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::timeout;

use asys::actors::{
    Actor, ActorContext, Address, AsysError, Directive, Props, Strategy, System, Terminated,
    TerminatedReason,
};

// A generous but finite ceiling for anything that should resolve almost
// immediately once the dispatcher gets a turn; failing to observe an event
// within this is treated as the scenario having failed, not as flakiness.
const SOON: Duration = Duration::from_secs(2);

// ---- S1 Echo ---------------------------------------------------------------

#[derive(Debug)]
struct Ping(String);

#[derive(Debug)]
struct Pong(String);

struct EchoActor;

#[async_trait]
impl Actor for EchoActor {
    type Msg = Ping;

    async fn recv(&mut self, ctx: &ActorContext, msg: Ping, _sender: Option<Address>) {
        ctx.respond(Pong(msg.0));
    }
}

#[tokio::test]
async fn s1_echo() {
    let system = System::new().await.unwrap();
    let addr = system.actor_of(Props::new(|| EchoActor)).await.unwrap();

    let reply: Pong = system
        .request_reply(&addr, Ping("x".to_string()), Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(reply.0, "x");
}

// ---- S2 Supervised restart ---------------------------------------------

#[derive(Debug)]
struct Raise;

struct FailingChild;

#[async_trait]
impl Actor for FailingChild {
    type Msg = Raise;

    async fn recv(&mut self, _ctx: &ActorContext, _msg: Raise, _sender: Option<Address>) {
        panic!("scheduled failure");
    }
}

#[derive(Debug)]
struct GetChild;

struct Supervisor {
    child: Option<Address>,
    terminated_tx: mpsc::UnboundedSender<Terminated>,
}

#[async_trait]
impl Actor for Supervisor {
    type Msg = GetChild;

    async fn pre_start(&mut self, ctx: &ActorContext) {
        let child = ctx
            .spawn_named(Props::new(|| FailingChild), "failing-child")
            .await
            .unwrap();
        ctx.watch(&child);
        self.child = Some(child);
    }

    async fn recv(&mut self, ctx: &ActorContext, _msg: GetChild, _sender: Option<Address>) {
        ctx.respond(self.child.clone().unwrap());
    }

    async fn on_terminated(&mut self, _ctx: &ActorContext, terminated: Terminated) {
        let _ = self.terminated_tx.send(terminated);
    }
}

#[tokio::test]
async fn s2_supervised_restart() {
    let system = System::new().await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let supervisor = system
        .actor_of(
            Props::new(move || Supervisor {
                child: None,
                terminated_tx: tx.clone(),
            })
            .with_supervisor(Strategy::OneForOne {
                max_retries: 3,
                within: Duration::from_secs(1),
                directive: Directive::Restart,
            }),
        )
        .await
        .unwrap();

    let child: Address = system
        .request_reply(&supervisor, GetChild, Duration::from_secs(1))
        .await
        .unwrap();

    // The child panics on every message regardless of restart, so the four
    // failures land on its restart statistics in send order no matter how
    // the dispatcher happens to batch them: the 4th exceeds max_retries and
    // the supervisor escalates, which root's default AlwaysRestart strategy
    // resolves by restarting the supervisor, stopping the (still-failing)
    // child as part of that restart.
    for _ in 0..4 {
        system.send(&child, Raise).unwrap();
    }

    let terminated = timeout(SOON, rx.recv())
        .await
        .expect("supervisor did not observe child termination in time")
        .expect("channel closed without a Terminated");

    assert_eq!(terminated.who, child);
    assert_eq!(terminated.reason, TerminatedReason::Stopped);
}

// ---- S3 Stash + restart -------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Seen {
    Started,
    Msg(String),
}

#[derive(Debug, Clone)]
enum StasherMsg {
    Letter(String),
    ForceRestart,
}

struct Stasher {
    restarted: bool,
    seen_tx: mpsc::UnboundedSender<Seen>,
}

#[async_trait]
impl Actor for Stasher {
    type Msg = StasherMsg;

    async fn post_start(&mut self, _ctx: &ActorContext) {
        if self.restarted {
            let _ = self.seen_tx.send(Seen::Started);
        }
    }

    async fn recv(&mut self, ctx: &ActorContext, msg: StasherMsg, _sender: Option<Address>) {
        if !self.restarted {
            if let StasherMsg::Letter(_) = &msg {
                ctx.stash(msg);
                return;
            }
        }
        match msg {
            StasherMsg::Letter(s) => {
                let _ = self.seen_tx.send(Seen::Msg(s));
            }
            StasherMsg::ForceRestart => panic!("forced restart"),
        }
    }
}

#[tokio::test]
async fn s3_stash_and_restart() {
    let system = System::new().await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let generation = Arc::new(AtomicU32::new(0));

    // Root's default strategy (`AlwaysRestart`) is what restarts this
    // actor after it panics; Stasher has no children of its own, so its
    // Props carries no supervisor strategy.
    let addr = system
        .actor_of(Props::new(move || {
            let gen = generation.fetch_add(1, Ordering::SeqCst);
            Stasher {
                restarted: gen > 0,
                seen_tx: tx.clone(),
            }
        }))
        .await
        .unwrap();

    system.send(&addr, StasherMsg::Letter("A".into())).unwrap();
    system.send(&addr, StasherMsg::Letter("B".into())).unwrap();
    system.send(&addr, StasherMsg::Letter("C".into())).unwrap();
    system.send(&addr, StasherMsg::ForceRestart).unwrap();

    let mut observed = Vec::new();
    for _ in 0..4 {
        let next = timeout(SOON, rx.recv())
            .await
            .expect("did not observe replayed stash in time")
            .expect("channel closed early");
        observed.push(next);
    }

    assert_eq!(
        observed,
        vec![
            Seen::Started,
            Seen::Msg("A".into()),
            Seen::Msg("B".into()),
            Seen::Msg("C".into()),
        ]
    );
}

// ---- S4 Dead letter ----------------------------------------------------

#[tokio::test]
async fn s4_dead_letter() {
    let system = System::new().await.unwrap();
    let ghost = Address::new(system.name(), "sys/ghost");

    let started = std::time::Instant::now();
    let result: Result<Pong, AsysError> = system
        .request_reply(&ghost, Ping("hello".into()), Duration::from_millis(100))
        .await;
    let elapsed = started.elapsed();

    assert!(matches!(result, Err(AsysError::DeadLetter { .. })));
    assert!(
        elapsed <= Duration::from_millis(100),
        "dead letter should fail fast, took {:?}",
        elapsed
    );
}

// ---- S5 Poison ordering -------------------------------------------------

#[derive(Debug, Clone)]
struct Marker(&'static str);

struct Recorder {
    tx: mpsc::UnboundedSender<&'static str>,
}

#[async_trait]
impl Actor for Recorder {
    type Msg = Marker;

    async fn post_start(&mut self, _ctx: &ActorContext) {
        let _ = self.tx.send("Started");
    }

    async fn recv(&mut self, _ctx: &ActorContext, msg: Marker, _sender: Option<Address>) {
        let _ = self.tx.send(msg.0);
    }

    async fn pre_stop(&mut self, _ctx: &ActorContext) {
        let _ = self.tx.send("Stopping");
    }

    async fn post_stop(&mut self, _ctx: &ActorContext) {
        let _ = self.tx.send("Stopped");
    }
}

#[tokio::test]
async fn s5_poison_ordering() {
    let system = System::new().await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let addr = system
        .actor_of(Props::new(move || Recorder { tx: tx.clone() }))
        .await
        .unwrap();

    system.send(&addr, Marker("M1")).unwrap();
    system.send(&addr, Marker("M2")).unwrap();
    system.poison(&addr).unwrap();
    system.send(&addr, Marker("M3")).unwrap();

    let mut observed = Vec::new();
    for _ in 0..5 {
        match timeout(SOON, rx.recv()).await {
            Ok(Some(tag)) => observed.push(tag),
            _ => break,
        }
    }

    assert_eq!(observed, vec!["Started", "M1", "M2", "Stopping", "Stopped"]);
}

// ---- S6 Watch on already-stopped ----------------------------------------

struct Stoic;

#[async_trait]
impl Actor for Stoic {
    type Msg = ();

    async fn recv(&mut self, _ctx: &ActorContext, _msg: (), _sender: Option<Address>) {}
}

#[derive(Debug)]
struct WatchMe(Address);

struct Watcher {
    terminated_tx: mpsc::UnboundedSender<Terminated>,
}

#[async_trait]
impl Actor for Watcher {
    type Msg = WatchMe;

    async fn recv(&mut self, ctx: &ActorContext, msg: WatchMe, _sender: Option<Address>) {
        ctx.watch(&msg.0);
    }

    async fn on_terminated(&mut self, _ctx: &ActorContext, terminated: Terminated) {
        let _ = self.terminated_tx.send(terminated);
    }
}

#[tokio::test]
async fn s6_watch_on_already_stopped() {
    let system = System::new().await.unwrap();

    let a = system.actor_of(Props::new(|| Stoic)).await.unwrap();
    system.stop_async(&a).await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let b = system
        .actor_of(Props::new(move || Watcher {
            terminated_tx: tx.clone(),
        }))
        .await
        .unwrap();

    system.send(&b, WatchMe(a.clone())).unwrap();

    let terminated = timeout(SOON, rx.recv())
        .await
        .expect("watch did not resolve in time")
        .expect("channel closed without a Terminated");
    assert_eq!(terminated.who, a);
    assert_eq!(terminated.reason, TerminatedReason::Stopped);
}
