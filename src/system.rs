use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use slog::Logger;
use uuid::Uuid;

use crate::actor::Props;
use crate::address::Address;
use crate::config::SystemConfig;
use crate::context::ActorContext;
use crate::dead_letter::DeadLetterProcess;
use crate::error::AsysError;
use crate::event_stream::EventStream;
use crate::guardian::{root_props, GuardianRegistry};
use crate::logger::{default_log, install_dead_letter_logger};
use crate::message::Message;
use crate::process::{EventStreamProcess, Process};
use crate::registry::ProcessRegistry;
use crate::supervision::Strategy;
use crate::validate::validate_name;

/// Everything an `ActorContext` needs from its owning `System`, cloned
/// cheaply into every context at spawn time. A context never walks back
/// through a `System` object: it only ever sees the shared services
/// (registry, event stream, logger, config) bundled here, plus the
/// shutdown flag it consults before re-arming timers.
///
/// Grounded on the teacher's `ActorSystem` (`src/system.rs`), split from
/// the builder/lifecycle surface kept on `System` itself, since nothing
/// under `ActorContext` needs `shutdown()`/`uptime()`/guardian caching,
/// only the services every process shares.
#[derive(Clone)]
pub struct SystemHandle {
    pub(crate) registry: Arc<ProcessRegistry>,
    pub(crate) events: Arc<EventStream>,
    pub(crate) log: Logger,
    pub(crate) config: Arc<SystemConfig>,
    pub(crate) shutdown: Arc<AtomicBool>,
}

impl SystemHandle {
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

/// The composition root (spec §2 component 12, §6 "System control
/// surface"). Owns the registry, event stream, dead-letter sink, and the
/// root guardian; every other context only holds a cloned
/// [`SystemHandle`]. Grounded on the teacher's `ActorSystem::create`
/// (`src/system.rs`): config, then log, then the root/dead-letter
/// wiring, in that order.
#[derive(Clone)]
pub struct System {
    id: Uuid,
    name: String,
    handle: SystemHandle,
    root: Address,
    guardians: Arc<GuardianRegistry>,
    started_at: SystemTime,
    started_at_moment: Instant,
}

impl System {
    pub async fn new() -> Result<System, AsysError> {
        System::with_name("asys").await
    }

    pub async fn with_name(name: &str) -> Result<System, AsysError> {
        System::with_config(name, SystemConfig::load()).await
    }

    pub async fn with_config(name: &str, config: SystemConfig) -> Result<System, AsysError> {
        System::create(name, config, default_log(), root_props()).await
    }

    /// Builds a system whose root guardian runs with a non-default
    /// supervisor strategy, the only sanctioned way to change root's
    /// failure-escalation behavior (spec §9.1(b)).
    pub async fn with_root_strategy(
        name: &str,
        config: SystemConfig,
        strategy: Strategy,
    ) -> Result<System, AsysError> {
        System::create(name, config, default_log(), root_props().with_supervisor(strategy)).await
    }

    async fn create(
        name: &str,
        config: SystemConfig,
        log: Logger,
        root_props: Props,
    ) -> Result<System, AsysError> {
        validate_name(name).map_err(|reason| AsysError::InvalidSpawn { reason })?;

        let registry = Arc::new(ProcessRegistry::new(name.to_string()));
        let events = Arc::new(EventStream::new(log.clone()));

        let dl_address = Address::new(name.to_string(), "system/deadLetters");
        let dead_letters = Arc::new(DeadLetterProcess::new(
            dl_address.clone(),
            events.clone(),
            Arc::downgrade(&registry),
            config.dead_letter_throttle_max,
            config.dead_letter_throttle_interval,
        ));
        registry.try_add(dl_address, Process::DeadLetter(dead_letters));

        let es_address = Address::new(name.to_string(), "system/eventStream");
        registry.try_add(
            es_address.clone(),
            Process::EventStream(Arc::new(EventStreamProcess {
                address: es_address,
                stream: events.clone(),
            })),
        );

        install_dead_letter_logger(&events, log.clone());

        let handle = SystemHandle {
            registry,
            events,
            log: log.clone(),
            config: Arc::new(config),
            shutdown: Arc::new(AtomicBool::new(false)),
        };

        let root_address = Address::new(name.to_string(), "root");
        let root = ActorContext::create(root_address, None, handle.clone(), root_props);

        slog::info!(log, "actor system started"; "name" => name);

        Ok(System {
            id: Uuid::new_v4(),
            name: name.to_string(),
            handle,
            root,
            guardians: Arc::new(GuardianRegistry::new()),
            started_at: SystemTime::now(),
            started_at_moment: Instant::now(),
        })
    }

    fn root_ctx(&self) -> Result<Arc<ActorContext>, AsysError> {
        match self.handle.registry.get(&self.root) {
            Some(Process::Local(ctx)) => Ok(ctx),
            _ => Err(AsysError::Shutdown),
        }
    }

    /// Spawns `props` as a top-level actor: code outside any actor's
    /// `recv` reaches the tree only through root (spec §4.8: "Root is
    /// the parentless context used by code outside any actor"). A
    /// `Props` carrying a guardian strategy is attached under the cached
    /// guardian for that strategy instead of directly under root.
    pub async fn actor_of(&self, props: Props) -> Result<Address, AsysError> {
        let name = self.handle.registry.next_id();
        self.actor_of_named(props, &name).await
    }

    pub async fn actor_of_prefix(&self, props: Props, prefix: &str) -> Result<Address, AsysError> {
        let name = format!("{}-{}", prefix, self.handle.registry.next_id());
        self.actor_of_named(props, &name).await
    }

    pub async fn actor_of_named(&self, props: Props, name: &str) -> Result<Address, AsysError> {
        if self.handle.is_shutdown() {
            return Err(AsysError::Shutdown);
        }
        let root_ctx = self.root_ctx()?;
        if props.guardian_strategy {
            let strategy = props.supervisor_strategy.clone().unwrap_or_default();
            let guardian_addr = self.guardians.guardian_for(&root_ctx, strategy).await?;
            let guardian_ctx = match self.handle.registry.get(&guardian_addr) {
                Some(Process::Local(ctx)) => ctx,
                _ => return Err(AsysError::Shutdown),
            };
            let mut attached = props;
            attached.guardian_strategy = false;
            guardian_ctx.spawn_named(attached, name).await
        } else {
            root_ctx.spawn_named(props, name).await
        }
    }

    pub fn send<M: Message>(&self, target: &Address, msg: M) -> Result<(), AsysError> {
        self.root_ctx()?.send(target, msg);
        Ok(())
    }

    pub async fn request_reply<M: Message, R: Message>(
        &self,
        target: &Address,
        msg: M,
        timeout: Duration,
    ) -> Result<R, AsysError> {
        self.root_ctx()?.request_reply(target, msg, timeout).await
    }

    pub fn watch(&self, target: &Address) -> Result<(), AsysError> {
        self.root_ctx()?.watch(target);
        Ok(())
    }

    pub fn unwatch(&self, target: &Address) -> Result<(), AsysError> {
        self.root_ctx()?.unwatch(target);
        Ok(())
    }

    pub fn stop(&self, target: &Address) -> Result<(), AsysError> {
        self.root_ctx()?.stop(target);
        Ok(())
    }

    pub async fn stop_async(&self, target: &Address) -> Result<(), AsysError> {
        self.root_ctx()?.stop_async(target).await;
        Ok(())
    }

    pub fn poison(&self, target: &Address) -> Result<(), AsysError> {
        self.root_ctx()?.poison(target);
        Ok(())
    }

    pub async fn poison_async(&self, target: &Address) -> Result<(), AsysError> {
        self.root_ctx()?.poison_async(target).await;
        Ok(())
    }

    /// Cancels the system token and stops every top-level actor,
    /// recursing breadth-first down each subtree before returning (spec
    /// §6: "`shutdown()` cancels the system token and stops all
    /// top-level actors breadth-first; returns when the registry is
    /// empty"). System-level processes (dead letters, the event stream)
    /// are not part of that tree and are intentionally left registered.
    pub async fn shutdown(&self) {
        self.handle.shutdown.store(true, Ordering::Release);
        if let Ok(root_ctx) = self.root_ctx() {
            root_ctx.do_stop().await;
        }
        slog::info!(self.handle.log, "actor system shut down"; "name" => &self.name);
    }

    pub fn events(&self) -> &Arc<EventStream> {
        &self.handle.events
    }

    pub fn config(&self) -> &SystemConfig {
        &self.handle.config
    }

    pub fn log(&self) -> &Logger {
        &self.handle.log
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> SystemTime {
        self.started_at
    }

    pub fn uptime(&self) -> Duration {
        Instant::now().duration_since(self.started_at_moment)
    }
}
