use std::any::Any;
use std::sync::RwLock;

use slog::Logger;

/// In-process publish/subscribe bus (spec §4.7). Dispatch is synchronous,
/// subscribers are invoked in registration order, and a panicking
/// subscriber is caught and logged rather than propagated, mirroring the
/// teacher's `Channel<Msg>` (`src/actor/channel.rs`), generalized here to
/// a single process-wide bus instead of a per-topic actor.
pub struct EventStream {
    subscribers: RwLock<Vec<Subscriber>>,
    log: Logger,
}

type Subscriber = Box<dyn Fn(&dyn Any) + Send + Sync>;

impl EventStream {
    pub fn new(log: Logger) -> Self {
        EventStream {
            subscribers: RwLock::new(Vec::new()),
            log,
        }
    }

    /// Subscribe a closure invoked for every published event, regardless
    /// of its concrete type; callers typically downcast to the type they
    /// care about and ignore the rest.
    pub fn subscribe<F>(&self, f: F)
    where
        F: Fn(&dyn Any) + Send + Sync + 'static,
    {
        self.subscribers.write().unwrap().push(Box::new(f));
    }

    pub fn publish<E: Any>(&self, event: E) {
        self.dispatch(&event as &dyn Any, std::any::type_name::<E>());
    }

    /// Same as `publish`, for callers (the event-stream `Process`
    /// facade) that only hold a type-erased box.
    pub fn publish_boxed(&self, event: Box<dyn Any + Send>) {
        self.dispatch(&*event as &dyn Any, "boxed");
    }

    fn dispatch(&self, event: &dyn Any, type_name: &str) {
        let subs = self.subscribers.read().unwrap();
        for sub in subs.iter() {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sub(event)));
            if result.is_err() {
                slog::error!(self.log, "event stream subscriber panicked"; "event_type" => type_name);
            }
        }
    }
}
