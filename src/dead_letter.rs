use std::sync::{Mutex, Weak};
use std::time::{Duration, Instant, SystemTime};

use crate::address::Address;
use crate::event_stream::EventStream;
use crate::message::AnyMessage;
use crate::protocol::DeadLetterEvent;
use crate::registry::ProcessRegistry;

/// Sink for messages to stopped/unknown addresses (spec §4.7). Publishes
/// a throttled `DeadLetterEvent` to the [`EventStream`] for every
/// message it records, and, when the original send carried a sender
/// that is itself a [`Future`](crate::future::FutureProcess), completes
/// that future immediately so `request_reply` fails fast instead of
/// waiting out its timeout (spec §8 property 7).
///
/// Grounded on the teacher's `DeadLetterLogger` (`src/system/logger.rs`,
/// an actor subscribed to the dead-letter channel) and
/// `Channel<DeadLetter>`/`Publish` (`src/actor/channel.rs`); generalized
/// into a registry-resident `Process` instead of a subscriber actor,
/// since this spec has no persistence/event-sourcing layer to route
/// through an actor mailbox for.
pub struct DeadLetterProcess {
    pub address: Address,
    events: std::sync::Arc<EventStream>,
    registry: Weak<ProcessRegistry>,
    throttle: Mutex<Throttle>,
}

struct Throttle {
    count: u32,
    window_start: Instant,
    max_per_interval: u32,
    interval: Duration,
}

impl DeadLetterProcess {
    pub fn new(
        address: Address,
        events: std::sync::Arc<EventStream>,
        registry: Weak<ProcessRegistry>,
        max_per_interval: u32,
        interval: Duration,
    ) -> Self {
        DeadLetterProcess {
            address,
            events,
            registry,
            throttle: Mutex::new(Throttle {
                count: 0,
                window_start: Instant::now(),
                max_per_interval,
                interval,
            }),
        }
    }

    pub fn record(&self, target: Address, msg: AnyMessage, sender: Option<Address>) {
        let message = format!("{:?}", msg);

        if self.allow() {
            self.events.publish(DeadLetterEvent {
                address: target,
                message,
                sender: sender.clone(),
                at: SystemTime::now(),
            });
        }

        if let (Some(sender), Some(registry)) = (sender, self.registry.upgrade()) {
            if let Some(crate::process::Process::Future(future)) = registry.get(&sender) {
                future.complete_dead_letter();
            }
        }
    }

    fn allow(&self) -> bool {
        let mut t = self.throttle.lock().unwrap();
        if t.window_start.elapsed() > t.interval {
            t.window_start = Instant::now();
            t.count = 0;
        }
        if t.count >= t.max_per_interval {
            false
        } else {
            t.count += 1;
            true
        }
    }
}
