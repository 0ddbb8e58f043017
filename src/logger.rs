use std::any::Any;

use slog::{o, Drain, Logger};

use crate::event_stream::EventStream;
use crate::protocol::DeadLetterEvent;

/// Builds the system's default `slog::Logger`: an async-wrapped,
/// terminal-formatted drain. The teacher declares both `slog-term` and
/// `slog-async` (`Cargo.toml`) for exactly this purpose; this is the
/// standard wiring those two crates exist to provide.
pub fn default_log() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!())
}

/// Subscribes a dead-letter logger onto the event stream (spec §4.9:
/// "DeadLetterLogger... logs at slog::info with throttling state shared
/// with the DeadLetter process"). Grounded on the teacher's
/// `DeadLetterLogger` actor (`system/logger.rs`), collapsed into a
/// direct subscriber closure here since the throttling itself already
/// lives in `DeadLetterProcess`, there is nothing left for a dedicated
/// actor mailbox to add.
pub fn install_dead_letter_logger(events: &EventStream, log: Logger) {
    events.subscribe(move |event: &dyn Any| {
        if let Some(dl) = event.downcast_ref::<DeadLetterEvent>() {
            slog::info!(log, "dead letter";
                "address" => %dl.address,
                "sender" => ?dl.sender,
                "message" => &dl.message,
            );
        }
    });
}
