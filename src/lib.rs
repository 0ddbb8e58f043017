#![deny(clippy::all)]
#![allow(clippy::large_enum_variant)]

mod dead_letter;
mod future;
mod guardian;
mod logger;
mod process;
mod registry;
mod validate;

pub mod actor;
pub mod address;
pub mod config;
pub mod context;
pub mod error;
pub mod event_stream;
pub mod mailbox;
pub mod message;
pub mod middleware;
pub mod protocol;
pub mod supervision;
pub mod system;

/// Everything most applications need, re-exported the way the teacher's
/// own `pub mod actors` prelude (`lib.rs`) does.
pub mod actors {
    pub use crate::actor::{Actor, Props};
    pub use crate::address::Address;
    pub use crate::config::SystemConfig;
    pub use crate::context::ActorContext;
    pub use crate::error::AsysError;
    pub use crate::event_stream::EventStream;
    pub use crate::mailbox::MailboxConfig;
    pub use crate::message::Message;
    pub use crate::middleware::Middleware;
    pub use crate::protocol::{
        DeadLetterEvent, DeadLetterResponse, Failure, PoisonPill, ReceiveTimeout, SystemMsg,
        Terminated, TerminatedReason,
    };
    pub use crate::supervision::{Directive, RestartStatistics, Strategy};
    pub use crate::system::{System, SystemHandle};
}
