use std::any::Any;
use std::fmt::Debug;

use thiserror::Error;

use crate::address::Address;

/// Anything that can be sent as a user message. Blanket-implemented, the
/// same way the teacher's prelude treats any `Debug + Clone + Send +
/// 'static` value as a `Message`.
pub trait Message: Debug + Send + 'static {}
impl<T: Debug + Send + 'static> Message for T {}

/// A message together with its sender, the unit the mailbox actually
/// queues. The sender is `None` for fire-and-forget sends.
#[derive(Debug)]
pub struct Envelope {
    pub sender: Option<Address>,
    pub msg: AnyMessage,
}

/// Type-erased message carried across the [`Process`](crate::process::Process)
/// seam, since the registry and mailbox are not generic over a single
/// message type the way a single actor's `receive` is.
///
/// Grounded on the teacher's `AnyMessage { one_time, msg: Option<Box<dyn
/// Any + Send>> }` (`lib.rs`), generalized with a cached `Debug`
/// rendering so dead-letter logging never needs to downcast just to print.
pub struct AnyMessage {
    rendered: String,
    inner: Option<Box<dyn Any + Send>>,
}

impl AnyMessage {
    pub fn new<T: Message>(msg: T) -> Self {
        let rendered = format!("{:?}", msg);
        AnyMessage {
            rendered,
            inner: Some(Box::new(msg)),
        }
    }

    /// Take the concrete value out, failing if it was already taken or is
    /// not of type `T`.
    pub fn take<T: Message>(&mut self) -> Result<T, DowncastAnyMessageError> {
        match self.inner.take() {
            Some(b) => b.downcast::<T>().map(|b| *b).map_err(|b| {
                self.inner = Some(b);
                DowncastAnyMessageError
            }),
            None => Err(DowncastAnyMessageError),
        }
    }

    pub fn is_a<T: Message>(&self) -> bool {
        self.inner.as_ref().map(|b| b.is::<T>()).unwrap_or(false)
    }

    /// Hands back the raw boxed value, for call sites (the event stream
    /// process) that forward to a `Box<dyn Any + Send>`-based API
    /// instead of downcasting to a known type.
    pub fn into_any(mut self) -> Option<Box<dyn Any + Send>> {
        self.inner.take()
    }
}

impl Debug for AnyMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rendered)
    }
}

#[derive(Error, Debug, Clone, Copy)]
#[error("message could not be downcast to the expected type")]
pub struct DowncastAnyMessageError;
