use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;

use crate::address::Address;
use crate::error::AsysError;
use crate::message::{AnyMessage, Message};
use crate::registry::ProcessRegistry;

/// A Future is a Process: its id is a freshly generated token, its
/// address local (spec §4.6). `send_user` completes it with the first
/// message received; every later message lands in dead letters simply
/// because `FutureProcess` removes its own entry from the registry on
/// completion ("the future removes itself from the registry on
/// completion"). No special-casing is needed at the call site, a
/// second arrival just misses the lookup.
pub struct FutureProcess {
    pub address: Address,
    registry: Arc<ProcessRegistry>,
    tx: Mutex<Option<oneshot::Sender<Outcome>>>,
}

pub(crate) enum Outcome {
    Reply(AnyMessage),
    DeadLetter,
}

impl FutureProcess {
    pub(crate) fn new(
        address: Address,
        registry: Arc<ProcessRegistry>,
        tx: oneshot::Sender<Outcome>,
    ) -> Self {
        FutureProcess {
            address,
            registry,
            tx: Mutex::new(Some(tx)),
        }
    }

    pub fn send_user(&self, msg: AnyMessage) {
        if let Some(tx) = self.tx.lock().unwrap().take() {
            let _ = tx.send(Outcome::Reply(msg));
        }
        self.registry.remove(&self.address);
    }

    pub fn complete_dead_letter(&self) {
        if let Some(tx) = self.tx.lock().unwrap().take() {
            let _ = tx.send(Outcome::DeadLetter);
        }
        self.registry.remove(&self.address);
    }
}

/// Registers a fresh `FutureProcess`, sends `msg` to `target`, and
/// awaits either a typed reply, a dead-letter completion, or a timeout
/// (spec §4.3 `request_reply`).
pub async fn request_reply<R: Message>(
    registry: &Arc<ProcessRegistry>,
    target: &Address,
    msg: AnyMessage,
    duration: Duration,
) -> Result<R, AsysError> {
    let (tx, rx) = oneshot::channel();
    let future_address = registry.next_future_address();
    let future = Arc::new(FutureProcess::new(future_address.clone(), registry.clone(), tx));
    registry.insert_future(future_address.clone(), future);

    // The future itself is the sender so the target's reply routes back
    // here, not to whichever actor or root context issued the request.
    crate::registry::deliver_user(registry, target, msg, Some(future_address.clone()));

    let outcome = timeout(duration, rx).await;
    registry.remove(&future_address);

    match outcome {
        Err(_) => Err(AsysError::Timeout {
            target: target.clone(),
            after: duration,
        }),
        Ok(Err(_)) => Err(AsysError::Timeout {
            target: target.clone(),
            after: duration,
        }),
        Ok(Ok(Outcome::DeadLetter)) => Err(AsysError::dead_letter(target.clone())),
        Ok(Ok(Outcome::Reply(mut any))) => any.take::<R>().map_err(|_| AsysError::TypeMismatch {
            target: target.clone(),
        }),
    }
}
