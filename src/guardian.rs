use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::actor::{Actor, Props};
use crate::address::Address;
use crate::context::ActorContext;
use crate::error::AsysError;
use crate::supervision::Strategy;

/// A parent with nothing of its own to receive: root and every
/// strategy-bound guardian are one of these (spec §4.8: "Guardians are
/// cached context-less parents"). It never gets a real message: it
/// exists purely as a supervision point in the tree.
pub(crate) struct Guardian;

impl Guardian {
    fn produce() -> Guardian {
        Guardian
    }
}

#[async_trait]
impl Actor for Guardian {
    type Msg = ();

    async fn recv(&mut self, _ctx: &ActorContext, _msg: (), _sender: Option<Address>) {}
}

pub(crate) fn root_props() -> Props {
    Props::new(Guardian::produce)
}

/// Caches one guardian address per distinct supervisor strategy (spec
/// §4.8: "spawning an actor with a custom guardian strategy attaches it
/// under the matching guardian"). Guarded by an async mutex rather than
/// a lock-free map so two concurrent first-uses of the same strategy
/// can't race into spawning two guardians for it.
pub(crate) struct GuardianRegistry {
    guardians: Mutex<HashMap<String, Address>>,
}

impl GuardianRegistry {
    pub(crate) fn new() -> Self {
        GuardianRegistry {
            guardians: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the address of the guardian bound to `strategy`, spawning
    /// a fresh one under `root` the first time this exact strategy is
    /// requested. Strategies are keyed by their `Debug` rendering:
    /// `Strategy` carries only plain data (retry counts, durations), so
    /// two equivalently-configured strategies always render identically.
    pub(crate) async fn guardian_for(
        &self,
        root: &Arc<ActorContext>,
        strategy: Strategy,
    ) -> Result<Address, AsysError> {
        let key = format!("{:?}", strategy);
        let mut guardians = self.guardians.lock().await;
        if let Some(existing) = guardians.get(&key) {
            return Ok(existing.clone());
        }
        let props = Props::new(Guardian::produce).with_supervisor(strategy);
        let address = root.spawn_prefix(props, "guardian").await?;
        guardians.insert(key, address.clone());
        Ok(address)
    }
}
