use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::address::Address;
use crate::future::FutureProcess;
use crate::message::AnyMessage;
use crate::process::Process;

/// Maps id -> Process; allocates fresh ids; supports lookup/remove (spec
/// §4.1). Backed by `dashmap::DashMap`, which shards its internal table
/// across a fixed number of stripes so concurrent readers on different
/// ids don't contend, the same crate the teacher reaches for in
/// `kernel/provider.rs::ProviderInner` (there, only to track path
/// uniqueness; here, generalized into the real id -> Process lookup
/// table spec.md's distillation describes).
pub struct ProcessRegistry {
    system_address: String,
    processes: DashMap<String, Process>,
    next_id: AtomicU64,
}

impl ProcessRegistry {
    pub fn new(system_address: impl Into<String>) -> Self {
        ProcessRegistry {
            system_address: system_address.into(),
            processes: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn system_address(&self) -> &str {
        &self.system_address
    }

    /// Monotonic, process-local unique id, not globally unique beyond
    /// this registry (spec §4.1).
    pub fn next_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("tmp-{:x}", n)
    }

    pub fn next_future_address(&self) -> Address {
        Address::new(self.system_address.clone(), format!("temp/{}", self.next_id()))
    }

    pub fn try_add(&self, address: Address, process: Process) -> bool {
        use dashmap::mapref::entry::Entry;
        match self.processes.entry(address.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(process);
                true
            }
        }
    }

    pub(crate) fn insert_future(&self, address: Address, future: Arc<FutureProcess>) {
        self.processes.insert(address.id, Process::Future(future));
    }

    /// `get` is hot path: no allocation beyond `DashMap`'s internal
    /// shard lookup. Returns `None` when missing or when the address's
    /// system field is not local; callers fall back to dead-lettering,
    /// which is also where a remote implementation would instead hand
    /// off to a `RemoteProcess`.
    pub fn get(&self, address: &Address) -> Option<Process> {
        if address.system_address != self.system_address {
            return None;
        }
        self.processes.get(&address.id).map(|r| r.value().clone())
    }

    pub fn remove(&self, address: &Address) {
        self.processes.remove(&address.id);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.processes.contains_key(id)
    }
}

/// Deliver `msg` to `target`: looks it up in the registry and forwards,
/// or records it as a dead letter when the address is missing or
/// non-local. Every send path in the crate (`ActorContext::send`,
/// `request`, `forward`, `request_reply`) goes through this single
/// function so dead-letter routing never needs to be duplicated.
pub fn deliver_user(
    registry: &Arc<ProcessRegistry>,
    target: &Address,
    msg: AnyMessage,
    sender: Option<Address>,
) {
    match registry.get(target) {
        Some(process) => process.send_user(msg, sender),
        None => dead_letter_fallback(registry, target, msg, sender),
    }
}

fn dead_letter_fallback(
    registry: &Arc<ProcessRegistry>,
    target: &Address,
    msg: AnyMessage,
    sender: Option<Address>,
) {
    let dl_address = Address::new(registry.system_address().to_string(), "system/deadLetters");
    if let Some(Process::DeadLetter(dl)) = registry.get(&dl_address) {
        dl.record(target.clone(), msg, sender);
    }
}
