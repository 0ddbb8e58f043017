use std::fmt;

/// Immutable logical handle identifying a [`Process`](crate::process::Process).
///
/// Equality is by both fields. `id` is hierarchical, `/`-separated
/// (`root/child/grandchild`). An `Address` is freely copyable and never
/// holds a reference to its target; resolving one to a live process always
/// goes back through the [`ProcessRegistry`](crate::registry::ProcessRegistry).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub system_address: String,
    pub id: String,
}

impl Address {
    pub fn new(system_address: impl Into<String>, id: impl Into<String>) -> Self {
        Address {
            system_address: system_address.into(),
            id: id.into(),
        }
    }

    /// Address of a would-be child `name` under this one.
    pub fn child(&self, name: &str) -> Address {
        Address::new(self.system_address.clone(), format!("{}/{}", self.id, name))
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.id.rfind('/').map(|i| &self.id[..i])
    }

    pub fn name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }

    pub fn is_local_to(&self, system_address: &str) -> bool {
        self.system_address == system_address
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.system_address, self.id)
    }
}
