//! Provider metadata types usable across crates.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::Capability;

/// Typed key for identifying providers in priority configuration and guard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderKey(pub &'static str);

impl ProviderKey {
    /// Construct a new typed provider key from a static name.
    ///
    /// This is useful when configuring per-capability priorities.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the inner static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl From<ProviderKey> for &'static str {
    fn from(k: ProviderKey) -> Self {
        k.0
    }
}

impl core::fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.0)
    }
}

/// Immutable description of a registered provider, resolved at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Provider name as reported by its adapter.
    pub name: String,
    /// Capabilities the adapter declares.
    pub capabilities: BTreeSet<Capability>,
    /// Zero-based rank among the providers supporting each capability
    /// (0 is tried first).
    pub priority: BTreeMap<Capability, usize>,
}

impl ProviderDescriptor {
    /// Rank for `capability`, or `None` when the provider does not support it.
    #[must_use]
    pub fn rank(&self, capability: Capability) -> Option<usize> {
        self.priority.get(&capability).copied()
    }
}
