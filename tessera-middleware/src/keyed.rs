//! Per-(provider, capability) state with fine-grained locking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tessera_core::Capability;

/// Key for guard state.
pub(crate) type GuardKey = (String, Capability);

/// Lock a mutex, recovering from poison.
///
/// A panic while holding a guard leaves at worst a stale counter.
pub(crate) fn lock<'a, T>(m: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    m.lock().unwrap_or_else(|poisoned| {
        #[cfg(feature = "tracing")]
        tracing::warn!(guard = what, "guard mutex was poisoned, recovering");
        #[cfg(not(feature = "tracing"))]
        let _ = what;
        poisoned.into_inner()
    })
}

/// Lazily created state per key.
///
/// The outer map is only write-locked to insert a new key; every state
/// mutation happens under that key's own mutex, so callers contend only when
/// they hit the same (provider, capability).
pub(crate) struct KeyedState<S> {
    map: RwLock<HashMap<GuardKey, Arc<Mutex<S>>>>,
    what: &'static str,
}

impl<S> KeyedState<S> {
    pub(crate) fn new(what: &'static str) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            what,
        }
    }

    /// State for `key`, created with `init` on first use.
    pub(crate) fn entry(
        &self,
        provider: &str,
        capability: Capability,
        init: impl FnOnce() -> S,
    ) -> Arc<Mutex<S>> {
        let key = (provider.to_string(), capability);
        {
            let map = self.map.read().unwrap_or_else(|p| p.into_inner());
            if let Some(s) = map.get(&key) {
                return Arc::clone(s);
            }
        }
        let mut map = self.map.write().unwrap_or_else(|p| p.into_inner());
        Arc::clone(
            map.entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(init()))),
        )
    }

    /// Existing state for `key`, if any.
    pub(crate) fn get(&self, provider: &str, capability: Capability) -> Option<Arc<Mutex<S>>> {
        let map = self.map.read().unwrap_or_else(|p| p.into_inner());
        map.get(&(provider.to_string(), capability)).cloned()
    }

    /// Drop the state for `key`; the next use starts fresh.
    pub(crate) fn remove(&self, provider: &str, capability: Capability) {
        let mut map = self.map.write().unwrap_or_else(|p| p.into_inner());
        map.remove(&(provider.to_string(), capability));
    }

    /// Copy of every key with its state handle.
    pub(crate) fn entries(&self) -> Vec<(GuardKey, Arc<Mutex<S>>)> {
        let map = self.map.read().unwrap_or_else(|p| p.into_inner());
        map.iter().map(|(k, v)| (k.clone(), Arc::clone(v))).collect()
    }

    pub(crate) fn lock<'a>(&self, state: &'a Mutex<S>) -> MutexGuard<'a, S> {
        lock(state, self.what)
    }
}
