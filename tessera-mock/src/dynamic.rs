use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use tessera_core::{
    Capability, EntityId, ProviderAdapter, RawFetchResult, RawValue, TesseraError,
};

/// Instruction for how a fetch should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return these raw fields immediately. An empty map simulates a
    /// provider that answers without data.
    Return(BTreeMap<String, RawValue>),
    /// Fail immediately with the provided error.
    Fail(TesseraError),
    /// Hang indefinitely (simulate a stalled connection).
    Hang,
    /// Sleep, then behave as the inner instruction.
    Delay(Duration, Box<MockBehavior>),
    /// Panic inside the adapter with this message.
    Panic(String),
}

impl MockBehavior {
    /// `Return` with numeric fields.
    #[must_use]
    pub fn numbers(fields: &[(&str, f64)]) -> Self {
        Self::Return(
            fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), RawValue::Number(*v)))
                .collect(),
        )
    }

    /// `Return` with no fields at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Return(BTreeMap::new())
    }

    /// Wrap `self` in a delay.
    #[must_use]
    pub fn delayed(self, by: Duration) -> Self {
        Self::Delay(by, Box::new(self))
    }
}

#[derive(Default)]
struct InternalState {
    // `None` entity is the per-capability default.
    rules: HashMap<(Capability, Option<EntityId>), MockBehavior>,
    calls: Vec<(Capability, EntityId)>,
}

impl InternalState {
    fn behavior_for(&self, capability: Capability, entity: &EntityId) -> Option<MockBehavior> {
        self.rules
            .get(&(capability, Some(entity.clone())))
            .or_else(|| self.rules.get(&(capability, None)))
            .cloned()
    }
}

/// Controller handle used by tests to drive a [`DynamicMockAdapter`] from the
/// outside.
#[derive(Clone)]
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockController {
    /// Set the behavior for every entity of `capability` without a more
    /// specific rule.
    pub async fn set_behavior(&self, capability: Capability, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert((capability, None), behavior);
    }

    /// Set the behavior for one entity of `capability`.
    pub async fn set_entity_behavior(
        &self,
        capability: Capability,
        entity: EntityId,
        behavior: MockBehavior,
    ) {
        let mut guard = self.state.lock().await;
        guard.rules.insert((capability, Some(entity)), behavior);
    }

    /// Every fetch received so far, in arrival order.
    pub async fn calls(&self) -> Vec<(Capability, EntityId)> {
        self.state.lock().await.calls.clone()
    }

    /// Number of fetches received for `capability`.
    pub async fn call_count(&self, capability: Capability) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|(c, _)| *c == capability)
            .count()
    }

    /// Forget recorded calls.
    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }
}

/// A scriptable adapter whose behavior is set per capability (and optionally
/// per entity) through its controller.
///
/// Capabilities without a rule fail with `NotFound`.
pub struct DynamicMockAdapter {
    name: &'static str,
    capabilities: BTreeSet<Capability>,
    state: Arc<Mutex<InternalState>>,
}

impl DynamicMockAdapter {
    /// Create an adapter and the controller that scripts it.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
        capabilities: &[Capability],
    ) -> (Arc<dyn ProviderAdapter>, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let adapter = Arc::new(Self {
            name,
            capabilities: capabilities.iter().copied().collect(),
            state: Arc::clone(&state),
        });
        (adapter, DynamicMockController { state })
    }

    async fn run(
        &self,
        behavior: MockBehavior,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<RawFetchResult, TesseraError> {
        let mut behavior = behavior;
        loop {
            match behavior {
                MockBehavior::Return(fields) => {
                    let mut raw = RawFetchResult::new(self.name, capability, entity.clone());
                    raw.fields = fields;
                    return Ok(raw);
                }
                MockBehavior::Fail(e) => return Err(e),
                MockBehavior::Hang => return std::future::pending().await,
                MockBehavior::Delay(by, inner) => {
                    tokio::time::sleep(by).await;
                    behavior = *inner;
                }
                MockBehavior::Panic(msg) => panic!("{msg}"),
            }
        }
    }
}

#[async_trait]
impl ProviderAdapter for DynamicMockAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        "DynamicMock"
    }

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    async fn fetch(
        &self,
        capability: Capability,
        entity: &EntityId,
    ) -> Result<RawFetchResult, TesseraError> {
        // Do not hold the lock across the scripted behavior.
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.calls.push((capability, entity.clone()));
            guard.behavior_for(capability, entity)
        };
        match behavior {
            Some(b) => self.run(b, capability, entity).await,
            None => Err(TesseraError::not_found(format!(
                "{capability} for {entity} (no rule set)"
            ))),
        }
    }
}
