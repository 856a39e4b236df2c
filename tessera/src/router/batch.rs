use tessera_core::{Capability, CompositeRecord, EntityId, TesseraError};

use crate::Tessera;

impl Tessera {
    /// Fetch `capability` for several entities.
    ///
    /// Behavior and trade-offs:
    /// - Each entity runs its own fallback pass concurrently; passes share
    ///   guard state, so a burst may exhaust a provider's bucket and push later
    ///   entities to lower-priority providers.
    /// - Returns `(records, failures)` in input order. Duplicate entities are
    ///   fetched once per occurrence.
    pub async fn fetch_many(
        &self,
        capability: Capability,
        entities: &[EntityId],
    ) -> (Vec<CompositeRecord>, Vec<(EntityId, TesseraError)>) {
        if entities.is_empty() {
            return (vec![], vec![]);
        }

        let tasks = entities.iter().map(|entity| async move {
            let res = self.fetch(capability, entity).await;
            (entity, res)
        });
        let results = futures::future::join_all(tasks).await;

        let mut ok: Vec<CompositeRecord> = Vec::new();
        let mut failures: Vec<(EntityId, TesseraError)> = Vec::new();
        for (entity, res) in results {
            match res {
                Ok(r) => ok.push(r),
                Err(e) => failures.push((entity.clone(), e)),
            }
        }
        (ok, failures)
    }
}
