/// Generate a typed router method that fetches one capability through the
/// fallback orchestrator, and optionally a batch variant over many entities.
#[macro_export]
macro_rules! tessera_router_method {
    (
        $(#[$meta:meta])*
        method: $name:ident,
        capability: $capability:expr
        $(, many: $(#[$many_meta:meta])* $many:ident )?
    ) => {
        $(#[$meta])*
        #[cfg_attr(
            feature = "tracing",
            tracing::instrument(
                target = "tessera::router",
                skip(self),
                fields(entity = %entity),
            )
        )]
        ///
        /// # Errors
        /// Returns `Unsupported` if no adapter serves the capability, or
        /// `CapabilityUnavailable` if no provider populated a single field.
        pub async fn $name(
            &self,
            entity: &$crate::EntityId,
        ) -> Result<$crate::CompositeRecord, $crate::TesseraError> {
            self.fetch($capability, entity).await
        }

        $(
            $(#[$many_meta])*
            ///
            /// Runs one independent fetch per entity concurrently and returns
            /// `(records, failures)`; one entity failing never fails the batch.
            pub async fn $many(
                &self,
                entities: &[$crate::EntityId],
            ) -> (
                Vec<$crate::CompositeRecord>,
                Vec<($crate::EntityId, $crate::TesseraError)>,
            ) {
                self.fetch_many($capability, entities).await
            }
        )?
    };
}
