//! tessera-core
//!
//! Core traits and pure data-plane logic shared across the tessera workspace.
//!
//! - `adapter`: the `ProviderAdapter` trait every upstream source implements.
//! - `normalize`: canonical schema, field maps, numeric transforms, and the
//!   `Normalizer` that turns raw provider output into `NormalizedRecord`s.
//! - `merge`: first-non-null-wins composition of normalized records with
//!   per-field provenance.
//! - `completeness`: injectable rules deciding when a composite is good enough.
//! - `clock`: wall-clock abstraction used for cache expiry.
//!
//! Nothing in this crate performs I/O or holds shared mutable state; guards and
//! caches live in `tessera-middleware`, orchestration in `tessera`.
#![warn(missing_docs)]

/// The `ProviderAdapter` trait.
pub mod adapter;
/// Wall-clock abstraction.
pub mod clock;
/// Completeness rules.
pub mod completeness;
/// First-wins merge of normalized records.
pub mod merge;
pub mod normalize;

pub use adapter::ProviderAdapter;
pub use clock::{Clock, SystemClock};
pub use completeness::{
    AllCanonicalFields, CompletenessRule, Exhaustive, FnRule, RequiredFields, default_rule,
};
pub use merge::{CompositeBuilder, merge_by_priority};
pub use normalize::{
    FieldMap, FieldMaps, FieldRule, Normalizer, SCHEMA_VERSION, Transform, canonical_fields,
};
pub use tessera_types::*;
