//! Field normalization: provider field names and units onto the canonical schema.
//!
//! The pipeline is data-driven. A [`FieldMaps`] table, built once at startup,
//! holds one [`FieldMap`] per (provider, capability) pair; each map lists, for
//! every canonical field, the provider's source key and a [`Transform`]. The
//! [`Normalizer`] applies the table to a `RawFetchResult` and guarantees that no
//! non-finite number escapes.

mod field_map;
mod normalizer;
mod schema;
mod transform;

pub use field_map::{FieldMap, FieldMaps, FieldRule};
pub use normalizer::Normalizer;
pub use schema::{SCHEMA_VERSION, canonical_fields};
pub use transform::Transform;
