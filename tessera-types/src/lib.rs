//! Tessera data transfer objects, configuration primitives, and the unified error type.
#![warn(missing_docs)]

mod capability;
mod config;
mod connector;
mod entity;
/// Error types shared across the workspace.
pub mod error;
mod record;
mod reports;
mod value;

pub use capability::Capability;
pub use config::{BreakerConfig, RateLimitConfig, TesseraConfig, TtlPolicy};
pub use connector::{ProviderDescriptor, ProviderKey};
pub use entity::EntityId;
pub use error::TesseraError;
pub use record::{CompositeRecord, NormalizedRecord, RawFetchResult};
pub use reports::{
    AttemptOutcome, CacheOutcome, CircuitSnapshot, CircuitState, FetchReport, MissReason,
    ProviderAttempt, ProviderHealth, RateSnapshot, SkipReason,
};
pub use value::{FieldName, Observation, RawValue, Value};
