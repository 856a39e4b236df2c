use core::fmt;
use serde::{Deserialize, Serialize};

use crate::TesseraError;

/// Identifier of the entity a capability is fetched for (typically a ticker).
///
/// Identifiers are trimmed and upper-cased on construction so cache keys and
/// provider calls agree on one spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Validate and canonicalize an identifier.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the identifier is empty, longer than 32
    /// characters, or contains characters other than ASCII alphanumerics and
    /// `.`, `-`, `^`, `=`.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TesseraError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TesseraError::InvalidArg("entity id is empty".into()));
        }
        if trimmed.len() > 32 {
            return Err(TesseraError::InvalidArg(format!(
                "entity id too long: {trimmed}"
            )));
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')))
        {
            return Err(TesseraError::InvalidArg(format!(
                "entity id {trimmed:?} contains invalid character {bad:?}"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Borrow the canonical identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntityId {
    type Error = TesseraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntityId {
    type Error = TesseraError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(value: EntityId) -> Self {
        value.0
    }
}
