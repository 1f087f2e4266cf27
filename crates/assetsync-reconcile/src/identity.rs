//! Composite key derivation.
//!
//! A record's identity is the SHA-256 of the trimmed values of the provider's
//! key fields joined by `|`. The key is irreversible, so the remote system
//! never sees the values it was derived from.

use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter};

use crate::local::LocalRecord;

/// Separator between key field values before hashing.
const FIELD_SEPARATOR: &str = "|";

/// Anonymized record identity.
///
/// Keys derived locally are lowercase hex. Keys recovered from a remote tag
/// are kept verbatim, so a hand-edited tag simply never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Wrap an already computed key, e.g. a tag payload.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CompositeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the composite key of `record` over `key_fields`, in order.
///
/// Fields that are missing or have no value count as empty strings.
#[must_use]
pub fn derive_key(record: &LocalRecord, key_fields: &[String]) -> CompositeKey {
    let joined = key_fields
        .iter()
        .map(|field| record.get(field).unwrap_or_default().trim())
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR);

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    CompositeKey(hex::encode(hasher.finalize()))
}
