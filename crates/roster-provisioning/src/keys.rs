//! Resource key derivation.
//!
//! A [`KeyTransform`] computes a base key from an identity. The
//! [`KeyDeriver`] walks identities in input order and resolves collisions by
//! appending the next unused numeric suffix (`2`, `3`, ...), so the same
//! input always produces the same keys.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use roster_core::{ResourceKey, MAX_RESOURCE_KEY_LENGTH};

use crate::error::RecordError;
use crate::validation::Identity;

/// Computes the base (unsuffixed) key of an identity.
///
/// Implementations must be pure. An empty result rejects the identity with
/// [`RecordError::EmptyDerivedKey`].
pub trait KeyTransform: Send + Sync + fmt::Debug {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Base key for the identity.
    fn base_key(&self, identity: &Identity) -> String;
}

fn ascii_alnum_lower(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// `Michael Scott` → `mscott`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstInitialLastName;

impl KeyTransform for FirstInitialLastName {
    fn name(&self) -> &str {
        "first_initial_last_name"
    }

    fn base_key(&self, identity: &Identity) -> String {
        let first = ascii_alnum_lower(&identity.first_name);
        let last = ascii_alnum_lower(&identity.last_name);
        let mut key: String = first.chars().take(1).collect();
        key.push_str(&last);
        key
    }
}

/// `Michael Scott` → `michael.scott`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstDotLast;

impl KeyTransform for FirstDotLast {
    fn name(&self) -> &str {
        "first_dot_last"
    }

    fn base_key(&self, identity: &Identity) -> String {
        [
            ascii_alnum_lower(&identity.first_name),
            ascii_alnum_lower(&identity.last_name),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(".")
    }
}

/// An identity together with its run-unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedIdentity {
    pub key: ResourceKey,
    pub identity: Identity,
}

/// Outcome of deriving keys for a batch.
#[derive(Debug, Clone, Default)]
pub struct KeyDerivation {
    /// Keyed identities, in input order.
    pub keyed: Vec<KeyedIdentity>,
    /// Identities rejected because no usable key could be derived.
    pub errors: Vec<RecordError>,
}

/// Assigns unique keys to identities using a [`KeyTransform`].
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    transform: Arc<dyn KeyTransform>,
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(Arc::new(FirstInitialLastName))
    }
}

impl KeyDeriver {
    #[must_use]
    pub fn new(transform: Arc<dyn KeyTransform>) -> Self {
        Self { transform }
    }

    #[must_use]
    pub fn transform(&self) -> &dyn KeyTransform {
        self.transform.as_ref()
    }

    /// Derive keys for every identity, in order.
    ///
    /// Keys are compared case-insensitively when checking for collisions,
    /// since IAM user names are unique regardless of case.
    pub fn derive<I>(&self, identities: I) -> KeyDerivation
    where
        I: IntoIterator<Item = Identity>,
    {
        let mut result = KeyDerivation::default();
        let mut assigned: HashSet<String> = HashSet::new();

        for identity in identities {
            let base = self.transform.base_key(&identity);
            if base.is_empty() {
                result.errors.push(RecordError::EmptyDerivedKey {
                    line: identity.line,
                    first_name: identity.first_name.clone(),
                    last_name: identity.last_name.clone(),
                });
                continue;
            }

            let candidate = first_free_candidate(&base, &assigned);
            match ResourceKey::parse(candidate.clone()) {
                Ok(key) => {
                    if candidate != truncate_chars(&base, MAX_RESOURCE_KEY_LENGTH) {
                        tracing::debug!(
                            line = identity.line,
                            base = %base,
                            key = %key,
                            "Resolved key collision"
                        );
                    }
                    assigned.insert(candidate.to_lowercase());
                    result.keyed.push(KeyedIdentity { key, identity });
                }
                Err(e) => {
                    let message = match e {
                        roster_core::RosterError::InvalidIdentifier { message, .. } => message,
                        other => other.to_string(),
                    };
                    result.errors.push(RecordError::InvalidDerivedKey {
                        line: identity.line,
                        candidate,
                        message,
                    });
                }
            }
        }

        result
    }
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// First of `base`, `base2`, `base3`, ... not yet assigned, each capped at
/// the maximum key length by truncating the base.
fn first_free_candidate(base: &str, assigned: &HashSet<String>) -> String {
    let plain = truncate_chars(base, MAX_RESOURCE_KEY_LENGTH);
    if !assigned.contains(&plain.to_lowercase()) {
        return plain;
    }

    let mut suffix: u64 = 2;
    loop {
        let digits = suffix.to_string();
        let room = MAX_RESOURCE_KEY_LENGTH.saturating_sub(digits.len());
        let candidate = format!("{}{}", truncate_chars(base, room), digits);
        if !assigned.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        suffix += 1;
    }
}
