//! Signing key pair with rotation support.
//!
//! The dispatcher may start signing with the `next` key before this receiver
//! is redeployed, so both keys are tried: `current` first, then `next`.

use std::fmt;

use super::error::ConfigError;

/// Opaque symmetric signing key.
///
/// The key string is used as raw UTF-8 bytes, exactly as the dispatcher uses it.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(***)")
    }
}

/// The `current` and optional `next` signing keys.
#[derive(Debug, Clone)]
pub struct SigningKeyPair {
    current: SigningKey,
    next: Option<SigningKey>,
}

impl SigningKeyPair {
    pub fn new(current: SigningKey, next: Option<SigningKey>) -> Self {
        Self { current, next }
    }

    /// Build a pair from configuration strings.
    ///
    /// Blank values count as unset; a blank `current` key is an error.
    /// Non-blank keys are used byte for byte, surrounding whitespace included.
    pub fn from_strings(current: &str, next: Option<&str>) -> Result<Self, ConfigError> {
        if current.trim().is_empty() {
            return Err(ConfigError::MissingCurrentKey);
        }

        let next = next
            .filter(|k| !k.trim().is_empty())
            .map(SigningKey::new);

        Ok(Self::new(SigningKey::new(current), next))
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Keys to try, in order: `current`, then `next` if configured.
    pub fn candidates(&self) -> impl Iterator<Item = &SigningKey> {
        std::iter::once(&self.current).chain(self.next.as_ref())
    }
}
