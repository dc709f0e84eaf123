//! Mints tokens in the dispatcher's format.
//!
//! Receivers never need this in production. It exists so a deployed receiver
//! can be exercised end to end, and so tests can build real tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;

use super::claims::TRUSTED_ISSUER;
use super::crypto::{compute_signature, encode_body_digest};
use super::keys::SigningKey;
use super::token::{encode_segment, Claims, Header, SUPPORTED_ALGORITHM};

/// Default token lifetime in seconds.
pub const DEFAULT_TTL_SECONDS: i64 = 300;

/// Signs callbacks with a single key.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    key: SigningKey,
    issuer: String,
    ttl_seconds: i64,
    not_before_offset: i64,
}

impl TokenSigner {
    pub fn new(key: SigningKey) -> Self {
        Self {
            key,
            issuer: TRUSTED_ISSUER.to_string(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            not_before_offset: 0,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// Shift `nbf` relative to the signing time (negative means earlier).
    pub fn with_not_before(mut self, offset_seconds: i64) -> Self {
        self.not_before_offset = offset_seconds;
        self
    }

    /// Claims for `body` delivered to `url`, issued at `now`.
    pub fn claims(&self, body: &[u8], url: &str, now: i64) -> Claims {
        let nonce: [u8; 16] = rand::thread_rng().gen();

        Claims {
            iss: self.issuer.clone(),
            sub: url.to_string(),
            exp: now.saturating_add(self.ttl_seconds),
            nbf: now.saturating_add(self.not_before_offset),
            iat: Some(now),
            jti: Some(format!("jwt_{}", URL_SAFE_NO_PAD.encode(nonce))),
            body: encode_body_digest(body),
        }
    }

    /// Produce a compact token for `body` delivered to `url`, issued at `now`.
    pub fn sign(&self, body: &[u8], url: &str, now: i64) -> serde_json::Result<String> {
        self.sign_claims(&self.claims(body, url, now))
    }

    /// Sign arbitrary claims.
    pub fn sign_claims(&self, claims: &Claims) -> serde_json::Result<String> {
        let header = Header {
            alg: SUPPORTED_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };

        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(claims)?);
        let signature = compute_signature(&self.key, signing_input.as_bytes());

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }
}
