//! HMAC and digest primitives.
//!
//! The dispatcher signs `header "." payload` with HMAC-SHA256 and embeds a
//! SHA-256 digest of the request body in the claims.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::keys::SigningKey;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 of `signing_input` under `key`.
pub fn compute_signature(key: &SigningKey, signing_input: &[u8]) -> [u8; 32] {
    let mut mac = keyed_mac(key);
    mac.update(signing_input);
    mac.finalize().into_bytes().into()
}

/// Check `signature` against the MAC of `signing_input` in constant time.
pub fn verify_signature(key: &SigningKey, signing_input: &[u8], signature: &[u8]) -> bool {
    let mut mac = keyed_mac(key);
    mac.update(signing_input);

    // verify_slice compares in constant time and rejects length mismatches
    mac.verify_slice(signature).is_ok()
}

/// SHA-256 of the raw, unmodified request body.
pub fn compute_body_digest(raw_body: &[u8]) -> [u8; 32] {
    Sha256::digest(raw_body).into()
}

/// Unpadded base64url form of the body digest, as carried in the `body` claim.
pub fn encode_body_digest(raw_body: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(compute_body_digest(raw_body))
}

fn keyed_mac(key: &SigningKey) -> HmacSha256 {
    // HMAC is defined for keys of any length, so this cannot fail.
    HmacSha256::new_from_slice(key.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"))
}
