//! Binds a token to the exact bytes of the request body.

use super::crypto::encode_body_digest;
use super::error::RejectReason;
use super::token::Claims;

/// Compare the `body` claim with the digest of `raw_body`.
///
/// The digest is not secret, so plain equality is fine here. Trailing `=`
/// on the claim is ignored since some dispatcher versions emit padded values.
pub fn validate_body(claims: &Claims, raw_body: &[u8]) -> Result<(), RejectReason> {
    let expected = encode_body_digest(raw_body);
    let claimed = claims.body.trim_end_matches('=');

    if claimed == expected {
        Ok(())
    } else {
        Err(RejectReason::BodyHashMismatch)
    }
}
