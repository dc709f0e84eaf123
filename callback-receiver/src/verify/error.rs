//! Rejection taxonomy for signed callbacks.

use thiserror::Error;

/// Why a callback was rejected.
///
/// Every failure the engine can detect maps to exactly one variant. The
/// display strings are meant for internal logs; handlers should not echo them
/// back to the remote caller.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Wrong segment count, invalid base64url, invalid JSON or missing claims
    #[error("malformed signature token")]
    MalformedToken,

    /// Header names an algorithm other than HS256
    #[error("unsupported signing algorithm")]
    UnsupportedAlgorithm,

    /// No configured key produced a matching MAC
    #[error("signature does not match any configured key")]
    SignatureInvalid,

    /// Current time is past `exp` plus tolerance
    #[error("signature has expired")]
    SignatureExpired,

    /// Current time is before `nbf` minus tolerance
    #[error("signature is not yet valid")]
    SignatureNotYetValid,

    /// `iss` claim is not the trusted dispatcher
    #[error("issuer mismatch")]
    IssuerMismatch,

    /// `sub` claim does not name the URL being served
    #[error("subject does not match destination url")]
    SubjectMismatch,

    /// Body digest differs from the `body` claim
    #[error("body hash mismatch")]
    BodyHashMismatch,
}

impl RejectReason {
    /// Stable snake_case label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MalformedToken => "malformed_token",
            RejectReason::UnsupportedAlgorithm => "unsupported_algorithm",
            RejectReason::SignatureInvalid => "signature_invalid",
            RejectReason::SignatureExpired => "signature_expired",
            RejectReason::SignatureNotYetValid => "signature_not_yet_valid",
            RejectReason::IssuerMismatch => "issuer_mismatch",
            RejectReason::SubjectMismatch => "subject_mismatch",
            RejectReason::BodyHashMismatch => "body_hash_mismatch",
        }
    }
}

/// Error view of a rejected verification, for callers that prefer `?`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("callback signature rejected: {reason}")]
pub struct VerifyError {
    pub reason: RejectReason,
}

impl From<RejectReason> for VerifyError {
    fn from(reason: RejectReason) -> Self {
        Self { reason }
    }
}

/// Problems with the configured signing keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The current key was absent or blank
    #[error("current signing key is missing")]
    MissingCurrentKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_labels_are_snake_case() {
        assert_eq!(RejectReason::MalformedToken.as_str(), "malformed_token");
        assert_eq!(
            RejectReason::SignatureNotYetValid.as_str(),
            "signature_not_yet_valid"
        );
    }

    #[test]
    fn test_verify_error_display() {
        let err = VerifyError::from(RejectReason::SignatureExpired);
        assert_eq!(
            err.to_string(),
            "callback signature rejected: signature has expired"
        );
    }
}
