//! The verification engine.
//!
//! `Receiver` decides whether an inbound callback was signed by the
//! dispatcher for exactly this body and this URL. Steps run in a fixed order
//! and stop at the first failure:
//!
//! 1. decode the token
//! 2. check the header algorithm
//! 3. check the MAC against `current`, then `next`
//! 4. validate issuer, subject and time window
//! 5. bind the body digest
//!
//! The signature is always checked before any claim, so a forged token can
//! never be used to probe which claims would have been accepted.

use std::sync::Arc;

use tracing::debug;

use crate::util::unix_now;

use super::body::validate_body;
use super::claims::{validate_claims, SubjectPolicy};
use super::crypto::verify_signature;
use super::error::{RejectReason, VerifyError};
use super::keys::SigningKeyPair;
use super::token::{decode, SUPPORTED_ALGORITHM};

/// Result of a single verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Accepted,
    Rejected(RejectReason),
}

impl VerificationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationOutcome::Accepted)
    }

    pub fn into_result(self) -> Result<(), VerifyError> {
        match self {
            VerificationOutcome::Accepted => Ok(()),
            VerificationOutcome::Rejected(reason) => Err(reason.into()),
        }
    }
}

impl From<Result<(), RejectReason>> for VerificationOutcome {
    fn from(result: Result<(), RejectReason>) -> Self {
        match result {
            Ok(()) => VerificationOutcome::Accepted,
            Err(reason) => VerificationOutcome::Rejected(reason),
        }
    }
}

/// Everything needed to verify one inbound request.
#[derive(Debug, Clone, Copy)]
pub struct VerifyRequest<'a> {
    /// Value of the signature header
    pub signature: &'a str,
    /// Raw request body, exactly as received
    pub body: &'a [u8],
    /// URL this handler is serving
    pub url: &'a str,
    /// Allowed clock skew in seconds
    pub clock_tolerance: u64,
}

/// Verifies signed callbacks. Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Receiver {
    keys: Arc<SigningKeyPair>,
    subject_policy: SubjectPolicy,
}

impl Receiver {
    pub fn new(keys: SigningKeyPair) -> Self {
        Self {
            keys: Arc::new(keys),
            subject_policy: SubjectPolicy::default(),
        }
    }

    pub fn with_subject_policy(mut self, policy: SubjectPolicy) -> Self {
        self.subject_policy = policy;
        self
    }

    pub fn subject_policy(&self) -> SubjectPolicy {
        self.subject_policy
    }

    /// Verify against the current wall-clock time.
    pub fn verify(
        &self,
        token: &str,
        raw_body: &[u8],
        expected_url: &str,
        clock_tolerance: u64,
    ) -> VerificationOutcome {
        self.verify_at(token, raw_body, expected_url, clock_tolerance, unix_now())
    }

    pub fn verify_request(&self, request: &VerifyRequest<'_>) -> VerificationOutcome {
        self.verify(
            request.signature,
            request.body,
            request.url,
            request.clock_tolerance,
        )
    }

    /// Verify as of `now` (seconds since the Unix epoch).
    pub fn verify_at(
        &self,
        token: &str,
        raw_body: &[u8],
        expected_url: &str,
        clock_tolerance: u64,
        now: i64,
    ) -> VerificationOutcome {
        let outcome = VerificationOutcome::from(self.check(
            token,
            raw_body,
            expected_url,
            clock_tolerance,
            now,
        ));

        if let VerificationOutcome::Rejected(reason) = outcome {
            debug!(reason = reason.as_str(), "callback_signature_rejected");
        }

        outcome
    }

    fn check(
        &self,
        token: &str,
        raw_body: &[u8],
        expected_url: &str,
        clock_tolerance: u64,
        now: i64,
    ) -> Result<(), RejectReason> {
        let token = decode(token)?;

        if token.header()?.alg != SUPPORTED_ALGORITHM {
            return Err(RejectReason::UnsupportedAlgorithm);
        }

        let signing_input = token.signing_input();
        let signed = self
            .keys
            .candidates()
            .any(|key| verify_signature(key, &signing_input, &token.signature));
        if !signed {
            return Err(RejectReason::SignatureInvalid);
        }

        let claims = token.claims()?;
        validate_claims(
            &claims,
            expected_url,
            now,
            clock_tolerance,
            self.subject_policy,
        )?;
        validate_body(&claims, raw_body)
    }
}
