//! Issuer, subject and time-window checks.

use std::str::FromStr;

use url::Url;

use super::error::RejectReason;
use super::token::Claims;

/// Issuer the dispatcher writes into every token.
pub const TRUSTED_ISSUER: &str = "Upstash";

/// How the `sub` claim is compared with the URL being served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubjectPolicy {
    /// Byte-for-byte string equality.
    #[default]
    Exact,
    /// Compare after URL normalization: scheme and host case, default
    /// ports and an empty path are folded. Both sides must parse.
    Normalized,
}

impl SubjectPolicy {
    pub fn matches(&self, subject: &str, expected_url: &str) -> bool {
        match self {
            SubjectPolicy::Exact => subject == expected_url,
            SubjectPolicy::Normalized => match (Url::parse(subject), Url::parse(expected_url)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl FromStr for SubjectPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(SubjectPolicy::Exact),
            "normalized" => Ok(SubjectPolicy::Normalized),
            other => Err(format!("unknown subject policy: {}", other)),
        }
    }
}

/// Validate issuer, subject, expiry and not-before, in that order.
///
/// `tolerance_seconds` widens the window symmetrically on both ends.
pub fn validate_claims(
    claims: &Claims,
    expected_url: &str,
    now: i64,
    tolerance_seconds: u64,
    policy: SubjectPolicy,
) -> Result<(), RejectReason> {
    if claims.iss != TRUSTED_ISSUER {
        return Err(RejectReason::IssuerMismatch);
    }

    if !policy.matches(&claims.sub, expected_url) {
        return Err(RejectReason::SubjectMismatch);
    }

    let tolerance = i64::try_from(tolerance_seconds).unwrap_or(i64::MAX);

    if now > claims.exp.saturating_add(tolerance) {
        return Err(RejectReason::SignatureExpired);
    }

    if now < claims.nbf.saturating_sub(tolerance) {
        return Err(RejectReason::SignatureNotYetValid);
    }

    Ok(())
}
