//! Signature verification for dispatcher callbacks.
//!
//! The dispatcher signs every callback with a compact HS256 token carried in
//! the `Upstash-Signature` header. The token binds the destination URL, a
//! validity window and a SHA-256 digest of the body.
//!
//! ```text
//! token → decode → alg check → MAC (current, next) → claims → body digest
//! ```

pub mod body;
pub mod claims;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod keys;
pub mod signer;
pub mod token;

pub use claims::{SubjectPolicy, TRUSTED_ISSUER};
pub use engine::{Receiver, VerificationOutcome, VerifyRequest};
pub use error::{ConfigError, RejectReason, VerifyError};
pub use keys::{SigningKey, SigningKeyPair};
pub use signer::TokenSigner;
pub use token::{Claims, CompactToken, Header};

/// Request header carrying the signature token.
pub const SIGNATURE_HEADER: &str = "Upstash-Signature";
