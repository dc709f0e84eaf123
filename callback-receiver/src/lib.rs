//! Callback receiver - verifies signed webhook callbacks from the dispatcher.
//!
//! The library provides:
//! - `verify`: the signature verification engine (`Receiver`)
//! - `web`: the axum handler that hosts it
//! - `queue`: forwarding of accepted callbacks to RabbitMQ
//!
//! ## Architecture
//!
//! ```text
//! Dispatcher → Web Server (verify) → verified_callbacks → Workers
//! ```

pub mod config;
pub mod queue;
pub mod util;
pub mod verify;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use queue::{Publisher, VerifiedCallback, VERIFIED_QUEUE};
pub use verify::{
    RejectReason, Receiver, SigningKey, SigningKeyPair, SubjectPolicy, TokenSigner,
    VerificationOutcome, VerifyError, VerifyRequest, SIGNATURE_HEADER,
};
pub use web::AppState;
