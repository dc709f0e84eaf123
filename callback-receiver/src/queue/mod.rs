//! Queue module for RabbitMQ operations.
//!
//! Accepted callbacks are forwarded to a durable queue so downstream workers
//! can process them without repeating signature verification.
//!
//! ```text
//! Dispatcher → Web Server (verify) → verified_callbacks queue → Workers
//! ```

pub mod publisher;
pub mod types;

pub use publisher::Publisher;
pub use types::{VerifiedCallback, VERIFIED_QUEUE};
