//! Queue message types.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

/// Queue name for callbacks that passed signature verification.
pub const VERIFIED_QUEUE: &str = "verified_callbacks";

/// A callback whose signature, destination and body binding were verified.
///
/// The body is carried as unpadded base64url of the exact bytes received, so
/// consumers see the same bytes the signature covered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedCallback {
    /// Request path and query the dispatcher delivered to
    pub path: String,
    /// Raw request body, unpadded base64url
    pub body: String,
    /// Dispatcher message id, from the `Upstash-Message-Id` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Unix seconds when the web server accepted the callback
    pub received_at: i64,
}

impl VerifiedCallback {
    pub fn new(path: String, body: &[u8], message_id: Option<String>, received_at: i64) -> Self {
        Self {
            path,
            body: URL_SAFE_NO_PAD.encode(body),
            message_id,
            received_at,
        }
    }

    /// The raw body bytes.
    pub fn body_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(&self.body)
    }

    /// Identifier used for the AMQP `message_id` property.
    pub fn tracking_id(&self) -> String {
        match &self.message_id {
            Some(id) => id.clone(),
            None => format!("{}-{}", self.path, self.received_at),
        }
    }
}
