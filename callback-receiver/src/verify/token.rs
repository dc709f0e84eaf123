//! Compact token codec: `header.payload.signature`, each unpadded base64url.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::RejectReason;

/// The only algorithm the dispatcher signs with.
pub const SUPPORTED_ALGORITHM: &str = "HS256";

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// Claims carried in the token payload.
///
/// `iss`, `sub`, `exp`, `nbf` and `body` are required and strictly typed.
/// `iat` and `jti` are informational: a value of an unexpected type reads as
/// `None` instead of failing the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub exp: i64,
    pub nbf: i64,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub jti: Option<String>,
    /// Base64url SHA-256 of the request body
    pub body: String,
}

/// A decoded token. Borrows the segment text from the input.
#[derive(Debug, Clone)]
pub struct CompactToken<'a> {
    header_segment: &'a str,
    payload_segment: &'a str,
    pub header: Map<String, Value>,
    pub payload: Map<String, Value>,
    pub signature: Vec<u8>,
}

impl<'a> CompactToken<'a> {
    /// Bytes the MAC is computed over: `header "." payload`.
    pub fn signing_input(&self) -> Vec<u8> {
        let mut input =
            Vec::with_capacity(self.header_segment.len() + 1 + self.payload_segment.len());
        input.extend_from_slice(self.header_segment.as_bytes());
        input.push(b'.');
        input.extend_from_slice(self.payload_segment.as_bytes());
        input
    }

    pub fn header(&self) -> Result<Header, RejectReason> {
        from_map(&self.header)
    }

    pub fn claims(&self) -> Result<Claims, RejectReason> {
        from_map(&self.payload)
    }
}

/// Split and decode a compact token.
pub fn decode(token: &str) -> Result<CompactToken<'_>, RejectReason> {
    let mut parts = token.trim().split('.');
    let (header_segment, payload_segment, signature_segment) =
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(RejectReason::MalformedToken),
        };

    if header_segment.is_empty() || payload_segment.is_empty() || signature_segment.is_empty() {
        return Err(RejectReason::MalformedToken);
    }

    let header = decode_object(header_segment)?;
    let payload = decode_object(payload_segment)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature_segment)
        .map_err(|_| RejectReason::MalformedToken)?;

    Ok(CompactToken {
        header_segment,
        payload_segment,
        header,
        payload,
        signature,
    })
}

/// Encode a value as an unpadded base64url JSON segment.
pub fn encode_segment<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(value)?))
}

fn decode_object(segment: &str) -> Result<Map<String, Value>, RejectReason> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| RejectReason::MalformedToken)?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(RejectReason::MalformedToken),
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn from_map<T: DeserializeOwned>(map: &Map<String, Value>) -> Result<T, RejectReason> {
    serde_json::from_value(Value::Object(map.clone())).map_err(|_| RejectReason::MalformedToken)
}
