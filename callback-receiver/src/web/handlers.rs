//! Webhook endpoint handlers.
//!
//! The callback handler only:
//! 1. Verifies the signature token
//! 2. Forwards the raw payload to RabbitMQ (if configured)
//! 3. Returns immediately
//!
//! Rejection reasons are logged but never sent back to the caller.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{OriginalUri, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::queue::{Publisher, VerifiedCallback};
use crate::util::unix_now;
use crate::verify::{Receiver, VerificationOutcome, SIGNATURE_HEADER};
use crate::Config;

/// Header carrying the dispatcher's message id.
const MESSAGE_ID_HEADER: &str = "Upstash-Message-Id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub receiver: Receiver,
    pub publisher: Option<Publisher>,
}

impl AppState {
    pub fn new(config: Config, publisher: Option<Publisher>) -> Self {
        let receiver = config.receiver();
        Self {
            config: Arc::new(config),
            receiver,
            publisher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Dispatcher Callback
// =============================================================================

/// Webhook response.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

fn respond(code: StatusCode, status: &'static str) -> (StatusCode, Json<WebhookResponse>) {
    (code, Json(WebhookResponse { status }))
}

/// Dispatcher callback endpoint.
///
/// The body is taken as raw bytes so the digest is computed over exactly what
/// was sent. The expected URL is the configured public base URL plus the
/// request path and query, never anything derived from request headers.
pub async fn callback_webhook(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let expected_url = state.config.expected_url(path_and_query);

    info!(
        path = %uri.path(),
        body_length = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
        "callback_received"
    );

    let signature = match headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(s) if !s.trim().is_empty() => s,
        _ => {
            warn!(path = %uri.path(), "callback_signature_missing");
            return respond(StatusCode::UNAUTHORIZED, "missing_signature");
        }
    };

    let outcome = state.receiver.verify(
        signature,
        &body,
        &expected_url,
        state.config.clock_tolerance_seconds,
    );

    if let VerificationOutcome::Rejected(reason) = outcome {
        warn!(
            path = %uri.path(),
            expected_url = %expected_url,
            reason = reason.as_str(),
            "callback_rejected"
        );
        return respond(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    if let Some(publisher) = &state.publisher {
        let callback = forwarded_callback(path_and_query, &headers, &body, unix_now());

        if let Err(e) = publisher.publish_verified(&callback).await {
            error!(error = %e, "callback_publish_failed");
            return respond(StatusCode::INTERNAL_SERVER_ERROR, "error");
        }
    }

    info!(path = %uri.path(), "callback_accepted");

    respond(StatusCode::OK, "accepted")
}

/// Queue message for an accepted callback. Keeps the query string, since it
/// is part of the URL the token was bound to.
fn forwarded_callback(
    path_and_query: &str,
    headers: &HeaderMap,
    body: &[u8],
    received_at: i64,
) -> VerifiedCallback {
    let message_id = headers
        .get(MESSAGE_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    VerifiedCallback::new(path_and_query.to_string(), body, message_id, received_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{SigningKey, SigningKeyPair, SubjectPolicy, TokenSigner};
    use crate::web::router;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;
    use url::Url;

    const BODY: &str = r#"{"hello":"world"}"#;

    fn state() -> AppState {
        state_with(None)
    }

    fn state_with(publisher: Option<Publisher>) -> AppState {
        let config = Config {
            signing_keys: SigningKeyPair::new(
                SigningKey::new("sig_current"),
                Some(SigningKey::new("sig_next")),
            ),
            clock_tolerance_seconds: 5,
            public_base_url: Url::parse("https://receiver.example").unwrap(),
            subject_policy: SubjectPolicy::Exact,
            port: 8080,
            cloudamqp_url: None,
        };
        AppState::new(config, publisher)
    }

    fn token(key: &str, body: &str, url: &str) -> String {
        TokenSigner::new(SigningKey::new(key))
            .sign(body.as_bytes(), url, unix_now())
            .unwrap()
    }

    async fn post(uri: &str, signature: Option<&str>, body: &str) -> (StatusCode, String) {
        post_to(state(), uri, signature, body).await
    }

    async fn post_to(
        state: AppState,
        uri: &str,
        signature: Option<&str>,
        body: &str,
    ) -> (StatusCode, String) {
        let mut request = Request::builder().method("POST").uri(uri);
        if let Some(sig) = signature {
            request = request.header(SIGNATURE_HEADER, sig);
        }
        let response = router(state)
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_valid_callback_accepted() {
        let sig = token("sig_current", BODY, "https://receiver.example/callbacks/orders");
        let (status, body) = post("/callbacks/orders", Some(&sig), BODY).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"accepted"}"#);
    }

    #[tokio::test]
    async fn test_next_key_accepted() {
        let sig = token("sig_next", BODY, "https://receiver.example/callbacks/orders");
        let (status, _) = post("/callbacks/orders", Some(&sig), BODY).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_query_string_is_part_of_url() {
        let sig = token("sig_current", BODY, "https://receiver.example/callbacks/orders?id=7");
        let (status, _) = post("/callbacks/orders?id=7", Some(&sig), BODY).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = post("/callbacks/orders", Some(&sig), BODY).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_signature() {
        let (status, body) = post("/callbacks/orders", None, BODY).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"status":"missing_signature"}"#);
    }

    #[tokio::test]
    async fn test_rejection_reason_not_disclosed() {
        let sig = token("sig_current", BODY, "https://receiver.example/callbacks/orders");
        let (status, body) = post("/callbacks/orders", Some(&sig), r#"{"hello":"there"}"#).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"status":"unauthorized"}"#);
    }

    #[tokio::test]
    async fn test_wrong_path_rejected() {
        let sig = token("sig_current", BODY, "https://receiver.example/callbacks/orders");
        let (status, _) = post("/callbacks/refunds", Some(&sig), BODY).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_key_rejected() {
        let sig = token("someone_else", BODY, "https://receiver.example/callbacks/orders");
        let (status, _) = post("/callbacks/orders", Some(&sig), BODY).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forwarding_failure_returns_500() {
        let publisher = Publisher::new("amqp://127.0.0.1:1".to_string());
        let sig = token("sig_current", BODY, "https://receiver.example/callbacks/orders");

        let (status, body) =
            post_to(state_with(Some(publisher)), "/callbacks/orders", Some(&sig), BODY).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"status":"error"}"#);
    }

    #[tokio::test]
    async fn test_rejected_callback_never_forwarded() {
        // an unreachable broker would turn a forward attempt into a 500
        let publisher = Publisher::new("amqp://127.0.0.1:1".to_string());
        let (status, _) =
            post_to(state_with(Some(publisher)), "/callbacks/orders", Some("a.b.c"), BODY).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forwarded_callback_keeps_query_and_message_id() {
        let mut headers = HeaderMap::new();
        headers.insert(MESSAGE_ID_HEADER, "msg_42".parse().unwrap());

        let callback = forwarded_callback("/callbacks/orders?id=7", &headers, b"\xff\x00", 9);
        assert_eq!(callback.path, "/callbacks/orders?id=7");
        assert_eq!(callback.message_id.as_deref(), Some("msg_42"));
        assert_eq!(callback.body_bytes().unwrap(), b"\xff\x00".to_vec());
        assert_eq!(callback.received_at, 9);
    }

    #[test]
    fn test_forwarded_callback_without_message_id() {
        let callback = forwarded_callback("/callbacks/orders", &HeaderMap::new(), b"{}", 9);
        assert_eq!(callback.message_id, None);
    }
}
