//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables.

use std::env;

use anyhow::{Context, Result};
use tracing::warn;
use url::Url;

use crate::verify::{Receiver, SigningKeyPair, SubjectPolicy};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Current and next signing keys
    pub signing_keys: SigningKeyPair,

    /// Allowed clock skew between dispatcher and receiver, in seconds
    pub clock_tolerance_seconds: u64,

    /// Externally visible base URL; joined with the request path to form the
    /// URL a token must be bound to
    pub public_base_url: Url,

    /// How the `sub` claim is compared with the expected URL
    pub subject_policy: SubjectPolicy,

    /// Port for the web server to listen on
    pub port: u16,

    /// RabbitMQ connection URL; accepted callbacks are forwarded when set
    pub cloudamqp_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let signing_keys = SigningKeyPair::from_strings(
            &env::var("QSTASH_CURRENT_SIGNING_KEY").unwrap_or_default(),
            env::var("QSTASH_NEXT_SIGNING_KEY").ok().as_deref(),
        )
        .context("QSTASH_CURRENT_SIGNING_KEY must be set")?;

        let port = parse_or("PORT", 8080);

        let public_base_url = match env::var("PUBLIC_BASE_URL") {
            Ok(raw) => Url::parse(raw.trim()).context("PUBLIC_BASE_URL is not a valid URL")?,
            Err(_) => Url::parse(&format!("http://localhost:{}", port))
                .context("Failed to build default base URL")?,
        };

        let subject_policy = match env::var("SUBJECT_POLICY") {
            Ok(raw) => raw.parse::<SubjectPolicy>().unwrap_or_else(|e| {
                warn!(env_var = "SUBJECT_POLICY", error = %e, "Invalid subject policy, using exact");
                SubjectPolicy::Exact
            }),
            Err(_) => SubjectPolicy::Exact,
        };

        Ok(Config {
            signing_keys,
            clock_tolerance_seconds: parse_or("CLOCK_TOLERANCE_SECONDS", 0),
            public_base_url,
            subject_policy,
            port,
            cloudamqp_url: env::var("CLOUDAMQP_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }

    /// Build the verifier described by this configuration.
    pub fn receiver(&self) -> Receiver {
        Receiver::new(self.signing_keys.clone()).with_subject_policy(self.subject_policy)
    }

    /// The URL a callback for `path_and_query` is expected to be signed for.
    pub fn expected_url(&self, path_and_query: &str) -> String {
        let base = self.public_base_url.as_str().trim_end_matches('/');
        format!("{}{}", base, path_and_query)
    }
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
