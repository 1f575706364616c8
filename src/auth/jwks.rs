// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) sources.
//!
//! The verifier never talks to the network directly. It asks a
//! [`KeySetSource`] for the current key set: [`HttpJwksSource`] fetches the
//! tenant's `/.well-known/jwks.json`, [`StaticKeySet`] serves a fixed set.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::error::AuthError;

/// Default timeout for one JWKS request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// A JWKS document as published: `{"keys": [...]}`.
///
/// Entries are kept as raw JSON and interpreted one at a time by
/// [`KeySet::from_document`](super::KeySet::from_document), so an entry of a
/// key type this service cannot use is skipped rather than failing the fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwksDocument {
    pub keys: Vec<Value>,
}

/// Future returned by [`KeySetSource::fetch_key_set`].
pub type KeySetFuture<'a> =
    Pin<Box<dyn Future<Output = Result<JwksDocument, AuthError>> + Send + 'a>>;

/// Capability to obtain the identity provider's current key set.
pub trait KeySetSource: Send + Sync {
    /// Fetch the current key set.
    ///
    /// Failures are reported as [`AuthError::KeyResolution`].
    fn fetch_key_set(&self) -> KeySetFuture<'_>;
}

/// Fetches JWKS over HTTPS.
#[derive(Clone)]
pub struct HttpJwksSource {
    /// JWKS URL (tenant endpoint)
    jwks_url: Url,
    /// HTTP client with request timeout
    client: reqwest::Client,
}

impl HttpJwksSource {
    /// Create a new JWKS source.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g., `https://tenant.eu.auth0.com/.well-known/jwks.json`)
    /// - `timeout`: Upper bound for one fetch, including connect
    pub fn new(jwks_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { jwks_url, client })
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &Url {
        &self.jwks_url
    }

    async fn fetch(&self) -> Result<JwksDocument, AuthError> {
        tracing::debug!(url = %self.jwks_url, "Fetching JWKS");

        let response = self
            .client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| AuthError::key_resolution(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::key_resolution(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json::<JwksDocument>()
            .await
            .map_err(|e| AuthError::key_resolution(format!("invalid JWKS document: {e}")))
    }
}

impl KeySetSource for HttpJwksSource {
    fn fetch_key_set(&self) -> KeySetFuture<'_> {
        Box::pin(self.fetch())
    }
}

impl std::fmt::Debug for HttpJwksSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpJwksSource")
            .field("jwks_url", &self.jwks_url.as_str())
            .finish()
    }
}

/// A fixed key set, served without any I/O.
#[derive(Debug, Clone)]
pub struct StaticKeySet {
    jwks: JwksDocument,
}

impl StaticKeySet {
    pub fn new(jwks: JwksDocument) -> Self {
        Self { jwks }
    }
}

impl KeySetSource for StaticKeySet {
    fn fetch_key_set(&self) -> KeySetFuture<'_> {
        let jwks = self.jwks.clone();
        Box::pin(async move { Ok(jwks) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer) -> HttpJwksSource {
        let url = Url::parse(&format!("{}/.well-known/jwks.json", server.uri())).unwrap();
        HttpJwksSource::new(url, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn source_keeps_url() {
        let url = Url::parse("https://tenant.example.com/.well-known/jwks.json").unwrap();
        let source = HttpJwksSource::new(url.clone(), DEFAULT_FETCH_TIMEOUT).unwrap();
        assert_eq!(source.jwks_url(), &url);
    }

    #[tokio::test]
    async fn fetches_key_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/jwks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "keys": [
                    { "kid": "k1", "x5c": ["MIIB"] },
                    { "kty": "EC", "kid": "k2", "crv": "secp256k1", "x": "AQ", "y": "AQ" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let jwks = source_for(&server).await.fetch_key_set().await.unwrap();
        assert_eq!(jwks.keys.len(), 2);
        assert_eq!(jwks.keys[0]["kid"], "k1");
        assert_eq!(jwks.keys[1]["crv"], "secp256k1");
    }

    #[tokio::test]
    async fn document_without_keys_is_key_resolution_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "kid": "k1" })))
            .mount(&server)
            .await;

        let result = source_for(&server).await.fetch_key_set().await;
        assert!(matches!(result, Err(AuthError::KeyResolution(msg)) if msg.contains("invalid JWKS")));
    }

    #[tokio::test]
    async fn server_error_is_key_resolution_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = source_for(&server).await.fetch_key_set().await;
        assert!(matches!(result, Err(AuthError::KeyResolution(msg)) if msg.contains("500")));
    }

    #[tokio::test]
    async fn malformed_document_is_key_resolution_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = source_for(&server).await.fetch_key_set().await;
        assert!(matches!(result, Err(AuthError::KeyResolution(_))));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "keys": [] }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/.well-known/jwks.json", server.uri())).unwrap();
        let source = HttpJwksSource::new(url, Duration::from_millis(200)).unwrap();
        let result = source.fetch_key_set().await;
        assert!(matches!(result, Err(AuthError::KeyResolution(_))));
    }

    #[tokio::test]
    async fn static_key_set_serves_its_document() {
        let source = StaticKeySet::new(JwksDocument::default());
        assert!(source.fetch_key_set().await.unwrap().keys.is_empty());
    }
}
