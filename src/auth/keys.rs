// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing keys extracted from a JWKS document.
//!
//! Auth0 publishes each key twice: as RSA components (`n`, `e`) and as a
//! self-signed certificate in `x5c`. The certificate is authoritative; the
//! components are only used for entries without one.

use std::collections::HashMap;

use base64ct::{Base64, Encoding};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use serde_json::Value;
use x509_parser::public_key::PublicKey;

use super::jwks::JwksDocument;

/// The members every entry is read for; the rest is left to [`Jwk`].
#[derive(Debug, Deserialize)]
struct EntryHead {
    #[serde(default)]
    kid: Option<String>,
    #[serde(default)]
    x5c: Vec<String>,
}

/// Public keys indexed by key ID.
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    /// Build a key set from a JWKS document.
    ///
    /// Entries without a `kid` or without a usable RSA key are skipped.
    pub fn from_document(jwks: &JwksDocument) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys.len());

        for entry in &jwks.keys {
            let head = match EntryHead::deserialize(entry) {
                Ok(head) => head,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable JWKS entry");
                    continue;
                }
            };
            let Some(kid) = head.kid else {
                tracing::warn!("Skipping JWKS entry without kid");
                continue;
            };

            match decoding_key(entry, &head.x5c) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(reason) => {
                    tracing::warn!(kid = %kid, %reason, "Skipping unusable JWKS entry");
                }
            }
        }

        Self { keys }
    }

/// Key for `kid`, if published.
    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key IDs in this set (unordered).
    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for KeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySet")
            .field("kids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Convert one JWKS entry to an RSA decoding key.
fn decoding_key(entry: &Value, x5c: &[String]) -> Result<DecodingKey, String> {
    if let Some(cert) = x5c.first() {
        return key_from_certificate(cert);
    }

    let jwk = Jwk::deserialize(entry).map_err(|e| format!("unsupported JWK: {e}"))?;
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| format!("invalid RSA components: {e}")),
        _ => Err("not an RSA key".to_string()),
    }
}

/// Extract the RSA public key from a base64 (not base64url) DER certificate.
pub fn key_from_certificate(cert_b64: &str) -> Result<DecodingKey, String> {
    let der = Base64::decode_vec(cert_b64.trim())
        .map_err(|e| format!("x5c is not base64: {e}"))?;

    let (_, cert) = x509_parser::parse_x509_certificate(&der)
        .map_err(|e| format!("x5c is not an X.509 certificate: {e}"))?;

    match cert.public_key().parsed() {
        Ok(PublicKey::RSA(rsa)) => Ok(DecodingKey::from_rsa_raw_components(
            strip_leading_zeros(rsa.modulus),
            strip_leading_zeros(rsa.exponent),
        )),
        Ok(_) => Err("certificate key is not RSA".to_string()),
        Err(e) => Err(format!("certificate key cannot be parsed: {e}")),
    }
}

// DER integers carry a sign byte; the raw component form does not.
fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}
