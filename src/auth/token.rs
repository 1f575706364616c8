// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Structural decoding of compact JWTs.
//!
//! Nothing here is trusted: the decoded header is only used to pick the
//! signing key, and the payload is only checked for shape.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::{Map, Value};

use super::AuthError;

/// Header and payload of a token that has not been verified yet.
#[derive(Debug, Clone)]
pub struct UnverifiedToken {
    pub header: Map<String, Value>,
    pub payload: Map<String, Value>,
}

impl UnverifiedToken {
    /// Split `raw` into its three segments and decode header and payload.
    pub fn decode(raw: &str) -> Result<Self, AuthError> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Err(AuthError::malformed(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        }

        Ok(Self {
            header: decode_segment(segments[0], "header")?,
            payload: decode_segment(segments[1], "payload")?,
        })
    }

    /// Key ID from the header, if present and a string.
    pub fn kid(&self) -> Option<&str> {
        self.header.get("kid").and_then(Value::as_str)
    }

    /// Algorithm named in the header.
    pub fn alg(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Map<String, Value>, AuthError> {
    let bytes = Base64UrlUnpadded::decode_vec(segment.trim_end_matches('='))
        .map_err(|_| AuthError::malformed(format!("{name} is not base64url")))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AuthError::malformed(format!("{name} is not a JSON object"))),
        Err(_) => Err(AuthError::malformed(format!("{name} is not valid JSON"))),
    }
}
