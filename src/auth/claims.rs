// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and authenticated user representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claims of a verified token.
///
/// Holds the full payload as issued, custom claims included.
/// [`TokenVerifier::verify`](super::TokenVerifier::verify) returns one only
/// after every check passed; deserializing one directly verifies nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Subject (user ID)
    pub fn sub(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    /// Issuer
    pub fn iss(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    /// Audiences; `aud` may be a single string or an array.
    pub fn aud(&self) -> Vec<&str> {
        match self.0.get("aud") {
            Some(Value::String(aud)) => vec![aud.as_str()],
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Expiration timestamp
    pub fn exp(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    /// Expiration as a UTC datetime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp().and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// OAuth scopes from the space-delimited `scope` claim.
    pub fn scopes(&self) -> Vec<&str> {
        self.str_claim("scope")
            .map(|scope| scope.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Arbitrary claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

/// Authenticated caller extracted from a verified token.
///
/// This is the type handlers receive from the [`Auth`](super::Auth)
/// extractor and what the middleware stores in request extensions.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedUser {
    /// Canonical user ID (`sub` claim)
    pub user_id: String,

    /// Token issuer
    pub issuer: String,

    /// Token expiration, if the token carries one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted OAuth scopes
    pub scopes: Vec<String>,

    /// Full verified claim set
    #[serde(skip)]
    pub claims: Claims,
}

impl AuthenticatedUser {
    /// Create from verified claims.
    ///
    /// A token without `sub` identifies nobody; `None` is returned.
    pub fn from_claims(claims: Claims) -> Option<Self> {
        let user_id = claims.sub()?.to_string();

        Some(Self {
            user_id,
            issuer: claims.iss().unwrap_or_default().to_string(),
            expires_at: claims.expires_at(),
            scopes: claims.scopes().into_iter().map(str::to_string).collect(),
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        let value = serde_json::json!({
            "sub": "auth0|5ec3a",
            "iss": "https://tenant.example.com/",
            "aud": ["https://api.place2be.io", "https://tenant.example.com/userinfo"],
            "iat": 1700000000,
            "exp": 1700003600,
            "scope": "openid profile read:games",
            "https://place2be.io/email": "player@example.com"
        });
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn exposes_registered_claims() {
        let claims = sample_claims();
        assert_eq!(claims.sub(), Some("auth0|5ec3a"));
        assert_eq!(claims.iss(), Some("https://tenant.example.com/"));
        assert_eq!(claims.exp(), Some(1700003600));
        assert_eq!(claims.aud().len(), 2);
        assert_eq!(
            claims.get("https://place2be.io/email"),
            Some(&Value::from("player@example.com"))
        );
    }

    #[test]
    fn single_audience_string() {
        let claims: Claims = serde_json::from_value(serde_json::json!({ "aud": "api" })).unwrap();
        assert_eq!(claims.aud(), vec!["api"]);
    }

    #[test]
    fn from_claims_extracts_user() {
        let user = AuthenticatedUser::from_claims(sample_claims()).unwrap();
        assert_eq!(user.user_id, "auth0|5ec3a");
        assert_eq!(user.issuer, "https://tenant.example.com/");
        assert_eq!(user.expires_at.unwrap().timestamp(), 1700003600);
        assert_eq!(user.scopes, vec!["openid", "profile", "read:games"]);
    }

    #[test]
    fn from_claims_requires_subject() {
        let claims: Claims = serde_json::from_value(serde_json::json!({ "iss": "x" })).unwrap();
        assert!(AuthenticatedUser::from_claims(claims).is_none());
    }

    #[test]
    fn serializes_without_raw_claims() {
        let user = AuthenticatedUser::from_claims(sample_claims()).unwrap();
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_id"], "auth0|5ec3a");
        assert!(json.get("claims").is_none());
    }
}
