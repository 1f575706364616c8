// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! `verify` runs three stages and stops at the first failure:
//!
//! 1. structural decode of the compact token ([`UnverifiedToken`])
//! 2. key resolution by the header's `kid` ([`KeySetCache`])
//! 3. RS256 signature and `exp`/`nbf`/`iss`/`aud` checks (`jsonwebtoken`)
//!
//! A header naming any algorithm other than RS256, `none` included, fails
//! stage 3 as [`AuthError::SignatureInvalid`].

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, Validation};
use tracing::Instrument;

use super::cache::KeySetCache;
use super::claims::Claims;
use super::error::AuthError;
use super::token::UnverifiedToken;

/// Signing algorithm accepted by policy.
pub const POLICY_ALGORITHM: Algorithm = Algorithm::RS256;

/// `alg` header value of [`POLICY_ALGORITHM`].
const POLICY_ALGORITHM_NAME: &str = "RS256";

/// Clock skew tolerance (60 seconds).
pub const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Expected claim values and expiry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Expected `iss`, exactly as issued (Auth0 issuers end with `/`)
    pub issuer: String,
    /// Expected `aud`
    pub audience: String,
    /// Clock skew tolerance in seconds for `exp` and `nbf`
    pub leeway: u64,
    /// Reject tokens without `exp`
    pub require_exp: bool,
}

impl VerifierConfig {
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            leeway: CLOCK_SKEW_LEEWAY,
            require_exp: true,
        }
    }

    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn with_require_exp(mut self, require_exp: bool) -> Self {
        self.require_exp = require_exp;
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(POLICY_ALGORITHM);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let mut required = vec!["iss", "aud"];
        if self.require_exp {
            required.push("exp");
        }
        validation.set_required_spec_claims(required.as_slice());
        validation
    }
}

/// Verifies bearer tokens against the identity provider's key set.
#[derive(Debug)]
pub struct TokenVerifier {
    validation: Validation,
    keys: KeySetCache,
}

impl TokenVerifier {
    pub fn new(config: VerifierConfig, keys: KeySetCache) -> Self {
        Self {
            validation: config.validation(),
            keys,
        }
    }

    /// Key set cache backing this verifier.
    pub fn key_cache(&self) -> &KeySetCache {
        &self.keys
    }

    /// Verify `token` and return its claims.
    ///
    /// `token` is the bare compact JWT, without the `Bearer` scheme.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let span = tracing::debug_span!("verify_token", kid = tracing::field::Empty);
        async move {
            let unverified = UnverifiedToken::decode(token)?;

            let kid = unverified
                .kid()
                .ok_or_else(|| AuthError::key_resolution("token header has no kid"))?;
            tracing::Span::current().record("kid", kid);

            let key = self.keys.key_for(kid).await?;

            if unverified.alg() != Some(POLICY_ALGORITHM_NAME) {
                tracing::debug!(alg = unverified.alg(), "Algorithm rejected by policy");
                return Err(AuthError::SignatureInvalid);
            }

            let data = decode::<Claims>(token, &key, &self.validation).map_err(classify)?;
            tracing::debug!(sub = data.claims.sub(), "Token verified");
            Ok(data.claims)
        }
        .instrument(span)
        .await
    }
}

/// Map a `jsonwebtoken` failure onto the authentication taxonomy.
fn classify(error: jsonwebtoken::errors::Error) -> AuthError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        ErrorKind::InvalidIssuer => AuthError::claim_mismatch("iss"),
        ErrorKind::InvalidAudience => AuthError::claim_mismatch("aud"),
        ErrorKind::InvalidSubject => AuthError::claim_mismatch("sub"),
        ErrorKind::MissingRequiredClaim(claim) => AuthError::claim_mismatch(claim.as_str()),
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidRsaKey(_)
        | ErrorKind::InvalidKeyFormat => AuthError::SignatureInvalid,
        _ => AuthError::malformed(error.to_string()),
    }
}
