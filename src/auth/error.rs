// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned to clients for every authentication failure.
pub const NOT_AUTHENTICATED: &str = "Not Authenticated";

/// Authentication error type.
///
/// Each variant is a distinct failure class of a single verification
/// attempt. Clients always receive the same 401 response; the variant only
/// shows up in logs through [`AuthError::error_code`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No bearer token was supplied
    #[error("no bearer token supplied")]
    MissingToken,
    /// Token is not three base64url segments with JSON header and payload
    #[error("token is malformed: {0}")]
    MalformedToken(String),
    /// Signing key could not be obtained for the token's `kid`
    #[error("signing key could not be resolved: {0}")]
    KeyResolution(String),
    /// Signature does not verify under the resolved key and policy algorithm
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// A registered claim is missing or does not match configuration
    #[error("token claim `{claim}` does not match")]
    ClaimMismatch { claim: String },
    /// Token `exp` is in the past
    #[error("token has expired")]
    TokenExpired,
    /// Token `nbf` is in the future
    #[error("token is not yet valid")]
    TokenNotYetValid,
}

#[derive(Serialize)]
struct AuthErrorBody {
    errors: Vec<&'static str>,
}

impl AuthError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        AuthError::MalformedToken(detail.into())
    }

    pub(crate) fn key_resolution(detail: impl Into<String>) -> Self {
        AuthError::KeyResolution(detail.into())
    }

    pub(crate) fn claim_mismatch(claim: impl Into<String>) -> Self {
        AuthError::ClaimMismatch {
            claim: claim.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::KeyResolution(_) => "key_resolution_error",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::ClaimMismatch { .. } => "claim_mismatch",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
        }
    }

    /// Get the HTTP status code for this error.
    ///
    /// Always 401: clients are not told which check failed.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::KeyResolution(detail) => {
                tracing::error!(error_code = self.error_code(), %detail, "Authentication failed");
            }
            _ => {
                tracing::warn!(error_code = self.error_code(), error = %self, "Authentication failed");
            }
        }

        let body = Json(AuthErrorBody {
            errors: vec![NOT_AUTHENTICATED],
        });
        let mut response = (self.status_code(), body).into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        response
    }
}
