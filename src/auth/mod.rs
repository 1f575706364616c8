// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer token authentication against an Auth0 tenant.
//!
//! ## Auth Flow
//!
//! 1. Client authenticates with Auth0 and obtains an access token
//! 2. Client sends `Authorization: Bearer <token>`
//! 3. Server:
//!    - Decodes the token header and payload
//!    - Resolves the signing key by `kid` from the tenant JWKS
//!      (`/.well-known/jwks.json`, public key taken from the `x5c` certificate)
//!    - Verifies the RS256 signature, expiry, issuer and audience
//!    - Exposes `sub` as the canonical `user_id`
//!
//! ## Security
//!
//! - A token is only checked against the key its own `kid` names
//! - Every failure is a 401 with the same body; logs carry the reason
//! - JWKS is cached with a TTL and refetched on unknown `kid`
//! - Clock skew tolerance is 60 seconds

pub mod cache;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod keys;
pub mod middleware;
pub mod token;
pub mod verifier;

pub use cache::KeySetCache;
pub use claims::{AuthenticatedUser, Claims};
pub use error::AuthError;
pub use extractor::{bearer_token, Auth};
pub use jwks::{HttpJwksSource, JwksDocument, KeySetSource, StaticKeySet};
pub use keys::KeySet;
pub use middleware::require_auth;
pub use verifier::{TokenVerifier, VerifierConfig};
