// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures: an RSA signing key with its self-signed certificate, and
//! an unrelated "rogue" key.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use place2be_api::auth::{JwksDocument, KeySetCache, StaticKeySet, TokenVerifier, VerifierConfig};
use serde_json::{json, Value};

pub const SIGNING_KEY: &str = include_str!("../fixtures/signing_key.pem");
pub const ROGUE_KEY: &str = include_str!("../fixtures/rogue_key.pem");
pub const SIGNING_CERT: &str = include_str!("../fixtures/signing_cert.pem");

/// Base64url modulus of `SIGNING_KEY`.
pub const SIGNING_KEY_N: &str = "tLVopyjFL4yVTBIbU9uARGjMm04U34ueqqN89qXEmlUuDshJ6cwQ7m-HUU6HXzLdiCSfbUbMdf8aOtb5JsmVmXiyxqtCmTtucCxPz8C1oInijAUfZlM8JYZOKudsRJzp7s3ZQFtDjazPu7FxiISnfM4cdixasm9SstNURE_EI6EkoVy5fkY_-giixxgTcCbSMJ_OSqJQ198fvOzl7fGftRj1qN3RtwODLHYxixJ8HrvdhmOaheq4WEuSs6Gs9QHdNFR1tqZOvhdbhvdk_wHb2VnPkgoOQtVcBI1OPE4wDm0ZLaDqqXuaH1TcFhnxLdAdZtdR504meBnjYTzNB6ZvxQ";

pub const KID: &str = "place2be-test-key";
pub const ISSUER: &str = "https://place2be-test.eu.auth0.com/";
pub const AUDIENCE: &str = "https://api.place2be.io";

/// Certificate as it appears in `x5c`: standard base64 DER, no PEM armor.
pub fn cert_b64() -> String {
    SIGNING_CERT
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect()
}

/// JWKS document with one key under `kid`, carried only as `x5c`.
pub fn jwks_json(kid: &str) -> Value {
    json!({
        "keys": [{ "kid": kid, "x5c": [cert_b64()] }]
    })
}

/// JWKS document as Auth0 publishes it: RSA members plus `x5c`.
pub fn full_jwks_json(kid: &str) -> Value {
    json!({
        "keys": [{
            "alg": "RS256",
            "kty": "RSA",
            "use": "sig",
            "kid": kid,
            "n": SIGNING_KEY_N,
            "e": "AQAB",
            "x5c": [cert_b64()]
        }]
    })
}

/// An entry no RSA key can be built from.
pub fn secp256k1_entry() -> Value {
    json!({
        "kty": "EC",
        "kid": "ec-1",
        "crv": "secp256k1",
        "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
        "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
    })
}

pub fn jwks(kid: &str) -> JwksDocument {
    serde_json::from_value(jwks_json(kid)).unwrap()
}

pub fn valid_claims() -> Value {
    let now = Utc::now().timestamp();
    json!({
        "sub": "auth0|5ec3a1f0c2e3",
        "iss": ISSUER,
        "aud": AUDIENCE,
        "iat": now,
        "exp": now + 3600,
        "scope": "read:games write:games",
        "https://place2be.io/email": "player@example.com"
    })
}

pub fn sign(key_pem: &str, kid: Option<&str>, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(key_pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}

pub fn verifier_with(jwks: JwksDocument, config: VerifierConfig) -> TokenVerifier {
    let cache = KeySetCache::new(Arc::new(StaticKeySet::new(jwks)));
    TokenVerifier::new(config, cache)
}

pub fn static_verifier() -> TokenVerifier {
    verifier_with(jwks(KID), VerifierConfig::new(ISSUER, AUDIENCE))
}
