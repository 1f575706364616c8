// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_TENANT_URL` | Auth0 tenant base URL | Required |
//! | `AUTH0_API_AUDIENCE` | Expected JWT audience claim | Required |
//! | `AUTH0_ISSUER` | Expected JWT issuer claim | `<tenant>/` |
//! | `AUTH0_JWKS_URL` | JWKS endpoint | `<tenant>/.well-known/jwks.json` |
//! | `JWKS_CACHE_TTL_SECS` | Key set cache TTL, `0` refetches per request | `300` |
//! | `JWKS_FETCH_TIMEOUT_SECS` | Timeout for one JWKS request | `3` |
//! | `JWT_LEEWAY_SECS` | Clock skew tolerance | `60` |
//! | `JWT_REQUIRE_EXP` | Reject tokens without `exp` | `true` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::auth::cache::DEFAULT_CACHE_TTL;
use crate::auth::jwks::DEFAULT_FETCH_TIMEOUT;
use crate::auth::verifier::CLOCK_SKEW_LEEWAY;
use crate::auth::VerifierConfig;

pub const AUTH0_TENANT_URL_ENV: &str = "AUTH0_TENANT_URL";
pub const AUTH0_API_AUDIENCE_ENV: &str = "AUTH0_API_AUDIENCE";
pub const AUTH0_ISSUER_ENV: &str = "AUTH0_ISSUER";
pub const AUTH0_JWKS_URL_ENV: &str = "AUTH0_JWKS_URL";
pub const JWKS_CACHE_TTL_ENV: &str = "JWKS_CACHE_TTL_SECS";
pub const JWKS_FETCH_TIMEOUT_ENV: &str = "JWKS_FETCH_TIMEOUT_SECS";
pub const JWT_LEEWAY_ENV: &str = "JWT_LEEWAY_SECS";
pub const JWT_REQUIRE_EXP_ENV: &str = "JWT_REQUIRE_EXP";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Path of the JWKS document below the tenant URL.
pub const JWKS_PATH: &str = ".well-known/jwks.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format `{other}`")),
        }
    }
}

/// Identity provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub issuer: String,
    pub audience: String,
    pub jwks_url: Url,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub leeway: u64,
    pub require_exp: bool,
}

impl AuthSettings {
    pub fn verifier_config(&self) -> VerifierConfig {
        VerifierConfig::new(&self.issuer, &self.audience)
            .with_leeway(self.leeway)
            .with_require_exp(self.require_exp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub auth: AuthSettings,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let tenant = env.required(AUTH0_TENANT_URL_ENV)?;
        let tenant_url = parse_url(AUTH0_TENANT_URL_ENV, &tenant)?;
        let tenant_base = tenant.trim_end_matches('/');

        let issuer = env
            .optional(AUTH0_ISSUER_ENV)
            .unwrap_or_else(|| format!("{tenant_base}/"));

        let jwks_url = match env.optional(AUTH0_JWKS_URL_ENV) {
            Some(url) => parse_url(AUTH0_JWKS_URL_ENV, &url)?,
            None => with_trailing_slash(tenant_url)
                .join(JWKS_PATH)
                .map_err(|e| invalid(AUTH0_TENANT_URL_ENV, e))?,
        };

        let auth = AuthSettings {
            issuer,
            audience: env.required(AUTH0_API_AUDIENCE_ENV)?,
            jwks_url,
            cache_ttl: env
                .parsed::<u64>(JWKS_CACHE_TTL_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
            fetch_timeout: env
                .parsed::<u64>(JWKS_FETCH_TIMEOUT_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT),
            leeway: env.parsed(JWT_LEEWAY_ENV)?.unwrap_or(CLOCK_SKEW_LEEWAY),
            require_exp: env.parsed(JWT_REQUIRE_EXP_ENV)?.unwrap_or(true),
        };

        let host: IpAddr = env
            .parsed(HOST_ENV)?
            .unwrap_or(IpAddr::from([0, 0, 0, 0]));
        let port: u16 = env.parsed(PORT_ENV)?.unwrap_or(8080);

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            log_format: env.parsed(LOG_FORMAT_ENV)?.unwrap_or_default(),
            auth,
        })
    }
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(name)
            .map(|value| value.parse::<T>().map_err(|e| invalid(name, e)))
            .transpose()
    }
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid(name, e))?;
    match url.scheme() {
        "https" | "http" => Ok(url),
        scheme => Err(invalid(name, format!("unsupported scheme `{scheme}`"))),
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn invalid(name: &'static str, reason: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("AUTH0_TENANT_URL", "https://place2be.eu.auth0.com"),
        ("AUTH0_API_AUDIENCE", "https://api.place2be.io"),
    ];

    #[test]
    fn derives_issuer_and_jwks_url_from_tenant() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.auth.issuer, "https://place2be.eu.auth0.com/");
        assert_eq!(
            config.auth.jwks_url.as_str(),
            "https://place2be.eu.auth0.com/.well-known/jwks.json"
        );
        assert_eq!(config.auth.audience, "https://api.place2be.io");
    }

    #[test]
    fn applies_defaults() {
        let config = load(MINIMAL).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.auth.cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(config.auth.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(config.auth.leeway, 60);
        assert!(config.auth.require_exp);
    }

    #[test]
    fn tenant_with_trailing_slash_and_path() {
        let config = load(&[
            ("AUTH0_TENANT_URL", "https://idp.example.com/tenant/"),
            ("AUTH0_API_AUDIENCE", "api"),
        ])
        .unwrap();
        assert_eq!(config.auth.issuer, "https://idp.example.com/tenant/");
        assert_eq!(
            config.auth.jwks_url.as_str(),
            "https://idp.example.com/tenant/.well-known/jwks.json"
        );
    }

    #[test]
    fn explicit_values_override_defaults() {
        let mut vars = MINIMAL.to_vec();
        vars.extend([
            ("AUTH0_ISSUER", "https://custom-issuer.example.com/"),
            ("AUTH0_JWKS_URL", "https://keys.example.com/jwks.json"),
            ("JWKS_CACHE_TTL_SECS", "0"),
            ("JWKS_FETCH_TIMEOUT_SECS", "1"),
            ("JWT_LEEWAY_SECS", "5"),
            ("JWT_REQUIRE_EXP", "false"),
            ("HOST", "127.0.0.1"),
            ("PORT", "3000"),
            ("LOG_FORMAT", "json"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.auth.issuer, "https://custom-issuer.example.com/");
        assert_eq!(config.auth.jwks_url.as_str(), "https://keys.example.com/jwks.json");
        assert_eq!(config.auth.cache_ttl, Duration::ZERO);
        assert_eq!(config.auth.fetch_timeout, Duration::from_secs(1));
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Json);

        let verifier = config.auth.verifier_config();
        assert_eq!(verifier.leeway, 5);
        assert!(!verifier.require_exp);
    }

    #[test]
    fn missing_required_variables() {
        assert!(matches!(
            load(&[("AUTH0_API_AUDIENCE", "api")]),
            Err(ConfigError::Missing("AUTH0_TENANT_URL"))
        ));
        assert!(matches!(
            load(&[("AUTH0_TENANT_URL", "https://t.example.com")]),
            Err(ConfigError::Missing("AUTH0_API_AUDIENCE"))
        ));
    }

    #[test]
    fn rejects_invalid_values() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("PORT", "eighty"));
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));

        assert!(matches!(
            load(&[("AUTH0_TENANT_URL", "ftp://t.example.com"), ("AUTH0_API_AUDIENCE", "api")]),
            Err(ConfigError::Invalid { name: "AUTH0_TENANT_URL", .. })
        ));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("AUTH0_ISSUER", "   "));
        let config = load(&vars).unwrap();
        assert_eq!(config.auth.issuer, "https://place2be.eu.auth0.com/");
    }
}
