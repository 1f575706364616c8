// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide key set cache.
//!
//! ## Policy
//!
//! - A snapshot younger than the TTL is served without network access
//! - A TTL of zero refetches on every lookup
//! - An unknown `kid` in a fresh snapshot triggers one refetch (key rotation),
//!   at most once per `min_refresh_interval`
//! - A failed fetch is an error; an expired snapshot is never served
//! - Availability checks (health endpoints) fetch at most once per
//!   `min_refresh_interval`
//!
//! Snapshots are immutable and swapped as a whole, so readers never observe
//! a half-built key set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::DecodingKey;
use tokio::sync::{Mutex, RwLock};

use super::error::AuthError;
use super::jwks::KeySetSource;
use super::keys::KeySet;

/// Default key set cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default minimum spacing of refetches caused by unknown key IDs.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Key set snapshot.
#[derive(Debug)]
struct Snapshot {
    keys: KeySet,
    fetched_at: Instant,
}

/// Outcome of the last availability check that had to fetch.
#[derive(Debug, Clone, Copy)]
struct AvailabilityCheck {
    at: Instant,
    available: bool,
}

/// Caches the key set obtained from a [`KeySetSource`].
pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    ttl: Duration,
    min_refresh_interval: Duration,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    last_check: RwLock<Option<AvailabilityCheck>>,
    /// Serializes fetches so concurrent misses share one request
    refresh_lock: Mutex<()>,
}

impl KeySetCache {
    /// Create a cache with default TTL and refresh interval.
    pub fn new(source: Arc<dyn KeySetSource>) -> Self {
        Self {
            source,
            ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            snapshot: RwLock::new(None),
            last_check: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Create with custom minimum interval between rotation refetches.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve the decoding key for `kid`.
    pub async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let current = self.current().await;

        if let Some(snapshot) = current.as_ref().filter(|s| self.is_live(s)) {
            if let Some(key) = snapshot.keys.get(kid) {
                return Ok(key.clone());
            }
            if snapshot.fetched_at.elapsed() < self.min_refresh_interval {
                return Err(unknown_kid(kid));
            }
            tracing::info!(kid, "Unknown kid, refetching key set");
        }

        let snapshot = self.refresh_after(current.as_ref()).await?;
        snapshot.keys.get(kid).cloned().ok_or_else(|| unknown_kid(kid))
    }

    /// Force refresh the key set.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let current = self.current().await;
        self.refresh_after(current.as_ref()).await.map(|_| ())
    }

    /// Check if a key set is cached and within its TTL.
    pub async fn is_fresh(&self) -> bool {
        self.current()
            .await
            .is_some_and(|snapshot| !self.ttl.is_zero() && self.is_live(&snapshot))
    }

    /// Whether signing keys can currently be obtained.
    ///
    /// A fresh snapshot, or one fetched within `min_refresh_interval`, counts
    /// as available. Otherwise the key set is refetched, unless a fetch for
    /// this check already ran within `min_refresh_interval`, in which case
    /// its outcome is reported again.
    pub async fn is_available(&self) -> bool {
        if self.is_fresh().await {
            return true;
        }
        let recent = self.current().await.is_some_and(|snapshot| {
            snapshot.fetched_at.elapsed() < self.min_refresh_interval
        });
        if recent {
            return true;
        }

        if let Some(check) = *self.last_check.read().await {
            if check.at.elapsed() < self.min_refresh_interval {
                return check.available;
            }
        }

        let available = match self.refresh().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "JWKS unavailable");
                false
            }
        };
        *self.last_check.write().await = Some(AvailabilityCheck {
            at: Instant::now(),
            available,
        });
        available
    }

    async fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().await.clone()
    }

    fn is_live(&self, snapshot: &Snapshot) -> bool {
        snapshot.fetched_at.elapsed() < self.ttl
    }

    /// Fetch a new snapshot unless another task replaced `seen` meanwhile.
    async fn refresh_after(&self, seen: Option<&Arc<Snapshot>>) -> Result<Arc<Snapshot>, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(latest) = self.current().await {
            let replaced = seen.is_none_or(|seen| !Arc::ptr_eq(seen, &latest));
            if replaced && self.is_live(&latest) {
                return Ok(latest);
            }
        }

        let jwks = self.source.fetch_key_set().await?;
        let snapshot = Arc::new(Snapshot {
            keys: KeySet::from_document(&jwks),
            fetched_at: Instant::now(),
        });
        tracing::debug!(keys = snapshot.keys.len(), "Key set refreshed");

        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(snapshot)
    }
}

impl std::fmt::Debug for KeySetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetCache")
            .field("ttl", &self.ttl)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .finish_non_exhaustive()
    }
}

fn unknown_kid(kid: &str) -> AuthError {
    AuthError::key_resolution(format!("no key with kid `{kid}` in JWKS"))
}
