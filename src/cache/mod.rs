// ABOUTME: Cache abstraction for progress snapshot storage with per-user isolation
// ABOUTME: Pluggable backend trait following the LocalStore provider pattern
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

/// In-memory cache implementation
pub mod memory;

use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Default maximum number of cached entries
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1_000;
/// Default background cleanup interval in seconds
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;
/// Progress snapshot TTL in seconds (15 minutes)
///
/// An upper bound only - staleness within the TTL is governed by the
/// caller's force-refresh flag, not by the cache.
pub const TTL_PROGRESS_SECS: u64 = 900;
/// Profile cache TTL in seconds (24 hours)
pub const TTL_PROFILE_SECS: u64 = 86_400;

/// Cache provider trait for pluggable backend implementations
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync + Clone {
    /// Create a new cache instance with configuration
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Store a value in the cache with a TTL
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>;

    /// Retrieve a value from the cache (None on miss or expiry)
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails
    async fn get<T: for<'de> Deserialize<'de>>(&self, key: &CacheKey) -> AppResult<Option<T>>;

    /// Remove a single cache entry
    ///
    /// # Errors
    ///
    /// Returns an error if invalidation fails
    async fn invalidate(&self, key: &CacheKey) -> AppResult<()>;

    /// Remove every entry belonging to a user (e.g. after a profile update)
    ///
    /// # Errors
    ///
    /// Returns an error if invalidation fails
    async fn invalidate_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Check whether a key currently resolves to a live entry
    ///
    /// # Errors
    ///
    /// Returns an error if the existence check fails
    async fn exists(&self, key: &CacheKey) -> AppResult<bool>;

    /// Get the remaining TTL for a key
    ///
    /// # Errors
    ///
    /// Returns an error if the TTL check fails
    async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>>;

    /// Clear all cache entries (testing/admin)
    ///
    /// # Errors
    ///
    /// Returns an error if the clear operation fails
    async fn clear_all(&self) -> AppResult<()>;
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction
    pub max_entries: usize,
    /// Cleanup interval for expired entries
    pub cleanup_interval: Duration,
    /// Enable the background cleanup task (disable in tests to avoid
    /// runtime conflicts)
    pub enable_background_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: true,
        }
    }
}

/// Structured cache key with per-user isolation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Owning user
    pub user_id: Uuid,
    /// Specific resource being cached
    pub resource: CacheResource,
}

impl CacheKey {
    /// Create a new cache key
    #[must_use]
    pub const fn new(user_id: Uuid, resource: CacheResource) -> Self {
        Self { user_id, resource }
    }

    /// Prefix shared by all of a user's entries
    #[must_use]
    pub fn user_prefix(user_id: Uuid) -> String {
        format!("user:{user_id}:")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}:{}", self.user_id, self.resource)
    }
}

/// Cache resource types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheResource {
    /// Assembled progress snapshot for one time range
    Progress {
        /// Stable `TimeRange::cache_key()` fragment
        range_key: String,
    },
    /// Sanitized user profile
    Profile,
}

impl CacheResource {
    /// Recommended TTL for this resource type
    #[must_use]
    pub const fn recommended_ttl(&self) -> Duration {
        match self {
            Self::Progress { .. } => Duration::from_secs(TTL_PROGRESS_SECS),
            Self::Profile => Duration::from_secs(TTL_PROFILE_SECS),
        }
    }
}

impl fmt::Display for CacheResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progress { range_key } => write!(f, "progress:{range_key}"),
            Self::Profile => write!(f, "profile"),
        }
    }
}
