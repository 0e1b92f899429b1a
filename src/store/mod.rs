// ABOUTME: Local persisted store abstraction mirroring users and per-metric logs
// ABOUTME: Trait seam so the repository can be exercised against an in-memory database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! # Local Store
//!
//! The locally persisted cache side of the repository: one `users` mirror and
//! the three append-only log tables, keyed by user identity. Log rows are
//! immutable once written; the only mutation is an explicit id-based delete.

/// SQLite store implementation
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{ExerciseLog, FoodLog, UserProfile, WeightLog};

/// Local store abstraction
///
/// All implementations provide a consistent interface to the repository
/// layer; the production backend is SQLite, tests run against
/// `sqlite::memory:`.
#[async_trait]
pub trait LocalStore: Send + Sync + Clone {
    /// Open a store for the given connection string and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migration fails
    async fn new(database_url: &str) -> AppResult<Self>
    where
        Self: Sized;

    /// Apply schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if a migration statement fails
    async fn migrate(&self) -> AppResult<()>;

    // ================================
    // Profiles
    // ================================

    /// Insert or replace a profile (last write wins by `updated_at`)
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()>;

    /// Get a profile by user id
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Get a profile by email
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails
    async fn get_profile_by_email(&self, email: &str) -> AppResult<Option<UserProfile>>;

    /// Remove a profile and all of its logs
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    async fn delete_profile(&self, user_id: Uuid) -> AppResult<()>;

    // ================================
    // Logs (append-only)
    // ================================

    /// Insert a food log entry
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    async fn insert_food_log(&self, entry: &FoodLog) -> AppResult<()>;

    /// Insert an exercise log entry
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    async fn insert_exercise_log(&self, entry: &ExerciseLog) -> AppResult<()>;

    /// Insert a weight log entry
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    async fn insert_weight_log(&self, entry: &WeightLog) -> AppResult<()>;

    /// Food logs for a user within `[start, end]`, ordered by timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails
    async fn food_logs_in_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<FoodLog>>;

    /// Exercise logs for a user within `[start, end]`, ordered by timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails
    async fn exercise_logs_in_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ExerciseLog>>;

    /// Weight logs for a user within `[start, end]`, ordered by timestamp
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails
    async fn weight_logs_in_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<WeightLog>>;

    /// Most recent weight entry for a user, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails
    async fn latest_weight(&self, user_id: Uuid) -> AppResult<Option<WeightLog>>;

    /// Delete a food log entry by id
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    async fn delete_food_log(&self, entry_id: Uuid) -> AppResult<()>;

    /// Delete an exercise log entry by id
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    async fn delete_exercise_log(&self, entry_id: Uuid) -> AppResult<()>;

    /// Delete a weight log entry by id
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    async fn delete_weight_log(&self, entry_id: Uuid) -> AppResult<()>;
}
