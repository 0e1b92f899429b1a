// ABOUTME: ProfileRepository - single access point for profile and log data
// ABOUTME: Cache-first reads, write-through local + fire-and-forget remote writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! # Profile Repository
//!
//! Single source of truth access for profile and log data, reconciling the
//! local persisted cache against the remote authoritative service.
//!
//! Policy summary:
//! - profile reads are cache-first with remote fill-in; remote failure
//!   degrades to the cached copy
//! - non-critical writes apply locally first (synchronous) and push to the
//!   remote as a detached best-effort task whose failure is logged and
//!   dropped (write-behind)
//! - identity and security sensitive operations (account deletion, password
//!   and email change) synchronously await remote confirmation and propagate
//!   failure
//! - log queries prefer the remote (cross-device source of truth) and
//!   degrade to local rows; they never raise, returning an empty ordered
//!   sequence when no data exists
//!
//! The repository is constructed once by the composition root and injected
//! into consumers; there is no hidden global instance.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{AppError, AppResult, ErrorCode};
use crate::metrics;
use crate::models::{
    ExerciseLog, FoodItem, FoodLog, LogKind, NutritionGoal, ProfilePatch, UserProfile, WeightLog,
};
use crate::remote::{DailyGoalRequest, LoginRequest, RegisterRequest, RemoteApi};
use crate::store::LocalStore;

/// Repository over a local store and a remote authoritative service
pub struct ProfileRepository<S, R>
where
    S: LocalStore,
    R: RemoteApi + ?Sized,
{
    store: S,
    remote: Arc<R>,
}

impl<S, R> Clone for ProfileRepository<S, R>
where
    S: LocalStore,
    R: RemoteApi + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            remote: Arc::clone(&self.remote),
        }
    }
}

impl<S, R> ProfileRepository<S, R>
where
    S: LocalStore + 'static,
    R: RemoteApi + ?Sized + 'static,
{
    /// Create a repository over the given store and remote service
    pub const fn new(store: S, remote: Arc<R>) -> Self {
        Self { store, remote }
    }

    // ================================
    // Accounts (critical path)
    // ================================

    /// Authenticate against the remote service and seed the local cache
    ///
    /// # Errors
    ///
    /// Propagates remote failures - login has no local fallback
    pub async fn login(&self, request: &LoginRequest) -> AppResult<UserProfile> {
        let profile = self.remote.login(request).await?;
        self.store.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Create an account and seed the local cache
    ///
    /// # Errors
    ///
    /// Propagates remote failures - registration has no local fallback
    pub async fn register(&self, request: &RegisterRequest) -> AppResult<UserProfile> {
        let profile = self.remote.register(request).await?;
        self.store.upsert_profile(&profile).await?;
        Ok(profile)
    }

    /// Permanently delete an account
    ///
    /// Waits for remote confirmation before touching the local cache, and
    /// propagates the failure otherwise - the user must know the account
    /// still exists.
    ///
    /// # Errors
    ///
    /// Propagates `ServerRejected`/`Unreachable`/`Timeout` from the remote
    pub async fn delete_account(&self, user_id: Uuid) -> AppResult<()> {
        self.remote.delete_user(user_id).await?;
        self.store.delete_profile(user_id).await
    }

    /// Change the account password (remote-only state)
    ///
    /// # Errors
    ///
    /// Propagates remote failures (critical operation)
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        self.remote
            .change_password(user_id, old_password, new_password)
            .await
    }

    /// Change the account email
    ///
    /// # Errors
    ///
    /// Propagates remote failures; the local mirror is only updated after
    /// remote confirmation
    pub async fn change_email(&self, user_id: Uuid, new_email: &str) -> AppResult<()> {
        self.remote.change_email(user_id, new_email).await?;
        if let Some(mut profile) = self.store.get_profile(user_id).await? {
            profile.email = new_email.to_owned();
            profile.updated_at = Utc::now();
            self.store.upsert_profile(&profile).await?;
        }
        Ok(())
    }

    // ================================
    // Profile
    // ================================

    /// Resolve a user's profile, cache-first
    ///
    /// On a cache miss the remote copy is fetched, sanitized (null fields
    /// dropped), persisted, and returned. A remote failure on the miss path
    /// degrades to `NotFound`; it never surfaces `Unreachable`/`Timeout`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the user exists in neither the cache nor the
    /// reachable remote
    pub async fn get_user_data(&self, user_id: Uuid) -> AppResult<UserProfile> {
        if let Some(profile) = self.store.get_profile(user_id).await? {
            debug!(user_id = %user_id, "profile served from local cache");
            return Ok(profile);
        }

        match self.remote.fetch_user(user_id).await {
            Ok(profile) => {
                self.store.upsert_profile(&profile).await?;
                Ok(profile)
            }
            Err(e) if e.code == ErrorCode::NotFound => Err(e),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "remote profile fetch failed with cold cache");
                Err(AppError::not_found(format!("user {user_id}")))
            }
        }
    }

    /// Apply a partial profile update, write-through
    ///
    /// The local cache is updated synchronously and always reflects the
    /// patch on return. When the patch touches weight, height, activity
    /// level, or goal, the cached `daily_calorie_goal` is recomputed before
    /// the write (remote computation first, engine fallback). The remote
    /// update then runs as a detached best-effort task: its failure is
    /// logged and never rolls back the local write.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user id; local store failures
    /// propagate
    pub async fn update_profile_field(
        &self,
        user_id: Uuid,
        patch: ProfilePatch,
    ) -> AppResult<UserProfile> {
        let mut profile = self
            .store
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {user_id}")))?;

        patch.apply_to(&mut profile);

        if patch.touches_goal_inputs() {
            profile.daily_calorie_goal = self.resolve_daily_goal(&profile).await;
        }

        self.store.upsert_profile(&profile).await?;

        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            if let Err(e) = remote.update_user(user_id, &patch).await {
                warn!(user_id = %user_id, error = %e, "background profile sync failed");
            }
        });

        Ok(profile)
    }

    /// Compute the daily calorie goal for a profile
    ///
    /// Remote `/calculate/daily_goal` is the primary path; the local engine
    /// formulas take over when it is unavailable. Returns `None` when the
    /// profile lacks the demographic inputs.
    pub async fn resolve_daily_goal(&self, profile: &UserProfile) -> Option<f64> {
        let (age, weight, height) = match (profile.age, profile.weight_kg, profile.height_cm) {
            (Some(age), Some(weight), Some(height)) => (age, weight, height),
            _ => {
                debug!(user_id = %profile.id, "profile lacks goal inputs, skipping recomputation");
                return None;
            }
        };

        let request = DailyGoalRequest {
            age,
            sex: profile.sex,
            weight,
            height,
            activity_level: profile.activity_level,
            goal: profile.goal,
        };

        match self.remote.calculate_daily_goal(&request).await {
            Ok(goal) => Some(goal),
            Err(e) => {
                debug!(user_id = %profile.id, error = %e, "remote goal computation unavailable, using engine fallback");
                Some(metrics::daily_calorie_goal(
                    age,
                    profile.sex,
                    weight,
                    height,
                    profile.activity_level,
                    profile.goal,
                ))
            }
        }
    }

    // ================================
    // Logs
    // ================================

    /// Append a food log entry
    ///
    /// Local insert is synchronous; the remote submission is fire-and-forget
    /// with no delivery guarantee and no idempotency key, so a retried
    /// client call can duplicate the remote entry.
    ///
    /// # Errors
    ///
    /// Returns local store failures only
    pub async fn append_food_log(&self, entry: FoodLog) -> AppResult<Uuid> {
        self.store.insert_food_log(&entry).await?;
        let remote = Arc::clone(&self.remote);
        let id = entry.id;
        tokio::spawn(async move {
            if let Err(e) = remote.push_food_log(&entry).await {
                warn!(entry_id = %entry.id, error = %e, "background food log sync failed");
            }
        });
        Ok(id)
    }

    /// Append an exercise log entry (same write policy as food logs)
    ///
    /// # Errors
    ///
    /// Returns local store failures only
    pub async fn append_exercise_log(&self, entry: ExerciseLog) -> AppResult<Uuid> {
        self.store.insert_exercise_log(&entry).await?;
        let remote = Arc::clone(&self.remote);
        let id = entry.id;
        tokio::spawn(async move {
            if let Err(e) = remote.push_exercise_log(&entry).await {
                warn!(entry_id = %entry.id, error = %e, "background exercise log sync failed");
            }
        });
        Ok(id)
    }

    /// Append a weight log entry
    ///
    /// Besides the standard write policy this refreshes the profile's
    /// current weight and recomputes the cached calorie goal, keeping the
    /// goal invariant: it is never read after a weight change without being
    /// recomputed first.
    ///
    /// # Errors
    ///
    /// Returns local store failures only
    pub async fn append_weight_log(&self, entry: WeightLog) -> AppResult<Uuid> {
        self.store.insert_weight_log(&entry).await?;

        if let Some(mut profile) = self.store.get_profile(entry.user_id).await? {
            profile.weight_kg = Some(entry.weight_kg);
            profile.updated_at = Utc::now();
            profile.daily_calorie_goal = self.resolve_daily_goal(&profile).await;
            self.store.upsert_profile(&profile).await?;
        }

        let remote = Arc::clone(&self.remote);
        let id = entry.id;
        tokio::spawn(async move {
            if let Err(e) = remote.push_weight_log(&entry).await {
                warn!(entry_id = %entry.id, error = %e, "background weight log sync failed");
            }
        });
        Ok(id)
    }

    /// Delete a log entry by id (the only mutation logs support)
    ///
    /// # Errors
    ///
    /// Returns local store failures only; the remote delete is best-effort
    pub async fn delete_log(&self, kind: LogKind, entry_id: Uuid) -> AppResult<()> {
        match kind {
            LogKind::Food => self.store.delete_food_log(entry_id).await?,
            LogKind::Exercise => self.store.delete_exercise_log(entry_id).await?,
            LogKind::Weight => self.store.delete_weight_log(entry_id).await?,
        }

        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            if let Err(e) = remote.delete_log(kind, entry_id).await {
                warn!(entry_id = %entry_id, error = %e, "background log delete sync failed");
            }
        });
        Ok(())
    }

    /// Food logs within `[start, end]`, remote-first
    ///
    /// Never raises: a remote failure degrades to local rows, and a further
    /// local failure degrades to an empty sequence.
    pub async fn query_food_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<FoodLog> {
        match self.remote.fetch_food_logs(user_id, start, end).await {
            Ok(mut entries) => {
                entries.sort_by_key(|e| e.logged_at);
                entries
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "remote food log query failed, serving local cache");
                self.store
                    .food_logs_in_range(user_id, start, end)
                    .await
                    .unwrap_or_default()
            }
        }
    }

    /// Exercise logs within `[start, end]`, remote-first, never raises
    pub async fn query_exercise_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<ExerciseLog> {
        match self.remote.fetch_exercise_logs(user_id, start, end).await {
            Ok(mut entries) => {
                entries.sort_by_key(|e| e.logged_at);
                entries
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "remote exercise log query failed, serving local cache");
                self.store
                    .exercise_logs_in_range(user_id, start, end)
                    .await
                    .unwrap_or_default()
            }
        }
    }

    /// Weight logs within `[start, end]`, remote-first, never raises
    pub async fn query_weight_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<WeightLog> {
        match self.remote.fetch_weight_logs(user_id, start, end).await {
            Ok(mut entries) => {
                entries.sort_by_key(|e| e.logged_at);
                entries
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "remote weight log query failed, serving local cache");
                self.store
                    .weight_logs_in_range(user_id, start, end)
                    .await
                    .unwrap_or_default()
            }
        }
    }

    /// Latest recorded weight, preferring the local mirror
    ///
    /// # Errors
    ///
    /// Returns local store failures
    pub async fn latest_weight(&self, user_id: Uuid) -> AppResult<Option<WeightLog>> {
        self.store.latest_weight(user_id).await
    }

    // ================================
    // Food catalogue (remote-only)
    // ================================

    /// Search the food catalogue
    ///
    /// # Errors
    ///
    /// Propagates remote failures - there is no local catalogue
    pub async fn search_foods(&self, query: &str) -> AppResult<Vec<FoodItem>> {
        self.remote.search_foods(query).await
    }

    /// Catalogue detail lookup
    ///
    /// # Errors
    ///
    /// Propagates remote failures
    pub async fn food_info(&self, food_id: &str) -> AppResult<FoodItem> {
        self.remote.food_info(food_id).await
    }

    /// Recommended foods for a goal
    ///
    /// # Errors
    ///
    /// Propagates remote failures
    pub async fn recommend_foods(&self, goal: NutritionGoal) -> AppResult<Vec<FoodItem>> {
        self.remote.recommend_foods(goal).await
    }
}
