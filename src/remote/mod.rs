// ABOUTME: Remote service abstraction - the authoritative nutrition API contract
// ABOUTME: RemoteApi trait plus request/response payload types and shared HTTP client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! # Remote Service
//!
//! The authoritative backend the repository reconciles against, JSON over
//! HTTPS. The trait seam lets tests substitute a scripted mock and assert
//! fetch call counts without a network.

/// HTTP implementation of the remote contract
pub mod client;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::{
    ActivityLevel, ExerciseLog, FoodItem, FoodLog, LogKind, NutritionGoal, ProfilePatch, Sex,
    UserProfile, WeightLog,
};

pub use client::{shared_client, HttpRemoteClient};

/// Credentials for `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    /// Plaintext password (TLS-protected; never stored locally)
    pub password: String,
}

/// Payload for `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Desired unique username
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Plaintext password (TLS-protected; never stored locally)
    pub password: String,
}

/// Payload for `POST /calculate/daily_goal`
///
/// Field spellings follow the canonical underscored wire contract
/// (`lightly_active`), the same one the engine fallback agrees on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyGoalRequest {
    /// Age in years
    pub age: u32,
    /// Biological sex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Weight in kilograms
    pub weight: f64,
    /// Height in centimeters
    pub height: f64,
    /// Activity level (canonical underscored spelling)
    pub activity_level: ActivityLevel,
    /// Nutrition goal
    pub goal: NutritionGoal,
}

/// Response for `POST /calculate/daily_goal`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyGoalResponse {
    /// Server-computed daily calorie goal in kcal
    pub daily_calorie_goal: f64,
}

/// Remote service contract
///
/// Reads are idempotent GET-style calls and run under the timeout-with-
/// one-retry policy; writes are single-attempt so a transport failure never
/// duplicates a remote side effect on its own. (A *client-level* retry of a
/// log append can still duplicate an entry: there is no idempotency key.)
#[async_trait]
pub trait RemoteApi: Send + Sync {
    // ================================
    // Accounts (critical path)
    // ================================

    /// Authenticate and return the server-side profile
    ///
    /// # Errors
    ///
    /// Propagates `ServerRejected`/`Unreachable`/`Timeout` - login is a
    /// critical operation with no local fallback
    async fn login(&self, request: &LoginRequest) -> AppResult<UserProfile>;

    /// Create an account and return the initial profile
    ///
    /// # Errors
    ///
    /// Propagates remote failures - registration is a critical operation
    async fn register(&self, request: &RegisterRequest) -> AppResult<UserProfile>;

    /// Permanently delete the account
    ///
    /// # Errors
    ///
    /// Propagates remote failures - the local cache is only cleared after
    /// remote confirmation
    async fn delete_user(&self, user_id: Uuid) -> AppResult<()>;

    /// Change the account password
    ///
    /// # Errors
    ///
    /// Propagates remote failures (critical operation)
    async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()>;

    /// Change the account email
    ///
    /// # Errors
    ///
    /// Propagates remote failures (critical operation)
    async fn change_email(&self, user_id: Uuid, new_email: &str) -> AppResult<()>;

    // ================================
    // Profile
    // ================================

    /// Fetch the authoritative profile (`GET /user/{id}`)
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, `Unreachable`/`Timeout` on
    /// transport failure (absorbed by the repository's cache fallback)
    async fn fetch_user(&self, user_id: Uuid) -> AppResult<UserProfile>;

    /// Patch the profile (`PUT /user/{id}`, best-effort from the repository)
    ///
    /// # Errors
    ///
    /// Returns remote failures; the repository logs and drops them on the
    /// non-critical write-behind path
    async fn update_user(&self, user_id: Uuid, patch: &ProfilePatch) -> AppResult<()>;

    // ================================
    // Logs
    // ================================

    /// Append a food log (`POST /log/food`)
    ///
    /// # Errors
    ///
    /// Returns remote failures (dropped by the fire-and-forget caller)
    async fn push_food_log(&self, entry: &FoodLog) -> AppResult<()>;

    /// Append an exercise log (`POST /log/exercise`)
    ///
    /// # Errors
    ///
    /// Returns remote failures (dropped by the fire-and-forget caller)
    async fn push_exercise_log(&self, entry: &ExerciseLog) -> AppResult<()>;

    /// Append a weight log (`POST /log/weight`)
    ///
    /// # Errors
    ///
    /// Returns remote failures (dropped by the fire-and-forget caller)
    async fn push_weight_log(&self, entry: &WeightLog) -> AppResult<()>;

    /// Delete a log entry by id (`DELETE /log/{kind}/{id}`)
    ///
    /// # Errors
    ///
    /// Returns remote failures (dropped by the fire-and-forget caller)
    async fn delete_log(&self, kind: LogKind, entry_id: Uuid) -> AppResult<()>;

    /// Date-filtered food logs (`GET /log/food`)
    ///
    /// # Errors
    ///
    /// Returns transport failures (the repository degrades to local rows)
    async fn fetch_food_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<FoodLog>>;

    /// Date-filtered exercise logs (`GET /log/exercise`)
    ///
    /// # Errors
    ///
    /// Returns transport failures (the repository degrades to local rows)
    async fn fetch_exercise_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ExerciseLog>>;

    /// Date-filtered weight logs (`GET /log/weight`)
    ///
    /// # Errors
    ///
    /// Returns transport failures (the repository degrades to local rows)
    async fn fetch_weight_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<WeightLog>>;

    // ================================
    // Goal computation (primary path)
    // ================================

    /// Server-side daily calorie goal (`POST /calculate/daily_goal`)
    ///
    /// The primary path; the engine formulas are the fallback and both
    /// must agree on semantics.
    ///
    /// # Errors
    ///
    /// Returns remote failures (the repository falls back to the engine)
    async fn calculate_daily_goal(&self, request: &DailyGoalRequest) -> AppResult<f64>;

    // ================================
    // Food catalogue
    // ================================

    /// Search the food catalogue (`GET /foods/search`)
    ///
    /// # Errors
    ///
    /// Propagates remote failures - there is no local catalogue fallback
    async fn search_foods(&self, query: &str) -> AppResult<Vec<FoodItem>>;

    /// Catalogue detail lookup (`GET /foods/info`)
    ///
    /// # Errors
    ///
    /// Propagates remote failures, `NotFound` for an unknown id
    async fn food_info(&self, food_id: &str) -> AppResult<FoodItem>;

    /// Recommended foods for a goal (`GET /foods/recommend`)
    ///
    /// # Errors
    ///
    /// Propagates remote failures
    async fn recommend_foods(&self, goal: NutritionGoal) -> AppResult<Vec<FoodItem>>;
}
