// ABOUTME: Shared test utilities - scripted mock remote, collaborators, setup helpers
// ABOUTME: Provides call-count instrumentation for fetch-at-most-once assertions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project
#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

//! Shared test utilities for `nutrikit_core`

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use nutrikit_core::cache::{memory::InMemoryCache, CacheConfig, CacheProvider};
use nutrikit_core::errors::{AppError, AppResult};
use nutrikit_core::models::{
    ExerciseLog, FoodItem, FoodLog, LogKind, NutritionGoal, ProfilePatch, Sex, UserProfile,
    WeightLog,
};
use nutrikit_core::progress::{ProgressAggregator, ProgressGoals, StepsProvider, WaterSource};
use nutrikit_core::remote::{DailyGoalRequest, LoginRequest, RegisterRequest, RemoteApi};
use nutrikit_core::repository::ProfileRepository;
use nutrikit_core::store::{sqlite::SqliteStore, LocalStore};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard in-memory store setup
pub async fn create_test_store() -> SqliteStore {
    init_test_logging();
    SqliteStore::new("sqlite::memory:").await.unwrap()
}

/// Cache with background cleanup disabled (avoids runtime conflicts in tests)
pub async fn create_test_cache() -> InMemoryCache {
    let config = CacheConfig {
        max_entries: 100,
        cleanup_interval: std::time::Duration::from_secs(300),
        enable_background_cleanup: false,
    };
    InMemoryCache::new(config).await.unwrap()
}

/// A profile with full demographics (age 25, female, 60 kg, 161 cm)
///
/// BMR for these inputs is exactly 1320.25 kcal/day, which keeps goal
/// assertions readable.
pub fn test_profile() -> UserProfile {
    let mut profile = UserProfile::new("ada".into(), "ada@example.com".into());
    profile.age = Some(25);
    profile.sex = Some(Sex::Female);
    profile.height_cm = Some(161.0);
    profile.weight_kg = Some(60.0);
    profile.goal = NutritionGoal::LoseWeight;
    profile
}

pub fn food_entry(user_id: Uuid, calories: f64, at: DateTime<Utc>) -> FoodLog {
    FoodLog {
        id: Uuid::new_v4(),
        user_id,
        name: "oatmeal".into(),
        calories,
        protein_g: Some(10.0),
        carbs_g: Some(50.0),
        fat_g: Some(6.0),
        logged_at: at,
    }
}

pub fn exercise_entry(user_id: Uuid, minutes: f64, at: DateTime<Utc>) -> ExerciseLog {
    ExerciseLog {
        id: Uuid::new_v4(),
        user_id,
        name: "running".into(),
        duration_min: minutes,
        calories_burned: Some(minutes * 9.5),
        logged_at: at,
    }
}

pub fn weight_entry(user_id: Uuid, weight_kg: f64, at: DateTime<Utc>) -> WeightLog {
    WeightLog {
        id: Uuid::new_v4(),
        user_id,
        weight_kg,
        logged_at: at,
    }
}

/// Scripted remote service with per-endpoint call counters
///
/// Reads fail wholesale when `fail_reads` is set; writes when `fail_writes`
/// is. A `remote_goal` of `None` makes `/calculate/daily_goal` unavailable so
/// tests can force the engine fallback.
#[derive(Default)]
pub struct MockRemote {
    pub profile: Mutex<Option<UserProfile>>,
    pub food_logs: Mutex<Vec<FoodLog>>,
    pub exercise_logs: Mutex<Vec<ExerciseLog>>,
    pub weight_logs: Mutex<Vec<WeightLog>>,
    pub catalogue: Mutex<Vec<FoodItem>>,
    pub remote_goal: Mutex<Option<f64>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,

    pub fetch_user_calls: AtomicUsize,
    pub fetch_log_calls: AtomicUsize,
    pub goal_calls: AtomicUsize,
    pub update_user_calls: AtomicUsize,
    pub push_log_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MockRemote {
    pub fn with_profile(profile: UserProfile) -> Self {
        let mock = Self::default();
        *mock.profile.lock().unwrap() = Some(profile);
        mock
    }

    /// Total idempotent read fetches issued against the remote
    pub fn total_fetches(&self) -> usize {
        self.fetch_user_calls.load(Ordering::SeqCst)
            + self.fetch_log_calls.load(Ordering::SeqCst)
            + self.goal_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn read_gate(&self) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::unreachable("mock remote offline"));
        }
        Ok(())
    }

    fn write_gate(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::server_rejected(500, "mock remote rejected write"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteApi for MockRemote {
    async fn login(&self, request: &LoginRequest) -> AppResult<UserProfile> {
        self.read_gate()?;
        self.profile
            .lock()
            .unwrap()
            .clone()
            .filter(|p| p.username == request.username || p.email == request.username)
            .ok_or_else(|| AppError::server_rejected(401, "bad credentials"))
    }

    async fn register(&self, request: &RegisterRequest) -> AppResult<UserProfile> {
        self.write_gate()?;
        let profile = UserProfile::new(request.username.clone(), request.email.clone());
        *self.profile.lock().unwrap() = Some(profile.clone());
        Ok(profile)
    }

    async fn delete_user(&self, _user_id: Uuid) -> AppResult<()> {
        self.write_gate()?;
        *self.profile.lock().unwrap() = None;
        Ok(())
    }

    async fn change_password(
        &self,
        _user_id: Uuid,
        _old_password: &str,
        _new_password: &str,
    ) -> AppResult<()> {
        self.write_gate()
    }

    async fn change_email(&self, _user_id: Uuid, new_email: &str) -> AppResult<()> {
        self.write_gate()?;
        if let Some(profile) = self.profile.lock().unwrap().as_mut() {
            profile.email = new_email.to_owned();
        }
        Ok(())
    }

    async fn fetch_user(&self, user_id: Uuid) -> AppResult<UserProfile> {
        self.fetch_user_calls.fetch_add(1, Ordering::SeqCst);
        self.read_gate()?;
        self.profile
            .lock()
            .unwrap()
            .clone()
            .filter(|p| p.id == user_id)
            .ok_or_else(|| AppError::not_found(format!("user {user_id}")))
    }

    async fn update_user(&self, _user_id: Uuid, patch: &ProfilePatch) -> AppResult<()> {
        self.update_user_calls.fetch_add(1, Ordering::SeqCst);
        self.write_gate()?;
        if let Some(profile) = self.profile.lock().unwrap().as_mut() {
            patch.apply_to(profile);
        }
        Ok(())
    }

    async fn push_food_log(&self, entry: &FoodLog) -> AppResult<()> {
        self.push_log_calls.fetch_add(1, Ordering::SeqCst);
        self.write_gate()?;
        self.food_logs.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn push_exercise_log(&self, entry: &ExerciseLog) -> AppResult<()> {
        self.push_log_calls.fetch_add(1, Ordering::SeqCst);
        self.write_gate()?;
        self.exercise_logs.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn push_weight_log(&self, entry: &WeightLog) -> AppResult<()> {
        self.push_log_calls.fetch_add(1, Ordering::SeqCst);
        self.write_gate()?;
        self.weight_logs.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn delete_log(&self, _kind: LogKind, entry_id: Uuid) -> AppResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.write_gate()?;
        self.food_logs.lock().unwrap().retain(|e| e.id != entry_id);
        self.exercise_logs
            .lock()
            .unwrap()
            .retain(|e| e.id != entry_id);
        self.weight_logs
            .lock()
            .unwrap()
            .retain(|e| e.id != entry_id);
        Ok(())
    }

    async fn fetch_food_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<FoodLog>> {
        self.fetch_log_calls.fetch_add(1, Ordering::SeqCst);
        self.read_gate()?;
        Ok(self
            .food_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && e.logged_at >= start && e.logged_at <= end)
            .cloned()
            .collect())
    }

    async fn fetch_exercise_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ExerciseLog>> {
        self.fetch_log_calls.fetch_add(1, Ordering::SeqCst);
        self.read_gate()?;
        Ok(self
            .exercise_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && e.logged_at >= start && e.logged_at <= end)
            .cloned()
            .collect())
    }

    async fn fetch_weight_logs(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<WeightLog>> {
        self.fetch_log_calls.fetch_add(1, Ordering::SeqCst);
        self.read_gate()?;
        Ok(self
            .weight_logs
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id && e.logged_at >= start && e.logged_at <= end)
            .cloned()
            .collect())
    }

    async fn calculate_daily_goal(&self, _request: &DailyGoalRequest) -> AppResult<f64> {
        self.goal_calls.fetch_add(1, Ordering::SeqCst);
        self.read_gate()?;
        self.remote_goal
            .lock()
            .unwrap()
            .ok_or_else(|| AppError::unreachable("goal endpoint disabled"))
    }

    async fn search_foods(&self, query: &str) -> AppResult<Vec<FoodItem>> {
        self.read_gate()?;
        Ok(self
            .catalogue
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.name.to_lowercase().contains(&query.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn food_info(&self, food_id: &str) -> AppResult<FoodItem> {
        self.read_gate()?;
        self.catalogue
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == food_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("food {food_id}")))
    }

    async fn recommend_foods(&self, _goal: NutritionGoal) -> AppResult<Vec<FoodItem>> {
        self.read_gate()?;
        Ok(self.catalogue.lock().unwrap().clone())
    }
}

/// Steps collaborator with a switchable failure mode
pub struct MockSteps {
    pub steps: f64,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockSteps {
    pub fn returning(steps: f64) -> Self {
        Self {
            steps,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            steps: 0.0,
            fail: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StepsProvider for MockSteps {
    async fn steps_in_range(
        &self,
        _user_id: Uuid,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> AppResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::unreachable("health platform offline"));
        }
        Ok(self.steps)
    }
}

/// Water collaborator with a switchable failure mode
pub struct MockWater {
    pub water_ml: f64,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl MockWater {
    pub fn returning(water_ml: f64) -> Self {
        Self {
            water_ml,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WaterSource for MockWater {
    async fn water_ml_in_range(
        &self,
        _user_id: Uuid,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> AppResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::unreachable("water source offline"));
        }
        Ok(self.water_ml)
    }
}

/// Repository over an in-memory store and the given mock remote
pub async fn create_test_repository(
    remote: Arc<MockRemote>,
) -> ProfileRepository<SqliteStore, MockRemote> {
    let store = create_test_store().await;
    ProfileRepository::new(store, remote)
}

/// Fully wired aggregator with default per-day goals
pub async fn create_test_aggregator(
    remote: Arc<MockRemote>,
    steps: Arc<MockSteps>,
    water: Arc<MockWater>,
) -> ProgressAggregator<SqliteStore, MockRemote, InMemoryCache> {
    let repository = create_test_repository(remote).await;
    let cache = create_test_cache().await;
    ProgressAggregator::new(repository, steps, water, cache, ProgressGoals::default())
}
