// ABOUTME: ProgressAggregator - turns per-metric logs into time-ranged progress snapshots
// ABOUTME: Concurrent four-way fan-out with snapshot caching and forced refresh
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! # Progress Aggregator
//!
//! Produces one [`ProgressData`] snapshot per `(user, TimeRange)` request.
//!
//! The aggregator is a pure function of its inputs plus repository state at
//! call time: freshness is tracked by the caller through the snapshot's
//! `generated_at` stamp and the explicit force-refresh flag; there is no
//! background refresh timer. The four metric reads are independent and run
//! concurrently; a failing source degrades its own metric to zero without
//! failing the request. If the caller abandons a request, in-flight work may
//! still complete and populate the cache, but the original caller never
//! observes it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{CacheKey, CacheProvider, CacheResource};
use crate::errors::AppResult;
use crate::models::{MetricSnapshot, ProgressData, TimeRange};
use crate::remote::RemoteApi;
use crate::repository::ProfileRepository;
use crate::store::LocalStore;

/// External health-platform collaborator supplying step counts
#[async_trait]
pub trait StepsProvider: Send + Sync {
    /// Steps recorded within `[start, end]`
    ///
    /// # Errors
    ///
    /// Returns an error when the platform is unavailable; the aggregator
    /// degrades the steps metric to zero
    async fn steps_in_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<f64>;
}

/// Collaborator supplying water intake totals
#[async_trait]
pub trait WaterSource: Send + Sync {
    /// Water intake in milliliters within `[start, end]`
    ///
    /// # Errors
    ///
    /// Returns an error when the source is unavailable; the aggregator
    /// degrades the water metric to zero
    async fn water_ml_in_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<f64>;
}

/// Per-day targets for the non-calorie metrics
///
/// Range goals scale linearly with the number of calendar days covered, so a
/// weekly snapshot tracks seven days' worth of each target.
#[derive(Debug, Clone, Copy)]
pub struct ProgressGoals {
    /// Exercise minutes per day
    pub exercise_min_per_day: f64,
    /// Steps per day
    pub steps_per_day: f64,
    /// Water intake per day in milliliters
    pub water_ml_per_day: f64,
}

impl Default for ProgressGoals {
    fn default() -> Self {
        Self {
            exercise_min_per_day: 30.0,
            steps_per_day: 10_000.0,
            water_ml_per_day: 2_000.0,
        }
    }
}

/// Aggregates repository and collaborator data into progress snapshots
pub struct ProgressAggregator<S, R, C>
where
    S: LocalStore + 'static,
    R: RemoteApi + ?Sized + 'static,
    C: CacheProvider,
{
    repository: ProfileRepository<S, R>,
    steps: Arc<dyn StepsProvider>,
    water: Arc<dyn WaterSource>,
    cache: C,
    goals: ProgressGoals,
}

impl<S, R, C> ProgressAggregator<S, R, C>
where
    S: LocalStore + 'static,
    R: RemoteApi + ?Sized + 'static,
    C: CacheProvider,
{
    /// Create an aggregator over the repository and external collaborators
    pub fn new(
        repository: ProfileRepository<S, R>,
        steps: Arc<dyn StepsProvider>,
        water: Arc<dyn WaterSource>,
        cache: C,
        goals: ProgressGoals,
    ) -> Self {
        Self {
            repository,
            steps,
            water,
            cache,
            goals,
        }
    }

    /// Produce the progress snapshot for `(user, range)`
    ///
    /// With `force_refresh = false` a cached snapshot for the exact key is
    /// returned without re-querying any source; `force_refresh = true`
    /// always re-fetches. Range validation happens before any fetch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimeRange` for a custom range with `end < start`.
    /// Individual metric-source failures do not fail the request.
    pub async fn get_progress_data(
        &self,
        user_id: Uuid,
        range: TimeRange,
        force_refresh: bool,
    ) -> AppResult<ProgressData> {
        // Reject invalid ranges before any network or cache access
        let (start, end) = range.resolve(Utc::now())?;

        let key = CacheKey::new(
            user_id,
            CacheResource::Progress {
                range_key: range.cache_key(),
            },
        );

        if !force_refresh {
            match self.cache.get::<ProgressData>(&key).await {
                Ok(Some(snapshot)) => {
                    debug!(user_id = %user_id, range = %range, "progress snapshot served from cache");
                    return Ok(snapshot);
                }
                Ok(None) => {}
                Err(e) => warn!(user_id = %user_id, error = %e, "progress cache read failed"),
            }
        }

        let days = day_count(start, end);

        // Independent reads, fan-out / fan-in
        let (calories, exercise, steps, water) = tokio::join!(
            self.calorie_snapshot(user_id, start, end, days),
            self.exercise_snapshot(user_id, start, end, days),
            self.steps_snapshot(user_id, start, end, days),
            self.water_snapshot(user_id, start, end, days),
        );

        let snapshot = ProgressData {
            range,
            range_start: start,
            range_end: end,
            calories,
            exercise,
            steps,
            water,
            generated_at: Utc::now(),
        };

        let ttl = key.resource.recommended_ttl();
        if let Err(e) = self.cache.set(&key, &snapshot, ttl).await {
            warn!(user_id = %user_id, error = %e, "progress cache write failed");
        }

        Ok(snapshot)
    }

    /// Drop every cached snapshot for a user (e.g. after a profile change)
    ///
    /// # Errors
    ///
    /// Returns cache backend failures
    pub async fn invalidate_user(&self, user_id: Uuid) -> AppResult<u64> {
        self.cache.invalidate_user(user_id).await
    }

    /// Calories consumed vs. the profile's daily calorie goal
    async fn calorie_snapshot(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        days: f64,
    ) -> MetricSnapshot {
        let consumed: f64 = self
            .repository
            .query_food_logs(user_id, start, end)
            .await
            .iter()
            .map(|entry| entry.calories)
            .sum();

        let daily_goal = match self.repository.get_user_data(user_id).await {
            Ok(profile) => match profile.daily_calorie_goal {
                Some(goal) => goal,
                None => self
                    .repository
                    .resolve_daily_goal(&profile)
                    .await
                    .unwrap_or(0.0),
            },
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "calorie goal unavailable, degrading to zero");
                0.0
            }
        };

        MetricSnapshot::new(consumed, daily_goal * days, "kcal")
    }

    /// Exercise minutes summed over the range
    async fn exercise_snapshot(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        days: f64,
    ) -> MetricSnapshot {
        let minutes: f64 = self
            .repository
            .query_exercise_logs(user_id, start, end)
            .await
            .iter()
            .map(|entry| entry.duration_min)
            .sum();

        MetricSnapshot::new(minutes, self.goals.exercise_min_per_day * days, "min")
    }

    /// Step count from the external health collaborator
    async fn steps_snapshot(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        days: f64,
    ) -> MetricSnapshot {
        let goal = self.goals.steps_per_day * days;
        match self.steps.steps_in_range(user_id, start, end).await {
            Ok(steps) => MetricSnapshot::new(steps, goal, "steps"),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "steps source failed, degrading to zero");
                MetricSnapshot::degraded(goal, "steps")
            }
        }
    }

    /// Water intake from its collaborator
    async fn water_snapshot(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        days: f64,
    ) -> MetricSnapshot {
        let goal = self.goals.water_ml_per_day * days;
        match self.water.water_ml_in_range(user_id, start, end).await {
            Ok(ml) => MetricSnapshot::new(ml, goal, "ml"),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "water source failed, degrading to zero");
                MetricSnapshot::degraded(goal, "ml")
            }
        }
    }
}

/// Calendar days covered by `[start, end]`, inclusive, at least one
fn day_count(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let days = (end.date_naive() - start.date_naive()).num_days() + 1;
    days.max(1) as f64
}
