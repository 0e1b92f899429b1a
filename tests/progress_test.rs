// ABOUTME: Integration tests for ProgressAggregator snapshot assembly and caching
// ABOUTME: Covers fetch-once caching, forced refresh, range validation, partial failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};

use common::{create_test_aggregator, food_entry, test_profile, MockRemote, MockSteps, MockWater};
use nutrikit_core::errors::ErrorCode;
use nutrikit_core::models::TimeRange;

#[tokio::test]
async fn test_daily_snapshot_assembles_all_metrics() -> Result<()> {
    let mut profile = test_profile();
    profile.daily_calorie_goal = Some(2000.0);
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    remote
        .food_logs
        .lock()
        .unwrap()
        .push(food_entry(user_id, 500.0, Utc::now()));

    let steps = Arc::new(MockSteps::returning(4_000.0));
    let water = Arc::new(MockWater::returning(1_000.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    let progress = aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;

    assert!((progress.calories.current - 500.0).abs() < f64::EPSILON);
    assert!((progress.calories.goal - 2000.0).abs() < f64::EPSILON);
    assert!((progress.calories.percentage - 0.25).abs() < 1e-9);
    assert_eq!(progress.calories.unit, "kcal");

    assert!((progress.steps.current - 4_000.0).abs() < f64::EPSILON);
    assert!((progress.steps.percentage - 0.4).abs() < 1e-9);

    assert!((progress.water.current - 1_000.0).abs() < f64::EPSILON);
    assert!((progress.water.percentage - 0.5).abs() < 1e-9);

    assert!((progress.exercise.current - 0.0).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn test_consecutive_calls_fetch_at_most_once() -> Result<()> {
    let mut profile = test_profile();
    profile.daily_calorie_goal = Some(2000.0);
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    let steps = Arc::new(MockSteps::returning(100.0));
    let water = Arc::new(MockWater::returning(200.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    let first = aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;
    let fetches_after_first = remote.total_fetches();
    let step_calls_after_first = steps.calls.load(Ordering::SeqCst);

    let second = aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;

    // Identical snapshot, and no further source queries
    assert_eq!(first, second);
    assert_eq!(remote.total_fetches(), fetches_after_first);
    assert_eq!(steps.calls.load(Ordering::SeqCst), step_calls_after_first);
    Ok(())
}

#[tokio::test]
async fn test_force_refresh_always_refetches() -> Result<()> {
    let mut profile = test_profile();
    profile.daily_calorie_goal = Some(2000.0);
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    let steps = Arc::new(MockSteps::returning(100.0));
    let water = Arc::new(MockWater::returning(200.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;
    let step_calls_after_first = steps.calls.load(Ordering::SeqCst);

    aggregator
        .get_progress_data(user_id, TimeRange::Daily, true)
        .await?;

    // A valid cached snapshot exists, but force_refresh bypasses it
    assert_eq!(
        steps.calls.load(Ordering::SeqCst),
        step_calls_after_first + 1
    );
    Ok(())
}

#[tokio::test]
async fn test_invalid_custom_range_rejected_before_any_fetch() {
    let profile = test_profile();
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    let steps = Arc::new(MockSteps::returning(100.0));
    let water = Arc::new(MockWater::returning(200.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    let start = Utc::now();
    let end = start - ChronoDuration::hours(2);
    let err = aggregator
        .get_progress_data(user_id, TimeRange::Custom { start, end }, true)
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidTimeRange);
    assert_eq!(remote.total_fetches(), 0);
    assert_eq!(steps.calls.load(Ordering::SeqCst), 0);
    assert_eq!(water.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failing_steps_source_degrades_to_zero_only() -> Result<()> {
    let mut profile = test_profile();
    profile.daily_calorie_goal = Some(2000.0);
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    remote
        .food_logs
        .lock()
        .unwrap()
        .push(food_entry(user_id, 750.0, Utc::now()));

    let steps = Arc::new(MockSteps::failing());
    let water = Arc::new(MockWater::returning(500.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    let progress = aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;

    // The failing metric degrades to zero; the rest are populated
    assert!((progress.steps.current - 0.0).abs() < f64::EPSILON);
    assert!((progress.steps.percentage - 0.0).abs() < f64::EPSILON);
    assert!((progress.calories.current - 750.0).abs() < f64::EPSILON);
    assert!((progress.water.current - 500.0).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn test_weekly_snapshot_scales_goals_over_seven_days() -> Result<()> {
    let mut profile = test_profile();
    profile.daily_calorie_goal = Some(2000.0);
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    let steps = Arc::new(MockSteps::returning(35_000.0));
    let water = Arc::new(MockWater::returning(7_000.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    let progress = aggregator
        .get_progress_data(user_id, TimeRange::Weekly, false)
        .await?;

    // Weekly window covers exactly seven calendar days
    let days =
        (progress.range_end.date_naive() - progress.range_start.date_naive()).num_days() + 1;
    assert_eq!(days, 7);

    assert!((progress.calories.goal - 14_000.0).abs() < f64::EPSILON);
    assert!((progress.steps.goal - 70_000.0).abs() < f64::EPSILON);
    assert!((progress.steps.percentage - 0.5).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_caches_are_range_scoped() -> Result<()> {
    let mut profile = test_profile();
    profile.daily_calorie_goal = Some(2000.0);
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    let steps = Arc::new(MockSteps::returning(100.0));
    let water = Arc::new(MockWater::returning(200.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;
    let step_calls_after_daily = steps.calls.load(Ordering::SeqCst);

    // A different range is a different cache key and must fetch
    aggregator
        .get_progress_data(user_id, TimeRange::Weekly, false)
        .await?;
    assert_eq!(
        steps.calls.load(Ordering::SeqCst),
        step_calls_after_daily + 1
    );
    Ok(())
}

#[tokio::test]
async fn test_invalidate_user_drops_cached_snapshots() -> Result<()> {
    let mut profile = test_profile();
    profile.daily_calorie_goal = Some(2000.0);
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    let steps = Arc::new(MockSteps::returning(100.0));
    let water = Arc::new(MockWater::returning(200.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;
    let dropped = aggregator.invalidate_user(user_id).await?;
    assert_eq!(dropped, 1);

    let step_calls_before = steps.calls.load(Ordering::SeqCst);
    aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;
    assert_eq!(steps.calls.load(Ordering::SeqCst), step_calls_before + 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_profile_degrades_calorie_goal_to_zero() -> Result<()> {
    // No profile anywhere: the calorie goal degrades to zero and the
    // percentage rule stays total
    let remote = Arc::new(MockRemote::default());
    let steps = Arc::new(MockSteps::returning(100.0));
    let water = Arc::new(MockWater::returning(200.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    let progress = aggregator
        .get_progress_data(uuid::Uuid::new_v4(), TimeRange::Daily, false)
        .await?;

    assert!((progress.calories.goal - 0.0).abs() < f64::EPSILON);
    assert!((progress.calories.percentage - 0.0).abs() < f64::EPSILON);
    assert!(progress.calories.percentage.is_finite());
    Ok(())
}

#[tokio::test]
async fn test_goal_resolution_inside_snapshot_uses_engine_fallback() -> Result<()> {
    // Profile lacks a stored goal and the remote goal endpoint is down:
    // the aggregator's calorie goal comes from the engine formulas
    let profile = test_profile();
    let user_id = profile.id;

    let remote = Arc::new(MockRemote::with_profile(profile));
    let steps = Arc::new(MockSteps::returning(100.0));
    let water = Arc::new(MockWater::returning(200.0));
    let aggregator =
        create_test_aggregator(Arc::clone(&remote), Arc::clone(&steps), Arc::clone(&water)).await;

    let progress = aggregator
        .get_progress_data(user_id, TimeRange::Daily, false)
        .await?;

    // BMR 1320.25 * 1.375 (lightly active) - 500 (lose weight)
    assert!((progress.calories.goal - 1315.34375).abs() < 1e-4);
    Ok(())
}
