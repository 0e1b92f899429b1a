// ABOUTME: Integration tests for the SQLite local store
// ABOUTME: Covers migrations, range queries, ordering, and cascade deletes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

#![allow(clippy::unwrap_used)]

mod common;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};

use common::{create_test_store, exercise_entry, food_entry, test_profile, weight_entry};
use nutrikit_core::store::{sqlite::SqliteStore, LocalStore};

#[tokio::test]
async fn test_on_disk_database_is_created() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("nutrikit-test.db");
    let url = format!("sqlite:{}", db_path.display());

    let store = SqliteStore::new(&url).await?;
    let profile = test_profile();
    store.upsert_profile(&profile).await?;

    assert!(db_path.exists());
    assert!(store.get_profile(profile.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_range_query_filters_and_orders() -> Result<()> {
    let store = create_test_store().await;
    let profile = test_profile();
    store.upsert_profile(&profile).await?;

    let now = Utc::now();
    let inside_late = food_entry(profile.id, 300.0, now - ChronoDuration::hours(1));
    let inside_early = food_entry(profile.id, 200.0, now - ChronoDuration::hours(3));
    let outside = food_entry(profile.id, 900.0, now - ChronoDuration::days(2));

    store.insert_food_log(&inside_late).await?;
    store.insert_food_log(&inside_early).await?;
    store.insert_food_log(&outside).await?;

    let logs = store
        .food_logs_in_range(profile.id, now - ChronoDuration::hours(6), now)
        .await?;

    assert_eq!(logs.len(), 2);
    // Ordered by timestamp ascending
    assert_eq!(logs[0].id, inside_early.id);
    assert_eq!(logs[1].id, inside_late.id);
    Ok(())
}

#[tokio::test]
async fn test_range_query_is_user_scoped() -> Result<()> {
    let store = create_test_store().await;
    let ada = test_profile();
    let mut grace = test_profile();
    grace.id = uuid::Uuid::new_v4();
    grace.username = "grace".into();
    grace.email = "grace@example.com".into();
    store.upsert_profile(&ada).await?;
    store.upsert_profile(&grace).await?;

    let now = Utc::now();
    store
        .insert_exercise_log(&exercise_entry(ada.id, 30.0, now))
        .await?;
    store
        .insert_exercise_log(&exercise_entry(grace.id, 60.0, now))
        .await?;

    let logs = store
        .exercise_logs_in_range(ada.id, now - ChronoDuration::hours(1), now)
        .await?;
    assert_eq!(logs.len(), 1);
    assert!((logs[0].duration_min - 30.0).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn test_latest_weight_picks_most_recent() -> Result<()> {
    let store = create_test_store().await;
    let profile = test_profile();
    store.upsert_profile(&profile).await?;

    let now = Utc::now();
    store
        .insert_weight_log(&weight_entry(profile.id, 61.0, now - ChronoDuration::days(7)))
        .await?;
    store
        .insert_weight_log(&weight_entry(profile.id, 59.5, now - ChronoDuration::days(1)))
        .await?;

    let latest = store.latest_weight(profile.id).await?.unwrap();
    assert!((latest.weight_kg - 59.5).abs() < f64::EPSILON);
    Ok(())
}

#[tokio::test]
async fn test_delete_profile_removes_logs() -> Result<()> {
    let store = create_test_store().await;
    let profile = test_profile();
    store.upsert_profile(&profile).await?;

    let now = Utc::now();
    store
        .insert_food_log(&food_entry(profile.id, 100.0, now))
        .await?;
    store
        .insert_weight_log(&weight_entry(profile.id, 60.0, now))
        .await?;

    store.delete_profile(profile.id).await?;

    assert!(store.get_profile(profile.id).await?.is_none());
    let logs = store
        .food_logs_in_range(profile.id, now - ChronoDuration::hours(1), now)
        .await?;
    assert!(logs.is_empty());
    assert!(store.latest_weight(profile.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_upsert_is_last_write_wins() -> Result<()> {
    let store = create_test_store().await;
    let mut profile = test_profile();
    store.upsert_profile(&profile).await?;

    profile.weight_kg = Some(58.0);
    profile.updated_at = Utc::now();
    store.upsert_profile(&profile).await?;

    let loaded = store.get_profile(profile.id).await?.unwrap();
    assert_eq!(loaded.weight_kg, Some(58.0));
    Ok(())
}

#[tokio::test]
async fn test_delete_single_log_entry() -> Result<()> {
    let store = create_test_store().await;
    let profile = test_profile();
    store.upsert_profile(&profile).await?;

    let now = Utc::now();
    let keep = food_entry(profile.id, 100.0, now);
    let remove = food_entry(profile.id, 200.0, now);
    store.insert_food_log(&keep).await?;
    store.insert_food_log(&remove).await?;

    store.delete_food_log(remove.id).await?;

    let logs = store
        .food_logs_in_range(profile.id, now - ChronoDuration::hours(1), now)
        .await?;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].id, keep.id);
    Ok(())
}
