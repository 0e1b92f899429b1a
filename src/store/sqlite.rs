// ABOUTME: SQLite implementation of the local store using sqlx
// ABOUTME: Inline migrations for users, food_logs, exercise_logs, weight_logs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

use super::LocalStore;
use crate::errors::{AppError, AppResult};
use crate::models::{
    ActivityLevel, ExerciseLog, FoodLog, NutritionGoal, Sex, UserProfile, WeightLog,
};

/// SQLite-backed local store
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    fn parse_uuid(raw: &str) -> AppResult<Uuid> {
        Uuid::parse_str(raw).map_err(|e| AppError::database(format!("corrupt uuid column: {e}")))
    }

    fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| AppError::database(format!("corrupt timestamp column: {e}")))
    }

    fn profile_from_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<UserProfile> {
        let id: String = row.try_get("id")?;
        let sex: Option<String> = row.try_get("sex")?;
        let activity_level: String = row.try_get("activity_level")?;
        let goal: String = row.try_get("goal")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(UserProfile {
            id: Self::parse_uuid(&id)?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            age: row.try_get::<Option<i64>, _>("age")?.map(|v| v as u32),
            sex: sex.as_deref().and_then(|s| Sex::from_str(s).ok()),
            height_cm: row.try_get("height_cm")?,
            weight_kg: row.try_get("weight_kg")?,
            // Infallible parses: unknown spellings fall back to defaults
            activity_level: ActivityLevel::from_str(&activity_level)
                .unwrap_or_default(),
            goal: NutritionGoal::from_str(&goal).unwrap_or_default(),
            daily_calorie_goal: row.try_get("daily_calorie_goal")?,
            theme: row.try_get("theme")?,
            onboarding_complete: row.try_get("onboarding_complete")?,
            created_at: Self::parse_timestamp(&created_at)?,
            updated_at: Self::parse_timestamp(&updated_at)?,
        })
    }

    fn food_log_from_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<FoodLog> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let logged_at: String = row.try_get("logged_at")?;
        Ok(FoodLog {
            id: Self::parse_uuid(&id)?,
            user_id: Self::parse_uuid(&user_id)?,
            name: row.try_get("name")?,
            calories: row.try_get("calories")?,
            protein_g: row.try_get("protein_g")?,
            carbs_g: row.try_get("carbs_g")?,
            fat_g: row.try_get("fat_g")?,
            logged_at: Self::parse_timestamp(&logged_at)?,
        })
    }

    fn exercise_log_from_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<ExerciseLog> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let logged_at: String = row.try_get("logged_at")?;
        Ok(ExerciseLog {
            id: Self::parse_uuid(&id)?,
            user_id: Self::parse_uuid(&user_id)?,
            name: row.try_get("name")?,
            duration_min: row.try_get("duration_min")?,
            calories_burned: row.try_get("calories_burned")?,
            logged_at: Self::parse_timestamp(&logged_at)?,
        })
    }

    fn weight_log_from_row(row: &sqlx::sqlite::SqliteRow) -> AppResult<WeightLog> {
        let id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let logged_at: String = row.try_get("logged_at")?;
        Ok(WeightLog {
            id: Self::parse_uuid(&id)?,
            user_id: Self::parse_uuid(&user_id)?,
            weight_kg: row.try_get("weight_kg")?,
            logged_at: Self::parse_timestamp(&logged_at)?,
        })
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn new(database_url: &str) -> AppResult<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:")
            && !database_url.contains("memory")
            && !database_url.contains('?')
        {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_owned()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                age INTEGER,
                sex TEXT,
                height_cm REAL,
                weight_kg REAL,
                activity_level TEXT NOT NULL DEFAULT 'lightly_active',
                goal TEXT NOT NULL DEFAULT 'maintain_weight',
                daily_calorie_goal REAL,
                theme TEXT,
                onboarding_complete BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS food_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                calories REAL NOT NULL,
                protein_g REAL,
                carbs_g REAL,
                fat_g REAL,
                logged_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS exercise_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                duration_min REAL NOT NULL,
                calories_burned REAL,
                logged_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS weight_logs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                weight_kg REAL NOT NULL,
                logged_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        for table in ["food_logs", "exercise_logs", "weight_logs"] {
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_user_time ON {table}(user_id, logged_at)"
            ))
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (
                id, username, email, age, sex, height_cm, weight_kg,
                activity_level, goal, daily_calorie_goal, theme,
                onboarding_complete, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                email = excluded.email,
                age = excluded.age,
                sex = excluded.sex,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                activity_level = excluded.activity_level,
                goal = excluded.goal,
                daily_calorie_goal = excluded.daily_calorie_goal,
                theme = excluded.theme,
                onboarding_complete = excluded.onboarding_complete,
                updated_at = excluded.updated_at
            ",
        )
        .bind(profile.id.to_string())
        .bind(&profile.username)
        .bind(&profile.email)
        .bind(profile.age.map(i64::from))
        .bind(profile.sex.map(|s| s.to_string()))
        .bind(profile.height_cm)
        .bind(profile.weight_kg)
        .bind(profile.activity_level.as_str())
        .bind(profile.goal.as_str())
        .bind(profile.daily_calorie_goal)
        .bind(&profile.theme)
        .bind(profile.onboarding_complete)
        .bind(profile.created_at.to_rfc3339())
        .bind(profile.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::profile_from_row).transpose()
    }

    async fn get_profile_by_email(&self, email: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::profile_from_row).transpose()
    }

    async fn delete_profile(&self, user_id: Uuid) -> AppResult<()> {
        let id = user_id.to_string();
        // SQLite foreign_keys pragma is off by default; delete logs explicitly
        for table in ["food_logs", "exercise_logs", "weight_logs"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE user_id = ?1"))
                .bind(&id)
                .execute(&self.pool)
                .await?;
        }
        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(&id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_food_log(&self, entry: &FoodLog) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO food_logs (id, user_id, name, calories, protein_g, carbs_g, fat_g, logged_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(&entry.name)
        .bind(entry.calories)
        .bind(entry.protein_g)
        .bind(entry.carbs_g)
        .bind(entry.fat_g)
        .bind(entry.logged_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_exercise_log(&self, entry: &ExerciseLog) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO exercise_logs (id, user_id, name, duration_min, calories_burned, logged_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(&entry.name)
        .bind(entry.duration_min)
        .bind(entry.calories_burned)
        .bind(entry.logged_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_weight_log(&self, entry: &WeightLog) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO weight_logs (id, user_id, weight_kg, logged_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(entry.id.to_string())
        .bind(entry.user_id.to_string())
        .bind(entry.weight_kg)
        .bind(entry.logged_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn food_logs_in_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<FoodLog>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM food_logs
            WHERE user_id = ?1 AND logged_at >= ?2 AND logged_at <= ?3
            ORDER BY logged_at ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::food_log_from_row).collect()
    }

    async fn exercise_logs_in_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<ExerciseLog>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM exercise_logs
            WHERE user_id = ?1 AND logged_at >= ?2 AND logged_at <= ?3
            ORDER BY logged_at ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::exercise_log_from_row).collect()
    }

    async fn weight_logs_in_range(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<WeightLog>> {
        let rows = sqlx::query(
            r"
            SELECT * FROM weight_logs
            WHERE user_id = ?1 AND logged_at >= ?2 AND logged_at <= ?3
            ORDER BY logged_at ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(start.to_rfc3339())
        .bind(end.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::weight_log_from_row).collect()
    }

    async fn latest_weight(&self, user_id: Uuid) -> AppResult<Option<WeightLog>> {
        let row = sqlx::query(
            "SELECT * FROM weight_logs WHERE user_id = ?1 ORDER BY logged_at DESC LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::weight_log_from_row).transpose()
    }

    async fn delete_food_log(&self, entry_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM food_logs WHERE id = ?1")
            .bind(entry_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_exercise_log(&self, entry_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM exercise_logs WHERE id = ?1")
            .bind(entry_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_weight_log(&self, entry_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM weight_logs WHERE id = ?1")
            .bind(entry_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
