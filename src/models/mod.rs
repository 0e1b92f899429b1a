// ABOUTME: Core data models for profiles, logs, time ranges, and progress snapshots
// ABOUTME: Typed structs with a documented drop-null-fields serialization policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! # Data Models
//!
//! Core data structures shared by the repository and the aggregator.
//!
//! ## Design Principles
//!
//! - **Typed payloads**: profile and log data are explicit structs, not JSON maps
//! - **Optional means absent**: every `Option` field serializes with
//!   `skip_serializing_if = "Option::is_none"`, so callers never see `null` keys
//! - **Append-only logs**: log entries are immutable once written; the only
//!   mutation is an explicit id-based delete

use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

/// Biological sex used for BMR and macro calculations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    /// Male (+5 Mifflin-St Jeor constant)
    Male,
    /// Female (-161 Mifflin-St Jeor constant)
    Female,
}

impl Display for Sex {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
        }
    }
}

impl FromStr for Sex {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            _ => Err(AppError::invalid_input(format!("Invalid sex: {s}"))),
        }
    }
}

/// Activity level for TDEE calculation
///
/// The underscored spelling (`lightly_active`) is the canonical wire form.
/// Parsing also accepts the legacy space-separated spelling seen in old
/// payloads, and never fails: an unrecognized level maps to `LightlyActive`,
/// matching the documented TDEE fallback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Exercise 1-3 days/week
    #[default]
    LightlyActive,
    /// Exercise 3-5 days/week
    ModeratelyActive,
    /// Exercise 6-7 days/week
    VeryActive,
    /// Hard training twice a day
    ExtremelyActive,
}

impl ActivityLevel {
    /// Canonical wire spelling
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::LightlyActive => "lightly_active",
            Self::ModeratelyActive => "moderately_active",
            Self::VeryActive => "very_active",
            Self::ExtremelyActive => "extremely_active",
        }
    }
}

impl Display for ActivityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().replace(' ', "_").as_str() {
            "sedentary" => Self::Sedentary,
            "moderately_active" => Self::ModeratelyActive,
            "very_active" => Self::VeryActive,
            "extremely_active" | "extra_active" => Self::ExtremelyActive,
            // "lightly_active" and anything unrecognized
            _ => Self::LightlyActive,
        })
    }
}

/// Nutrition goal driving calorie targets and macro distribution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NutritionGoal {
    /// Caloric deficit (-500 kcal/day from TDEE)
    LoseWeight,
    /// Caloric balance
    #[default]
    MaintainWeight,
    /// Caloric surplus (+300 kcal/day over TDEE)
    GainMuscle,
}

impl NutritionGoal {
    /// Canonical wire spelling
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LoseWeight => "lose_weight",
            Self::MaintainWeight => "maintain_weight",
            Self::GainMuscle => "gain_muscle",
        }
    }
}

impl Display for NutritionGoal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NutritionGoal {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().replace(' ', "_").as_str() {
            "lose_weight" => Self::LoseWeight,
            "gain_muscle" => Self::GainMuscle,
            // "maintain_weight" and anything unrecognized
            _ => Self::MaintainWeight,
        })
    }
}

/// A user profile as seen by the client core
///
/// One live record per identity (`username`/`email` unique). Optional fields
/// absent from the remote payload stay `None` and are never serialized as
/// `null` (the sanitization policy callers rely on).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Unique user identifier
    pub id: Uuid,
    /// Unique username
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Age in years
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Biological sex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// Height in centimeters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    /// Weight in kilograms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// Activity level for TDEE
    #[serde(default)]
    pub activity_level: ActivityLevel,
    /// Nutrition goal
    #[serde(default)]
    pub goal: NutritionGoal,
    /// Derived daily calorie goal, cached on the profile.
    /// Must be recomputed whenever weight, height, activity level, or goal
    /// changes, before it is read again.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_goal: Option<f64>,
    /// UI theme preference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Whether onboarding has been completed
    #[serde(default)]
    pub onboarding_complete: bool,
    /// When the profile was created
    pub created_at: DateTime<Utc>,
    /// When the profile was last modified locally (last-write-wins ordering)
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a new profile with defaults for everything but identity
    #[must_use]
    pub fn new(username: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            age: None,
            sex: None,
            height_cm: None,
            weight_kg: None,
            activity_level: ActivityLevel::default(),
            goal: NutritionGoal::default(),
            daily_calorie_goal: None,
            theme: None,
            onboarding_complete: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the profile carries enough demographics for goal computation
    #[must_use]
    pub const fn has_goal_inputs(&self) -> bool {
        self.age.is_some() && self.height_cm.is_some() && self.weight_kg.is_some()
    }
}

/// A partial profile update applied through the repository
///
/// Only set fields are applied; the repository recomputes the cached
/// `daily_calorie_goal` when the patch touches a goal input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    /// New age
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// New sex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    /// New height in centimeters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    /// New weight in kilograms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    /// New activity level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    /// New nutrition goal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<NutritionGoal>,
    /// New theme preference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Onboarding completion flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_complete: Option<bool>,
}

impl ProfilePatch {
    /// Whether this patch touches a field that feeds the calorie-goal formula
    #[must_use]
    pub const fn touches_goal_inputs(&self) -> bool {
        self.weight_kg.is_some()
            || self.height_cm.is_some()
            || self.activity_level.is_some()
            || self.goal.is_some()
    }

    /// Apply the set fields onto a profile, stamping `updated_at`
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(age) = self.age {
            profile.age = Some(age);
        }
        if let Some(sex) = self.sex {
            profile.sex = Some(sex);
        }
        if let Some(height) = self.height_cm {
            profile.height_cm = Some(height);
        }
        if let Some(weight) = self.weight_kg {
            profile.weight_kg = Some(weight);
        }
        if let Some(level) = self.activity_level {
            profile.activity_level = level;
        }
        if let Some(goal) = self.goal {
            profile.goal = goal;
        }
        if let Some(theme) = &self.theme {
            profile.theme = Some(theme.clone());
        }
        if let Some(done) = self.onboarding_complete {
            profile.onboarding_complete = done;
        }
        profile.updated_at = Utc::now();
    }
}

/// Strip `null` values from a remote JSON object before deserialization
///
/// The remote service surfaces unset fields as explicit `null`s; the client
/// contract is that absent and null are indistinguishable, so nulls are
/// dropped (recursively for nested objects) rather than stored.
#[must_use]
pub fn sanitize_json(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, sanitize_json(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(sanitize_json).collect())
        }
        other => other,
    }
}

/// Kind discriminator for log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// Food intake log
    Food,
    /// Exercise session log
    Exercise,
    /// Body weight log
    Weight,
}

impl Display for LogKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Food => write!(f, "food"),
            Self::Exercise => write!(f, "exercise"),
            Self::Weight => write!(f, "weight"),
        }
    }
}

/// A logged food entry (append-only, immutable once written)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodLog {
    /// Unique entry identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Food name as logged
    pub name: String,
    /// Energy in kcal
    pub calories: f64,
    /// Protein in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    /// Carbohydrates in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
    /// Fat in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    /// When the entry was logged
    pub logged_at: DateTime<Utc>,
}

/// A logged exercise session (append-only, immutable once written)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLog {
    /// Unique entry identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Exercise name as logged
    pub name: String,
    /// Duration in minutes
    pub duration_min: f64,
    /// Estimated energy burned in kcal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories_burned: Option<f64>,
    /// When the entry was logged
    pub logged_at: DateTime<Utc>,
}

/// A logged body-weight measurement (append-only, immutable once written)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightLog {
    /// Unique entry identifier
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// When the entry was logged
    pub logged_at: DateTime<Utc>,
}

/// A food catalogue entry returned by search/info/recommend lookups
///
/// Remote-only data; never persisted locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    /// Catalogue identifier
    pub id: String,
    /// Food name
    pub name: String,
    /// Energy per 100 g in kcal
    pub calories_per_100g: f64,
    /// Protein per 100 g in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_g: Option<f64>,
    /// Carbohydrates per 100 g in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs_g: Option<f64>,
    /// Fat per 100 g in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat_g: Option<f64>,
    /// Suggested serving description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving: Option<String>,
}

/// The bucketing window over which logs are aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TimeRange {
    /// Midnight of the current day up to now
    Daily,
    /// Most recent Monday plus six days (exactly 7 calendar days)
    Weekly,
    /// First through last day of the current month
    Monthly,
    /// Explicit bounds; `start <= end` is validated before any fetch
    Custom {
        /// Inclusive start of the window
        start: DateTime<Utc>,
        /// Inclusive end of the window
        end: DateTime<Utc>,
    },
}

impl TimeRange {
    /// Resolve the range to concrete `[start, end]` bounds relative to `now`
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimeRange` for a custom range with `end < start`.
    /// Validation happens here, before any network or cache access.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        match *self {
            Self::Daily => Ok((start_of_day(now.date_naive()), now)),
            Self::Weekly => {
                let monday = now.date_naive()
                    - ChronoDuration::days(i64::from(now.weekday().num_days_from_monday()));
                Ok((start_of_day(monday), end_of_day(monday + ChronoDuration::days(6))))
            }
            Self::Monthly => {
                let first = now.date_naive().with_day(1).unwrap_or(now.date_naive());
                let last = last_day_of_month(first);
                Ok((start_of_day(first), end_of_day(last)))
            }
            Self::Custom { start, end } => {
                if end < start {
                    return Err(AppError::invalid_time_range(format!(
                        "custom range end {end} precedes start {start}"
                    )));
                }
                Ok((start, end))
            }
        }
    }

    /// Stable key fragment used for snapshot caching
    #[must_use]
    pub fn cache_key(&self) -> String {
        match *self {
            Self::Daily => "daily".into(),
            Self::Weekly => "weekly".into(),
            Self::Monthly => "monthly".into(),
            Self::Custom { start, end } => {
                format!("custom:{}:{}", start.timestamp(), end.timestamp())
            }
        }
    }
}

impl Display for TimeRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.cache_key())
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map_or_else(|| DateTime::<Utc>::MIN_UTC, |dt| dt.and_utc())
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59)
        .map_or_else(|| DateTime::<Utc>::MAX_UTC, |dt| dt.and_utc())
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let (next_year, next_month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(first)
}

/// A computed `{current, goal, percentage}` triple for one tracked metric
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricSnapshot {
    /// Accumulated value over the range
    pub current: f64,
    /// Target value for the range
    pub goal: f64,
    /// `clamp(current / goal, 0, 1)` when `goal > 0`, else `0.0`
    pub percentage: f64,
    /// Display unit (kcal, min, steps, ml)
    pub unit: String,
}

impl MetricSnapshot {
    /// Build a snapshot, applying the percentage rule
    ///
    /// Total over all inputs: a zero or negative goal yields `percentage = 0`
    /// rather than a division error or NaN.
    #[must_use]
    pub fn new(current: f64, goal: f64, unit: impl Into<String>) -> Self {
        let percentage = if goal > 0.0 {
            (current / goal).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            current,
            goal,
            percentage,
            unit: unit.into(),
        }
    }

    /// A zeroed snapshot used when a metric source fails
    #[must_use]
    pub fn degraded(goal: f64, unit: impl Into<String>) -> Self {
        Self::new(0.0, goal, unit)
    }
}

/// Aggregated progress for one `(user, range)` request
///
/// Ephemeral and derived; recomputed on demand and cached with an explicit
/// generation timestamp. Freshness policy is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressData {
    /// Requested range
    pub range: TimeRange,
    /// Resolved inclusive start of the window
    pub range_start: DateTime<Utc>,
    /// Resolved inclusive end of the window
    pub range_end: DateTime<Utc>,
    /// Calories consumed vs. daily calorie goal
    pub calories: MetricSnapshot,
    /// Exercise minutes vs. exercise goal
    pub exercise: MetricSnapshot,
    /// Steps vs. step goal
    pub steps: MetricSnapshot,
    /// Water intake vs. hydration goal
    pub water: MetricSnapshot,
    /// When this snapshot was assembled
    pub generated_at: DateTime<Utc>,
}
