// ABOUTME: Pure nutrition metrics engine - BMR, TDEE, calorie targets, macros, BMI
// ABOUTME: Deterministic, side-effect-free fallback for the remote goal computation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrikit Project

//! # Metrics Engine
//!
//! Evidence-based nutrition calculations. Every function is total over its
//! documented numeric domain and performs no I/O: a zero height or weight
//! yields a defined numeric result rather than an error, and input validation
//! is the caller's responsibility.
//!
//! These formulas are the **fallback path** for the remote
//! `/calculate/daily_goal` endpoint; both sides must agree on semantics, so
//! any divergence between them is a defect.
//!
//! # Scientific References
//!
//! - Mifflin, M.D., et al. (1990). A new predictive equation for resting
//!   energy expenditure. *American Journal of Clinical Nutrition*, 51(2).
//!   <https://doi.org/10.1093/ajcn/51.2.241>
//! - McArdle, W.D., et al. (2010). *Exercise Physiology* - activity factors.

use serde::{Deserialize, Serialize};

use crate::models::{ActivityLevel, NutritionGoal, Sex};

/// Kcal per gram of protein and carbohydrate
pub const KCAL_PER_G_PROTEIN_CARB: f64 = 4.0;
/// Kcal per gram of fat
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Goal-adjusted calorie target with its acceptable range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CalorieTarget {
    /// Recommended daily intake in kcal
    pub target: f64,
    /// Lower bound of the acceptable range
    pub min: f64,
    /// Upper bound of the acceptable range
    pub max: f64,
}

/// Daily macronutrient targets in grams
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MacroSplit {
    /// Protein in grams
    pub protein_g: f64,
    /// Fat in grams
    pub fat_g: f64,
    /// Carbohydrates in grams
    pub carb_g: f64,
}

/// BMI classification bands (WHO cutoffs)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    /// BMI below 18.5
    Underweight,
    /// BMI in [18.5, 25)
    Normal,
    /// BMI in [25, 30)
    Overweight,
    /// BMI of 30 or above
    Obese,
}

/// BMI value together with its classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BmiReport {
    /// Body mass index value
    pub value: f64,
    /// Classification band
    pub category: BmiCategory,
}

/// Calculate Basal Metabolic Rate using the Mifflin-St Jeor equation (1990)
///
/// `BMR = 10*weight + 6.25*height - 5*age + sex_constant` with +5 for male
/// and -161 for female; an unspecified sex uses the female constant.
#[must_use]
pub fn compute_bmr(age: u32, sex: Option<Sex>, weight_kg: f64, height_cm: f64) -> f64 {
    let sex_constant = match sex {
        Some(Sex::Male) => 5.0,
        Some(Sex::Female) | None => -161.0,
    };
    10.0f64.mul_add(
        weight_kg,
        6.25f64.mul_add(height_cm, (-5.0f64).mul_add(f64::from(age), sex_constant)),
    )
}

/// Activity factor for a level (McArdle et al. 2010)
#[must_use]
pub const fn activity_factor(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.20,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::ExtremelyActive => 1.90,
    }
}

/// Calculate Total Daily Energy Expenditure
///
/// `TDEE = BMR * activity factor`. An unrecognized activity level never
/// reaches this function: parsing maps it to `LightlyActive` (1.375), the
/// documented default rather than an error.
#[must_use]
pub fn compute_tdee(bmr: f64, activity_level: ActivityLevel) -> f64 {
    bmr * activity_factor(activity_level)
}

/// Goal-adjusted calorie target around a TDEE
///
/// - lose weight: target = TDEE - 500, range [TDEE - 750, TDEE - 250]
/// - gain muscle: target = TDEE + 300, range [TDEE + 200, TDEE + 500]
/// - maintain (and any unrecognized goal): target = TDEE, range +/- 100
#[must_use]
pub fn goal_calories(tdee: f64, goal: NutritionGoal) -> CalorieTarget {
    match goal {
        NutritionGoal::LoseWeight => CalorieTarget {
            target: tdee - 500.0,
            min: tdee - 750.0,
            max: tdee - 250.0,
        },
        NutritionGoal::GainMuscle => CalorieTarget {
            target: tdee + 300.0,
            min: tdee + 200.0,
            max: tdee + 500.0,
        },
        NutritionGoal::MaintainWeight => CalorieTarget {
            target: tdee,
            min: tdee - 100.0,
            max: tdee + 100.0,
        },
    }
}

/// Convenience: BMR -> TDEE -> goal target in one step
#[must_use]
pub fn daily_calorie_goal(
    age: u32,
    sex: Option<Sex>,
    weight_kg: f64,
    height_cm: f64,
    activity_level: ActivityLevel,
    goal: NutritionGoal,
) -> f64 {
    let bmr = compute_bmr(age, sex, weight_kg, height_cm);
    let tdee = compute_tdee(bmr, activity_level);
    goal_calories(tdee, goal).target
}

/// Body mass index: `weight / (height_m)^2`
///
/// Total over the numeric domain: a zero height yields `0.0`, not a panic
/// or an infinity surfaced to callers.
#[must_use]
pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    if height_cm <= 0.0 {
        return 0.0;
    }
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Classify a BMI value into its WHO band
#[must_use]
pub fn classify_bmi(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

/// BMI value plus classification, as shown on profile screens
#[must_use]
pub fn bmi_report(weight_kg: f64, height_cm: f64) -> BmiReport {
    let value = compute_bmi(weight_kg, height_cm);
    BmiReport {
        value,
        category: classify_bmi(value),
    }
}

/// Macronutrient ratio triple (protein, fat, carb fractions of calories)
const fn macro_ratios(goal: NutritionGoal) -> (f64, f64, f64) {
    match goal {
        NutritionGoal::LoseWeight => (0.35, 0.25, 0.40),
        NutritionGoal::GainMuscle => (0.30, 0.25, 0.45),
        NutritionGoal::MaintainWeight => (0.25, 0.30, 0.45),
    }
}

/// Distribute daily calories into macro gram targets
///
/// Ratios are keyed by goal; a female profile shifts 0.05 of the carb ratio
/// onto fat before converting. Grams use 4 kcal/g for protein and carbs and
/// 9 kcal/g for fat, so the grams re-convert to the input calories within
/// rounding tolerance.
#[must_use]
pub fn compute_macros(calories: f64, goal: NutritionGoal, sex: Option<Sex>) -> MacroSplit {
    let (protein_ratio, mut fat_ratio, mut carb_ratio) = macro_ratios(goal);
    if sex == Some(Sex::Female) {
        fat_ratio += 0.05;
        carb_ratio -= 0.05;
    }
    MacroSplit {
        protein_g: calories * protein_ratio / KCAL_PER_G_PROTEIN_CARB,
        fat_g: calories * fat_ratio / KCAL_PER_G_FAT,
        carb_g: calories * carb_ratio / KCAL_PER_G_PROTEIN_CARB,
    }
}
