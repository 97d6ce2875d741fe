//! Core domain types for fitlog.
//!
//! This module defines the fundamental types used throughout the system:
//! - Nutrient profiles, catalog foods and logged meal items
//! - Per-day meal logs keyed by meal slot
//! - Macro targets, biometrics and the per-user target profile
//! - The daily log streams (hydration, nutrition, exercise, sleep, check-ins)
//! - The combined per-date progress view

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Energy densities and rounding
// ============================================================================

/// Energy density of protein (kcal per gram)
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;

/// Energy density of carbohydrate (kcal per gram)
pub const KCAL_PER_G_CARBS: f64 = 4.0;

/// Energy density of fat (kcal per gram)
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Round to one decimal place. Every persisted nutrient value goes through this.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Non-finite values count as zero in every aggregate.
pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Accepts a number or a numeric string; anything else degrades to 0.0.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.map(finite_or_zero).unwrap_or(0.0))
}

// ============================================================================
// Nutrients
// ============================================================================

/// A single nutrient quantity tracked by the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Macro {
    Calories,
    Protein,
    Carbs,
    Fats,
    Fiber,
}

impl Macro {
    pub const ALL: [Macro; 5] = [
        Macro::Calories,
        Macro::Protein,
        Macro::Carbs,
        Macro::Fats,
        Macro::Fiber,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            Macro::Calories => "kcal",
            _ => "g",
        }
    }
}

impl fmt::Display for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Macro::Calories => "calories",
            Macro::Protein => "protein",
            Macro::Carbs => "carbs",
            Macro::Fats => "fats",
            Macro::Fiber => "fiber",
        };
        f.pad(name)
    }
}

impl FromStr for Macro {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "calories" | "kcal" => Ok(Macro::Calories),
            "protein" => Ok(Macro::Protein),
            "carbs" | "carbohydrates" => Ok(Macro::Carbs),
            "fats" | "fat" => Ok(Macro::Fats),
            "fiber" | "fibre" => Ok(Macro::Fiber),
            _ => Err(Error::Validation(format!("Unknown macro '{}'", s))),
        }
    }
}

/// Calories and macronutrients for one quantity of food
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientProfile {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fats: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fiber: f64,
}

impl NutrientProfile {
    /// Value of one nutrient; a non-finite field reads as 0.
    pub fn get(&self, nutrient: Macro) -> f64 {
        let raw = match nutrient {
            Macro::Calories => self.calories,
            Macro::Protein => self.protein,
            Macro::Carbs => self.carbs,
            Macro::Fats => self.fats,
            Macro::Fiber => self.fiber,
        };
        finite_or_zero(raw)
    }

    /// Every field multiplied by `factor` and rounded to one decimal.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: round1(self.calories * factor),
            protein: round1(self.protein * factor),
            carbs: round1(self.carbs * factor),
            fats: round1(self.fats * factor),
            fiber: round1(self.fiber * factor),
        }
    }
}

impl Add for NutrientProfile {
    type Output = NutrientProfile;

    fn add(self, other: NutrientProfile) -> NutrientProfile {
        NutrientProfile {
            calories: self.get(Macro::Calories) + other.get(Macro::Calories),
            protein: self.get(Macro::Protein) + other.get(Macro::Protein),
            carbs: self.get(Macro::Carbs) + other.get(Macro::Carbs),
            fats: self.get(Macro::Fats) + other.get(Macro::Fats),
            fiber: self.get(Macro::Fiber) + other.get(Macro::Fiber),
        }
    }
}

// ============================================================================
// Catalog and meal log types
// ============================================================================

/// A food definition from the catalog; nutrients are per `serving_size`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodEntry {
    pub name: String,
    pub category: String,
    pub serving_size: f64,
    pub serving_unit: String,
    #[serde(flatten)]
    pub nutrients: NutrientProfile,
}

/// Meal grouping within a day
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner];
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
        };
        f.write_str(name)
    }
}

impl FromStr for MealSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealSlot::Breakfast),
            "lunch" => Ok(MealSlot::Lunch),
            "dinner" => Ok(MealSlot::Dinner),
            _ => Err(Error::Validation(format!(
                "Invalid meal slot '{}'. Must be one of: Breakfast, Lunch, Dinner",
                s
            ))),
        }
    }
}

/// A food added to a meal, scaled to the chosen quantity
///
/// `baseline` keeps the catalog's per-serving values so that quantity edits
/// always rescale from the catalog numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggedMealItem {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub serving_size: f64,
    #[serde(default)]
    pub serving_unit: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(flatten)]
    pub nutrients: NutrientProfile,
    pub baseline: NutrientProfile,
}

/// All meal items logged by one user on one date
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyMealLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub meals: BTreeMap<MealSlot, Vec<LoggedMealItem>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Targets and biometrics
// ============================================================================

/// Daily calorie and macro budget (whole kcal / grams)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTarget {
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
}

impl MacroTarget {
    /// Budget for one nutrient; fiber has no target.
    pub fn get(&self, nutrient: Macro) -> Option<f64> {
        match nutrient {
            Macro::Calories => Some(self.calories as f64),
            Macro::Protein => Some(self.protein as f64),
            Macro::Carbs => Some(self.carbs as f64),
            Macro::Fats => Some(self.fats as f64),
            Macro::Fiber => None,
        }
    }
}

/// Where the active target came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSource {
    Computed,
    Custom,
    Fallback,
}

impl fmt::Display for TargetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetSource::Computed => "computed",
            TargetSource::Custom => "custom",
            TargetSource::Fallback => "default",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = Error;

    /// Anything that is not recognisably male or female maps to `Other`.
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => Gender::Other,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
}

impl FromStr for ActivityLevel {
    type Err = Error;

    /// Unrecognised levels fall back to sedentary.
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_lowercase().as_str() {
            "light" => ActivityLevel::Light,
            "moderate" => ActivityLevel::Moderate,
            "active" => ActivityLevel::Active,
            _ => ActivityLevel::Sedentary,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Cut,
    Maintain,
    Bulk,
}

impl FromStr for Goal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cut" => Ok(Goal::Cut),
            "maintain" => Ok(Goal::Maintain),
            "bulk" => Ok(Goal::Bulk),
            _ => Err(Error::Validation(format!(
                "Invalid goal '{}'. Must be one of: cut, maintain, bulk",
                s
            ))),
        }
    }
}

/// Inputs to the target calculation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserBiometrics {
    pub age: f64,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity: ActivityLevel,
    pub goal: Goal,
}

/// Per-user target state: biometrics plus computed and custom targets
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroProfile {
    #[serde(default)]
    pub biometrics: Option<UserBiometrics>,
    #[serde(default)]
    pub computed: Option<MacroTarget>,
    #[serde(default)]
    pub custom: Option<MacroTarget>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Daily log streams
// ============================================================================

/// Records that belong to a single calendar date
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HydrationLog {
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub amount_ml: f64,
    #[serde(default)]
    pub creatine: bool,
}

/// Day totals of the nutrition ledger
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NutritionLog {
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fats: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SetDetail {
    pub set: u32,
    pub reps: u32,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight_kg: f64,
}

/// One exercise performed in a workout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseLog {
    pub id: Uuid,
    pub date: NaiveDate,
    pub workout: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    pub exercise: String,
    #[serde(default)]
    pub sets: Vec<SetDetail>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub intensity: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SleepLog {
    pub date: NaiveDate,
    pub sleep_time: NaiveTime,
    pub wake_time: NaiveTime,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration_hours: f64,
    pub quality: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Step count for one day against that day's goal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub steps: u32,
    #[serde(default = "default_step_goal")]
    pub goal: u32,
}

fn default_step_goal() -> u32 {
    crate::wellness::DEFAULT_STEP_GOAL
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub weight_kg: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub chest_cm: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub waist_cm: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub arms_cm: f64,
}

/// Weekly body-measurement check-in
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub date: NaiveDate,
    pub measurements: BodyMeasurements,
    pub mood: u8,
    pub energy: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

macro_rules! impl_dated {
    ($($ty:ty),* $(,)?) => {
        $(impl Dated for $ty {
            fn date(&self) -> NaiveDate {
                self.date
            }
        })*
    };
}

impl_dated!(
    DailyMealLog,
    HydrationLog,
    NutritionLog,
    ExerciseLog,
    SleepLog,
    StepLog,
    CheckIn,
);

// ============================================================================
// Combined view
// ============================================================================

/// Everything logged on one date, assembled for the progress view
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CombinedDayRecord {
    pub date: NaiveDate,
    pub hydration: Option<HydrationLog>,
    pub nutrition: Option<NutritionLog>,
    pub exercises: Vec<ExerciseLog>,
    pub sleep: Option<SleepLog>,
}

impl Dated for CombinedDayRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}
