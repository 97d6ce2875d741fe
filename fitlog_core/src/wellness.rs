//! Hydration, sleep, step, exercise and weekly check-in helpers.

use crate::types::{
    round1, BodyMeasurements, CheckIn, ExerciseLog, HydrationLog, SetDetail, SleepLog, StepLog,
};
use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Millilitres of water recommended per kg of body weight
pub const WATER_ML_PER_KG: f64 = 30.0;

/// Extra water recommended while supplementing creatine
pub const CREATINE_EXTRA_ML: f64 = 500.0;

pub const DEFAULT_STEP_GOAL: u32 = 10_000;

// ============================================================================
// Hydration
// ============================================================================

pub fn recommended_water_ml(weight_kg: f64, creatine: bool) -> Result<f64> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(Error::Validation(format!(
            "Body weight must be a positive number (got {})",
            weight_kg
        )));
    }
    let extra = if creatine { CREATINE_EXTRA_ML } else { 0.0 };
    Ok(weight_kg * WATER_ML_PER_KG + extra)
}

/// Progress of a day's intake towards the goal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GoalStatus {
    Met,
    Halfway,
    Low,
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GoalStatus::Met => "goal met",
            GoalStatus::Halfway => "halfway",
            GoalStatus::Low => "low",
        };
        f.write_str(label)
    }
}

pub fn goal_status(amount_ml: f64, goal_ml: f64) -> GoalStatus {
    if amount_ml >= goal_ml {
        GoalStatus::Met
    } else if amount_ml >= goal_ml / 2.0 {
        GoalStatus::Halfway
    } else {
        GoalStatus::Low
    }
}

impl HydrationLog {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            amount_ml: 0.0,
            creatine: false,
        }
    }

    /// Add a drink to the day's total
    pub fn add_intake(&mut self, amount_ml: f64) -> Result<f64> {
        if !amount_ml.is_finite() || amount_ml <= 0.0 {
            return Err(Error::Validation(format!(
                "Water amount must be greater than 0 ml (got {})",
                amount_ml
            )));
        }
        self.amount_ml = round1(self.amount_ml + amount_ml);
        Ok(self.amount_ml)
    }

    /// Millilitres still needed to reach `goal_ml`, never negative
    pub fn remaining_ml(&self, goal_ml: f64) -> f64 {
        (goal_ml - self.amount_ml).max(0.0)
    }
}

// ============================================================================
// Sleep
// ============================================================================

/// Hours between falling asleep and waking, wrapping past midnight
pub fn sleep_duration_hours(sleep_time: NaiveTime, wake_time: NaiveTime) -> f64 {
    let hours = (wake_time - sleep_time).num_minutes() as f64 / 60.0;
    if hours < 0.0 {
        hours + 24.0
    } else {
        hours
    }
}

impl SleepLog {
    pub fn new(
        date: NaiveDate,
        sleep_time: NaiveTime,
        wake_time: NaiveTime,
        quality: u8,
        notes: Option<String>,
    ) -> Result<Self> {
        if !(1..=5).contains(&quality) {
            return Err(Error::Validation(format!(
                "Sleep quality must be between 1 and 5 (got {})",
                quality
            )));
        }
        Ok(Self {
            date,
            sleep_time,
            wake_time,
            duration_hours: round1(sleep_duration_hours(sleep_time, wake_time)),
            quality,
            notes,
        })
    }
}

// ============================================================================
// Steps
// ============================================================================

impl StepLog {
    pub fn new(date: NaiveDate, steps: u32, goal: u32) -> Result<Self> {
        if goal == 0 {
            return Err(Error::Validation(
                "Step goal must be greater than 0".into(),
            ));
        }
        Ok(Self { date, steps, goal })
    }

    pub fn remaining(&self) -> u32 {
        self.goal.saturating_sub(self.steps)
    }

    pub fn status(&self) -> GoalStatus {
        goal_status(f64::from(self.steps), f64::from(self.goal))
    }
}

// ============================================================================
// Exercise
// ============================================================================

impl ExerciseLog {
    pub fn new(
        date: NaiveDate,
        workout: impl Into<String>,
        exercise: impl Into<String>,
        sets: Vec<SetDetail>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            workout: workout.into(),
            region: None,
            level: None,
            exercise: exercise.into(),
            sets,
            tag: None,
            intensity: None,
        }
    }

    pub fn with_intensity(mut self, intensity: u8) -> Result<Self> {
        if !(1..=5).contains(&intensity) {
            return Err(Error::Validation(format!(
                "Intensity must be between 1 and 5 (got {})",
                intensity
            )));
        }
        self.intensity = Some(intensity);
        Ok(self)
    }

    /// Sum of reps × weight over all sets
    pub fn total_volume(&self) -> f64 {
        self.sets
            .iter()
            .map(|s| f64::from(s.reps) * crate::types::finite_or_zero(s.weight_kg))
            .sum()
    }
}

/// Build numbered sets from a list of `(reps, weight)` pairs
pub fn number_sets(pairs: &[(u32, f64)]) -> Vec<SetDetail> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (reps, weight_kg))| SetDetail {
            set: i as u32 + 1,
            reps: *reps,
            weight_kg: *weight_kg,
        })
        .collect()
}

// ============================================================================
// Weekly check-ins
// ============================================================================

fn validate_rating(field: &str, value: u8) -> Result<u8> {
    if !(1..=10).contains(&value) {
        return Err(Error::Validation(format!(
            "{} must be between 1 and 10 (got {})",
            field, value
        )));
    }
    Ok(value)
}

fn validate_measurement(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Validation(format!(
            "{} must be a non-negative number (got {})",
            field, value
        )));
    }
    Ok(())
}

impl CheckIn {
    pub fn new(
        date: NaiveDate,
        measurements: BodyMeasurements,
        mood: u8,
        energy: u8,
        notes: Option<String>,
    ) -> Result<Self> {
        validate_measurement("Weight", measurements.weight_kg)?;
        validate_measurement("Chest", measurements.chest_cm)?;
        validate_measurement("Waist", measurements.waist_cm)?;
        validate_measurement("Arms", measurements.arms_cm)?;
        Ok(Self {
            date,
            measurements,
            mood: validate_rating("Mood", mood)?,
            energy: validate_rating("Energy", energy)?,
            notes,
        })
    }
}

/// The Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday();
    date - Duration::days(i64::from(offset))
}

/// Latest check-in of each week, oldest week first
pub fn latest_per_week(check_ins: &[CheckIn]) -> Vec<CheckIn> {
    let mut weeks: BTreeMap<NaiveDate, &CheckIn> = BTreeMap::new();
    for check_in in check_ins {
        let week = weeks.entry(week_start(check_in.date)).or_insert(check_in);
        if check_in.date >= week.date {
            *week = check_in;
        }
    }
    weeks.into_values().cloned().collect()
}

/// One-line change summary between consecutive check-ins
pub fn summarize_change(current: &CheckIn, previous: Option<&CheckIn>) -> String {
    let Some(previous) = previous else {
        return String::new();
    };

    let weight = current.measurements.weight_kg - previous.measurements.weight_kg;
    let arms = current.measurements.arms_cm - previous.measurements.arms_cm;
    format!(
        "Weight {} by {} kg. Arms {} {} cm.",
        if weight >= 0.0 { "increased" } else { "decreased" },
        round1(weight.abs()),
        if arms >= 0.0 { "up" } else { "down" },
        round1(arms.abs()),
    )
}
