//! Per-date merge of the daily log streams.

use crate::types::{
    CombinedDayRecord, Dated, ExerciseLog, HydrationLog, NutritionLog, SleepLog,
};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

fn record_for(
    days: &mut BTreeMap<NaiveDate, CombinedDayRecord>,
    date: NaiveDate,
) -> &mut CombinedDayRecord {
    days.entry(date).or_insert_with(|| CombinedDayRecord {
        date,
        hydration: None,
        nutrition: None,
        exercises: Vec::new(),
        sleep: None,
    })
}

/// Merge the four log streams into one record per date, newest first.
///
/// For hydration, nutrition and sleep the first record of a date wins;
/// every exercise of a date is kept, in input order. Dates with no entry
/// in any stream produce no record.
pub fn build_combined_log(
    hydration: &[HydrationLog],
    nutrition: &[NutritionLog],
    exercise: &[ExerciseLog],
    sleep: &[SleepLog],
) -> Vec<CombinedDayRecord> {
    let mut days = BTreeMap::new();

    for log in hydration {
        record_for(&mut days, log.date)
            .hydration
            .get_or_insert_with(|| log.clone());
    }
    for log in nutrition {
        record_for(&mut days, log.date)
            .nutrition
            .get_or_insert_with(|| log.clone());
    }
    for log in exercise {
        record_for(&mut days, log.date).exercises.push(log.clone());
    }
    for log in sleep {
        record_for(&mut days, log.date)
            .sleep
            .get_or_insert_with(|| log.clone());
    }

    tracing::debug!(
        "Combined {} hydration, {} nutrition, {} exercise, {} sleep logs into {} days",
        hydration.len(),
        nutrition.len(),
        exercise.len(),
        sleep.len(),
        days.len()
    );

    days.into_values().rev().collect()
}

/// Longest progress window accepted from configuration
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Records dated within the `days` days ending on `today` (inclusive).
///
/// A window reaching past the earliest representable date keeps everything
/// up to `today`.
pub fn within_window<T: Dated + Clone>(records: &[T], today: NaiveDate, days: u32) -> Vec<T> {
    let start = today
        .checked_sub_signed(Duration::days(i64::from(days) - 1))
        .unwrap_or(NaiveDate::MIN);
    records
        .iter()
        .filter(|r| r.date() >= start && r.date() <= today)
        .cloned()
        .collect()
}
