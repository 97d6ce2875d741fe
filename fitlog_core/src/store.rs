//! Persistence collaborator and its adapters.
//!
//! Every calculator works on plain data; `LogStore` is the single seam
//! through which logs and profiles are loaded and saved. Each call names
//! the user explicitly.
//!
//! Adapters:
//! - `JsonStore`: a file tree under the data directory
//!   ```text
//!   <data_dir>/users/<user>/
//!     meals/<YYYY-MM-DD>.json   one DailyMealLog per day
//!     profile.json              MacroProfile
//!     hydration.json            Vec<HydrationLog>
//!     sleep.json                Vec<SleepLog>
//!     steps.json                Vec<StepLog>
//!     checkins.json             Vec<CheckIn>
//!     exercise.jsonl            ExerciseLog journal
//!   ```
//! - `MemoryStore`: in-process maps, for tests and dry runs
//!
//! Conflicts resolve as last write wins on the whole document.

use crate::aggregate::build_combined_log;
use crate::config::{Config, StorageBackend};
use crate::document::{load_document, load_optional, save_document, update_document};
use crate::journal::{read_records, JsonlJournal};
use crate::types::{
    CheckIn, CombinedDayRecord, DailyMealLog, Dated, ExerciseLog, HydrationLog, MacroProfile,
    MacroTarget, NutritionLog, SleepLog, StepLog, TargetSource, UserBiometrics,
};
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub trait LogStore {
    /// The day's meal log; an empty log when nothing was saved yet
    fn load_daily_log(&self, user: &str, date: NaiveDate) -> Result<DailyMealLog>;
    fn save_daily_log(&mut self, user: &str, log: &DailyMealLog) -> Result<()>;
    /// Every saved day, oldest first
    fn load_daily_logs(&self, user: &str) -> Result<Vec<DailyMealLog>>;

    fn load_profile(&self, user: &str) -> Result<MacroProfile>;
    fn save_profile(&mut self, user: &str, profile: &MacroProfile) -> Result<()>;

    fn load_hydration_logs(&self, user: &str) -> Result<Vec<HydrationLog>>;
    /// Replaces any log already saved for the same date
    fn save_hydration_log(&mut self, user: &str, log: &HydrationLog) -> Result<()>;

    fn load_exercise_logs(&self, user: &str) -> Result<Vec<ExerciseLog>>;
    fn append_exercise_log(&mut self, user: &str, log: &ExerciseLog) -> Result<()>;

    fn load_sleep_logs(&self, user: &str) -> Result<Vec<SleepLog>>;
    /// Replaces any log already saved for the same date
    fn save_sleep_log(&mut self, user: &str, log: &SleepLog) -> Result<()>;

    fn load_step_logs(&self, user: &str) -> Result<Vec<StepLog>>;
    /// Replaces any log already saved for the same date
    fn save_step_log(&mut self, user: &str, log: &StepLog) -> Result<()>;

    fn load_check_ins(&self, user: &str) -> Result<Vec<CheckIn>>;
    /// Replaces any check-in already saved for the same date
    fn save_check_in(&mut self, user: &str, check_in: &CheckIn) -> Result<()>;

    /// Day totals derived from the saved meal logs
    fn load_nutrition_logs(&self, user: &str) -> Result<Vec<NutritionLog>> {
        Ok(self
            .load_daily_logs(user)?
            .iter()
            .filter(|log| !log.is_empty())
            .map(DailyMealLog::nutrition_totals)
            .collect())
    }

    fn load_biometrics(&self, user: &str) -> Result<Option<UserBiometrics>> {
        Ok(self.load_profile(user)?.biometrics)
    }

    fn save_macro_target(
        &mut self,
        user: &str,
        target: &MacroTarget,
        source: TargetSource,
    ) -> Result<()> {
        let mut profile = self.load_profile(user)?;
        match source {
            TargetSource::Custom => profile.set_custom(*target)?,
            TargetSource::Computed => {
                profile.computed = Some(*target);
                profile.updated_at = Some(Utc::now());
            }
            TargetSource::Fallback => {
                return Err(Error::Validation(
                    "The default target is not stored".into(),
                ))
            }
        }
        self.save_profile(user, &profile)
    }

    /// All four streams merged per date, newest first
    fn load_combined_log(&self, user: &str) -> Result<Vec<CombinedDayRecord>> {
        Ok(build_combined_log(
            &self.load_hydration_logs(user)?,
            &self.load_nutrition_logs(user)?,
            &self.load_exercise_logs(user)?,
            &self.load_sleep_logs(user)?,
        ))
    }
}

/// Insert `record`, replacing one with the same date; keeps date order.
pub fn upsert_by_date<T: Dated>(records: &mut Vec<T>, record: T) {
    match records.iter().position(|r| r.date() == record.date()) {
        Some(index) => records[index] = record,
        None => {
            records.push(record);
            records.sort_by_key(|r| r.date());
        }
    }
}

/// User ids become directory names, so only a safe character set is allowed.
pub fn validate_user_id(user: &str) -> Result<()> {
    let valid = !user.is_empty()
        && user.len() <= 64
        && !user.starts_with('.')
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(Error::Validation(format!(
            "Invalid user id '{}'. Use letters, digits, '-', '_' or '.'",
            user
        )));
    }
    Ok(())
}

/// Choose the adapter named in the config
pub fn open_store(config: &Config) -> Box<dyn LogStore> {
    match config.storage.backend {
        StorageBackend::Json => {
            tracing::debug!("Using JSON store at {:?}", config.data.data_dir);
            Box::new(JsonStore::new(&config.data.data_dir))
        }
        StorageBackend::Memory => {
            tracing::debug!("Using in-memory store");
            Box::new(MemoryStore::default())
        }
    }
}

// ============================================================================
// JSON file adapter
// ============================================================================

const MEALS_DIR: &str = "meals";
const PROFILE_FILE: &str = "profile.json";
const HYDRATION_FILE: &str = "hydration.json";
const SLEEP_FILE: &str = "sleep.json";
const STEPS_FILE: &str = "steps.json";
const CHECKINS_FILE: &str = "checkins.json";
const EXERCISE_FILE: &str = "exercise.jsonl";

pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_dir(&self, user: &str) -> Result<PathBuf> {
        validate_user_id(user)?;
        Ok(self.root.join("users").join(user))
    }

    fn file(&self, user: &str, name: &str) -> Result<PathBuf> {
        Ok(self.user_dir(user)?.join(name))
    }

    fn meal_path(&self, user: &str, date: NaiveDate) -> Result<PathBuf> {
        Ok(self
            .user_dir(user)?
            .join(MEALS_DIR)
            .join(format!("{}.json", date.format("%Y-%m-%d"))))
    }

    fn upsert<T>(&self, user: &str, name: &str, record: &T) -> Result<()>
    where
        T: Dated + Clone + serde::Serialize + serde::de::DeserializeOwned,
    {
        let path = self.file(user, name)?;
        update_document(&path, |records: &mut Vec<T>| {
            upsert_by_date(records, record.clone());
            Ok(())
        })?;
        tracing::debug!("Saved {} entry for {} on {}", name, user, record.date());
        Ok(())
    }
}

impl LogStore for JsonStore {
    fn load_daily_log(&self, user: &str, date: NaiveDate) -> Result<DailyMealLog> {
        let path = self.meal_path(user, date)?;
        let mut log = load_optional::<DailyMealLog>(&path)?
            .unwrap_or_else(|| DailyMealLog::new(date));
        log.date = date;
        Ok(log)
    }

    fn save_daily_log(&mut self, user: &str, log: &DailyMealLog) -> Result<()> {
        save_document(&self.meal_path(user, log.date)?, log)
    }

    fn load_daily_logs(&self, user: &str) -> Result<Vec<DailyMealLog>> {
        let dir = self.user_dir(user)?.join(MEALS_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut logs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(date) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            else {
                tracing::debug!("Ignoring {:?} in meals directory", path);
                continue;
            };
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            if let Some(mut log) = load_optional::<DailyMealLog>(&path)? {
                log.date = date;
                logs.push(log);
            }
        }

        logs.sort_by_key(|log| log.date);
        Ok(logs)
    }

    fn load_profile(&self, user: &str) -> Result<MacroProfile> {
        load_document(&self.file(user, PROFILE_FILE)?)
    }

    fn save_profile(&mut self, user: &str, profile: &MacroProfile) -> Result<()> {
        save_document(&self.file(user, PROFILE_FILE)?, profile)
    }

    fn load_hydration_logs(&self, user: &str) -> Result<Vec<HydrationLog>> {
        load_document(&self.file(user, HYDRATION_FILE)?)
    }

    fn save_hydration_log(&mut self, user: &str, log: &HydrationLog) -> Result<()> {
        self.upsert(user, HYDRATION_FILE, log)
    }

    fn load_exercise_logs(&self, user: &str) -> Result<Vec<ExerciseLog>> {
        read_records(&self.file(user, EXERCISE_FILE)?)
    }

    fn append_exercise_log(&mut self, user: &str, log: &ExerciseLog) -> Result<()> {
        JsonlJournal::new(self.file(user, EXERCISE_FILE)?).append(log)
    }

    fn load_sleep_logs(&self, user: &str) -> Result<Vec<SleepLog>> {
        load_document(&self.file(user, SLEEP_FILE)?)
    }

    fn save_sleep_log(&mut self, user: &str, log: &SleepLog) -> Result<()> {
        self.upsert(user, SLEEP_FILE, log)
    }

    fn load_step_logs(&self, user: &str) -> Result<Vec<StepLog>> {
        load_document(&self.file(user, STEPS_FILE)?)
    }

    fn save_step_log(&mut self, user: &str, log: &StepLog) -> Result<()> {
        self.upsert(user, STEPS_FILE, log)
    }

    fn load_check_ins(&self, user: &str) -> Result<Vec<CheckIn>> {
        load_document(&self.file(user, CHECKINS_FILE)?)
    }

    fn save_check_in(&mut self, user: &str, check_in: &CheckIn) -> Result<()> {
        self.upsert(user, CHECKINS_FILE, check_in)
    }
}

// ============================================================================
// In-memory adapter
// ============================================================================

#[derive(Clone, Debug, Default)]
struct UserLogs {
    meals: BTreeMap<NaiveDate, DailyMealLog>,
    profile: MacroProfile,
    hydration: Vec<HydrationLog>,
    exercise: Vec<ExerciseLog>,
    sleep: Vec<SleepLog>,
    steps: Vec<StepLog>,
    check_ins: Vec<CheckIn>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    users: HashMap<String, UserLogs>,
}

impl MemoryStore {
    fn user(&self, user: &str) -> Result<Option<&UserLogs>> {
        validate_user_id(user)?;
        Ok(self.users.get(user))
    }

    fn user_mut(&mut self, user: &str) -> Result<&mut UserLogs> {
        validate_user_id(user)?;
        Ok(self.users.entry(user.to_string()).or_default())
    }

    fn read<T, F>(&self, user: &str, f: F) -> Result<T>
    where
        T: Default,
        F: FnOnce(&UserLogs) -> T,
    {
        Ok(self.user(user)?.map(f).unwrap_or_default())
    }
}

impl LogStore for MemoryStore {
    fn load_daily_log(&self, user: &str, date: NaiveDate) -> Result<DailyMealLog> {
        Ok(self
            .user(user)?
            .and_then(|u| u.meals.get(&date).cloned())
            .unwrap_or_else(|| DailyMealLog::new(date)))
    }

    fn save_daily_log(&mut self, user: &str, log: &DailyMealLog) -> Result<()> {
        self.user_mut(user)?.meals.insert(log.date, log.clone());
        Ok(())
    }

    fn load_daily_logs(&self, user: &str) -> Result<Vec<DailyMealLog>> {
        self.read(user, |u| u.meals.values().cloned().collect())
    }

    fn load_profile(&self, user: &str) -> Result<MacroProfile> {
        self.read(user, |u| u.profile.clone())
    }

    fn save_profile(&mut self, user: &str, profile: &MacroProfile) -> Result<()> {
        self.user_mut(user)?.profile = profile.clone();
        Ok(())
    }

    fn load_hydration_logs(&self, user: &str) -> Result<Vec<HydrationLog>> {
        self.read(user, |u| u.hydration.clone())
    }

    fn save_hydration_log(&mut self, user: &str, log: &HydrationLog) -> Result<()> {
        upsert_by_date(&mut self.user_mut(user)?.hydration, log.clone());
        Ok(())
    }

    fn load_exercise_logs(&self, user: &str) -> Result<Vec<ExerciseLog>> {
        self.read(user, |u| u.exercise.clone())
    }

    fn append_exercise_log(&mut self, user: &str, log: &ExerciseLog) -> Result<()> {
        self.user_mut(user)?.exercise.push(log.clone());
        Ok(())
    }

    fn load_sleep_logs(&self, user: &str) -> Result<Vec<SleepLog>> {
        self.read(user, |u| u.sleep.clone())
    }

    fn save_sleep_log(&mut self, user: &str, log: &SleepLog) -> Result<()> {
        upsert_by_date(&mut self.user_mut(user)?.sleep, log.clone());
        Ok(())
    }

    fn load_step_logs(&self, user: &str) -> Result<Vec<StepLog>> {
        self.read(user, |u| u.steps.clone())
    }

    fn save_step_log(&mut self, user: &str, log: &StepLog) -> Result<()> {
        upsert_by_date(&mut self.user_mut(user)?.steps, log.clone());
        Ok(())
    }

    fn load_check_ins(&self, user: &str) -> Result<Vec<CheckIn>> {
        self.read(user, |u| u.check_ins.clone())
    }

    fn save_check_in(&mut self, user: &str, check_in: &CheckIn) -> Result<()> {
        upsert_by_date(&mut self.user_mut(user)?.check_ins, check_in.clone());
        Ok(())
    }
}
