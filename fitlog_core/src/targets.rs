//! Macro target calculator.
//!
//! Computed targets come from Mifflin-St Jeor BMR, an activity multiplier
//! and a goal adjustment. Custom targets use a fixed 30/45/25 split of
//! protein/carbs/fats by energy and can be edited from either side: change
//! the calories and the macros follow, change a macro and the calories
//! follow.

use crate::types::{
    ActivityLevel, Gender, Goal, MacroProfile, MacroTarget, TargetSource, UserBiometrics,
    KCAL_PER_G_CARBS, KCAL_PER_G_FAT, KCAL_PER_G_PROTEIN,
};
use crate::{Error, Result};
use chrono::Utc;

/// Share of calories assigned to protein in custom mode
pub const CUSTOM_PROTEIN_SHARE: f64 = 0.30;

/// Share of calories assigned to carbs in custom mode
pub const CUSTOM_CARBS_SHARE: f64 = 0.45;

/// Share of calories assigned to fat, in both modes
pub const FAT_SHARE: f64 = 0.25;

/// Grams of protein per kg of body weight in computed mode
pub const PROTEIN_G_PER_KG: f64 = 2.2;

/// Calorie change applied for a cut or bulk
pub const GOAL_ADJUSTMENT_KCAL: f64 = 300.0;

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
        }
    }
}

impl Goal {
    pub fn calorie_adjustment(&self) -> f64 {
        match self {
            Goal::Cut => -GOAL_ADJUSTMENT_KCAL,
            Goal::Maintain => 0.0,
            Goal::Bulk => GOAL_ADJUSTMENT_KCAL,
        }
    }
}

/// Mifflin-St Jeor basal metabolic rate (kcal/day)
///
/// Every gender other than male uses the female constant.
pub fn bmr(bio: &UserBiometrics) -> f64 {
    let base = 10.0 * bio.weight_kg + 6.25 * bio.height_cm - 5.0 * bio.age;
    match bio.gender {
        Gender::Male => base + 5.0,
        Gender::Female | Gender::Other => base - 161.0,
    }
}

pub fn validate_biometrics(bio: &UserBiometrics) -> Result<()> {
    for (field, value) in [
        ("age", bio.age),
        ("height", bio.height_cm),
        ("weight", bio.weight_kg),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::Validation(format!(
                "{} must be a positive number (got {})",
                field, value
            )));
        }
    }
    Ok(())
}

/// Derive daily targets from biometrics
///
/// Fats and carbs are taken from the unrounded calorie figure; the carb
/// remainder subtracts the already-rounded protein grams.
pub fn compute_targets(bio: &UserBiometrics) -> Result<MacroTarget> {
    validate_biometrics(bio)?;

    let calories = bmr(bio) * bio.activity.multiplier() + bio.goal.calorie_adjustment();
    let protein = (bio.weight_kg * PROTEIN_G_PER_KG).round();
    let fat_kcal = calories * FAT_SHARE;
    let fats = (fat_kcal / KCAL_PER_G_FAT).round();
    let carbs = ((calories - protein * KCAL_PER_G_PROTEIN - fat_kcal) / KCAL_PER_G_CARBS).round();

    let target = MacroTarget {
        calories: calories.round() as i64,
        protein: protein as i64,
        carbs: carbs as i64,
        fats: fats as i64,
    };
    tracing::debug!(?target, "Computed targets (BMR {:.1})", bmr(bio));
    Ok(target)
}

/// Macro grams for a custom target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacroSplit {
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
}

/// Split a calorie figure 30/45/25 into protein/carbs/fats grams
pub fn recompute_custom_from_calories(calories: i64) -> MacroSplit {
    let c = calories as f64;
    MacroSplit {
        protein: (c * CUSTOM_PROTEIN_SHARE / KCAL_PER_G_PROTEIN).round() as i64,
        carbs: (c * CUSTOM_CARBS_SHARE / KCAL_PER_G_CARBS).round() as i64,
        fats: (c * FAT_SHARE / KCAL_PER_G_FAT).round() as i64,
    }
}

/// Energy of a macro split, in kcal
pub fn recompute_calories_from_macros(protein: i64, carbs: i64, fats: i64) -> i64 {
    (protein as f64 * KCAL_PER_G_PROTEIN
        + carbs as f64 * KCAL_PER_G_CARBS
        + fats as f64 * KCAL_PER_G_FAT)
        .round() as i64
}

/// Target used when neither a custom nor a computed target is usable
pub fn fallback_target(calories: i64) -> MacroTarget {
    let split = recompute_custom_from_calories(calories);
    MacroTarget {
        calories,
        protein: split.protein,
        carbs: split.carbs,
        fats: split.fats,
    }
}

/// Interactive custom-target editing.
///
/// Whichever side was edited last wins: calories redistribute the macros,
/// and a macro edit recomputes the calories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CustomTargetEditor {
    target: MacroTarget,
}

impl CustomTargetEditor {
    pub fn new(start: MacroTarget) -> Self {
        Self { target: start }
    }

    pub fn from_calories(calories: i64) -> Result<Self> {
        let mut editor = Self::new(fallback_target(0));
        editor.set_calories(calories)?;
        Ok(editor)
    }

    pub fn set_calories(&mut self, calories: i64) -> Result<&mut Self> {
        if calories <= 0 {
            return Err(Error::Validation(format!(
                "Calories must be greater than 0 (got {})",
                calories
            )));
        }
        self.target = fallback_target(calories);
        Ok(self)
    }

    pub fn set_protein(&mut self, grams: i64) -> Result<&mut Self> {
        self.target.protein = non_negative("protein", grams)?;
        self.sync_calories();
        Ok(self)
    }

    pub fn set_carbs(&mut self, grams: i64) -> Result<&mut Self> {
        self.target.carbs = non_negative("carbs", grams)?;
        self.sync_calories();
        Ok(self)
    }

    pub fn set_fats(&mut self, grams: i64) -> Result<&mut Self> {
        self.target.fats = non_negative("fats", grams)?;
        self.sync_calories();
        Ok(self)
    }

    pub fn target(&self) -> MacroTarget {
        self.target
    }

    /// The edited target; rejected when it carries no energy.
    pub fn finish(self) -> Result<MacroTarget> {
        if self.target.calories <= 0 {
            return Err(Error::Validation(
                "Custom target must have more than 0 calories".into(),
            ));
        }
        Ok(self.target)
    }

    fn sync_calories(&mut self) {
        let t = &mut self.target;
        t.calories = recompute_calories_from_macros(t.protein, t.carbs, t.fats);
    }
}

fn non_negative(field: &str, grams: i64) -> Result<i64> {
    if grams < 0 {
        return Err(Error::Validation(format!(
            "{} must not be negative (got {})",
            field, grams
        )));
    }
    Ok(grams)
}

fn usable(target: Option<MacroTarget>) -> Option<MacroTarget> {
    target.filter(|t| t.calories > 0)
}

impl MacroProfile {
    /// The single active target: custom, then computed, then the fallback
    pub fn active_target(&self, default_calories: i64) -> (MacroTarget, TargetSource) {
        if let Some(custom) = usable(self.custom) {
            return (custom, TargetSource::Custom);
        }
        if let Some(computed) = usable(self.computed) {
            return (computed, TargetSource::Computed);
        }
        (fallback_target(default_calories), TargetSource::Fallback)
    }

    pub fn is_custom_mode(&self) -> bool {
        usable(self.custom).is_some()
    }

    /// Store biometrics and the target computed from them
    pub fn set_biometrics(&mut self, bio: UserBiometrics) -> Result<MacroTarget> {
        let target = compute_targets(&bio)?;
        self.biometrics = Some(bio);
        self.computed = Some(target);
        self.updated_at = Some(Utc::now());
        Ok(target)
    }

    pub fn set_custom(&mut self, target: MacroTarget) -> Result<()> {
        if target.calories <= 0 {
            return Err(Error::Validation(
                "Custom target must have more than 0 calories".into(),
            ));
        }
        self.custom = Some(target);
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Back to computed mode
    pub fn clear_custom(&mut self) -> bool {
        let had_custom = self.custom.take().is_some();
        if had_custom {
            self.updated_at = Some(Utc::now());
        }
        had_custom
    }

    /// Forget biometrics and both targets; returns whether anything was set
    pub fn reset(&mut self) -> bool {
        let had_any =
            self.biometrics.is_some() || self.computed.is_some() || self.custom.is_some();
        *self = MacroProfile {
            updated_at: Some(Utc::now()),
            ..MacroProfile::default()
        };
        had_any
    }
}
