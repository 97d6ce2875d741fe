//! Nutrition ledger: scaled meal items, per-meal and per-day totals.
//!
//! `DailyMealLog` holds the pure in-memory operations. `NutritionService`
//! wraps them in the load → mutate → save cycle against a `LogStore`, with
//! the user and date passed in on every call.

use crate::store::LogStore;
use crate::types::{
    DailyMealLog, FoodEntry, LoggedMealItem, Macro, MacroTarget, MealSlot, NutritionLog,
};
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;

/// Parse a user-entered quantity string
pub fn parse_quantity(input: &str) -> Result<f64> {
    let value = input
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::Validation(format!("Quantity '{}' is not a number", input.trim())))?;
    validate_quantity(value)
}

fn validate_quantity(quantity: f64) -> Result<f64> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::Validation(format!(
            "Quantity must be greater than 0 (got {})",
            quantity
        )));
    }
    Ok(quantity)
}

fn validate_serving_size(name: &str, serving_size: f64) -> Result<()> {
    if !serving_size.is_finite() || serving_size <= 0.0 {
        return Err(Error::Validation(format!(
            "Food '{}' has invalid serving size {}",
            name, serving_size
        )));
    }
    Ok(())
}

impl LoggedMealItem {
    /// Scale a catalog entry to `quantity` (in the food's serving unit)
    pub fn from_food(food: &FoodEntry, quantity: f64) -> Result<Self> {
        let quantity = validate_quantity(quantity)?;
        validate_serving_size(&food.name, food.serving_size)?;

        let factor = quantity / food.serving_size;
        Ok(Self {
            name: food.name.clone(),
            category: food.category.clone(),
            serving_size: food.serving_size,
            serving_unit: food.serving_unit.clone(),
            quantity,
            nutrients: food.nutrients.scaled(factor),
            baseline: food.nutrients,
        })
    }

    /// Recompute nutrients for a new quantity from the stored baseline
    pub fn rescale(&mut self, quantity: f64) -> Result<()> {
        let quantity = validate_quantity(quantity)?;
        validate_serving_size(&self.name, self.serving_size)?;

        self.quantity = quantity;
        self.nutrients = self.baseline.scaled(quantity / self.serving_size);
        Ok(())
    }
}

impl DailyMealLog {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            meals: BTreeMap::new(),
            updated_at: None,
        }
    }

    /// Items logged under a slot, in insertion order
    pub fn items(&self, slot: MealSlot) -> &[LoggedMealItem] {
        self.meals.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.meals.values().all(Vec::is_empty)
    }

    pub fn add_item(
        &mut self,
        food: &FoodEntry,
        quantity: f64,
        slot: MealSlot,
    ) -> Result<LoggedMealItem> {
        let item = LoggedMealItem::from_food(food, quantity)?;
        self.meals.entry(slot).or_default().push(item.clone());
        tracing::debug!(
            "Added {}{} of {} to {} on {}",
            item.quantity,
            item.serving_unit,
            item.name,
            slot,
            self.date
        );
        Ok(item)
    }

    pub fn edit_item(
        &mut self,
        slot: MealSlot,
        index: usize,
        quantity: f64,
    ) -> Result<LoggedMealItem> {
        let date = self.date;
        let item = self
            .meals
            .get_mut(&slot)
            .and_then(|items| items.get_mut(index))
            .ok_or_else(|| missing_item(slot, index, date))?;
        item.rescale(quantity)?;
        Ok(item.clone())
    }

    /// Remove an item. A slot left empty is dropped from the map.
    pub fn delete_item(&mut self, slot: MealSlot, index: usize) -> Result<LoggedMealItem> {
        let items = match self.meals.get_mut(&slot) {
            Some(items) if index < items.len() => items,
            _ => return Err(missing_item(slot, index, self.date)),
        };
        let removed = items.remove(index);
        if items.is_empty() {
            self.meals.remove(&slot);
        }
        Ok(removed)
    }

    /// Sum of one nutrient over a slot; 0.0 when the slot is empty
    pub fn meal_total(&self, slot: MealSlot, nutrient: Macro) -> f64 {
        self.items(slot)
            .iter()
            .map(|item| item.nutrients.get(nutrient))
            .sum()
    }

    /// Sum of `meal_total` over all slots
    pub fn day_total(&self, nutrient: Macro) -> f64 {
        MealSlot::ALL
            .iter()
            .map(|slot| self.meal_total(*slot, nutrient))
            .sum()
    }

    /// Budget left for the day; negative when over target
    pub fn remaining(&self, nutrient: Macro, target: &MacroTarget) -> Result<f64> {
        let budget = target
            .get(nutrient)
            .ok_or_else(|| Error::Validation(format!("No daily target is defined for {}", nutrient)))?;
        Ok(budget - self.day_total(nutrient))
    }

    /// Day totals in the shape the progress view consumes
    pub fn nutrition_totals(&self) -> NutritionLog {
        NutritionLog {
            date: self.date,
            calories: self.day_total(Macro::Calories),
            protein: self.day_total(Macro::Protein),
            carbs: self.day_total(Macro::Carbs),
            fats: self.day_total(Macro::Fats),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

fn missing_item(slot: MealSlot, index: usize, date: NaiveDate) -> Error {
    Error::NotFound(format!("No item #{} in {} on {}", index + 1, slot, date))
}

/// Ledger operations bound to a store
pub struct NutritionService<'a, S: LogStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: LogStore + ?Sized> NutritionService<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn day_log(&self, user: &str, date: NaiveDate) -> Result<DailyMealLog> {
        self.store.load_daily_log(user, date)
    }

    pub fn add_item(
        &mut self,
        user: &str,
        date: NaiveDate,
        food: &FoodEntry,
        quantity: f64,
        slot: MealSlot,
    ) -> Result<LoggedMealItem> {
        self.mutate(user, date, |log| log.add_item(food, quantity, slot))
    }

    pub fn edit_item(
        &mut self,
        user: &str,
        date: NaiveDate,
        slot: MealSlot,
        index: usize,
        quantity: f64,
    ) -> Result<LoggedMealItem> {
        self.mutate(user, date, |log| log.edit_item(slot, index, quantity))
    }

    pub fn delete_item(
        &mut self,
        user: &str,
        date: NaiveDate,
        slot: MealSlot,
        index: usize,
    ) -> Result<LoggedMealItem> {
        self.mutate(user, date, |log| log.delete_item(slot, index))
    }

    /// Nothing is saved when `f` fails.
    fn mutate<T, F>(&mut self, user: &str, date: NaiveDate, f: F) -> Result<T>
    where
        F: FnOnce(&mut DailyMealLog) -> Result<T>,
    {
        let mut log = self.store.load_daily_log(user, date)?;
        let out = f(&mut log)?;
        log.touch();
        self.store.save_daily_log(user, &log)?;
        tracing::info!("Saved meal log for {} on {}", user, date);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{round1, NutrientProfile};

    fn banana() -> FoodEntry {
        FoodEntry {
            name: "Banana".into(),
            category: "Fruits".into(),
            serving_size: 100.0,
            serving_unit: "g".into(),
            nutrients: NutrientProfile {
                calories: 89.0,
                protein: 1.1,
                carbs: 22.8,
                fats: 0.3,
                fiber: 2.6,
            },
        }
    }

    fn oats() -> FoodEntry {
        FoodEntry {
            name: "Oats".into(),
            category: "Grains".into(),
            serving_size: 40.0,
            serving_unit: "g".into(),
            nutrients: NutrientProfile {
                calories: 150.0,
                protein: 5.0,
                carbs: 27.0,
                fats: 3.0,
                fiber: 4.0,
            },
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() <= tolerance
    }

    #[test]
    fn test_banana_scaled_to_150g() {
        let mut log = DailyMealLog::new(day());
        let item = log.add_item(&banana(), 150.0, MealSlot::Breakfast).unwrap();

        assert_eq!(item.nutrients.calories, 133.5);
        assert_eq!(item.nutrients.carbs, 34.2);
        assert_eq!(item.nutrients.fiber, 3.9);
        // 1.65 and 0.45 sit on a rounding midpoint
        assert!(close(item.nutrients.protein, 1.65, 0.051));
        assert!(close(item.nutrients.fats, 0.45, 0.051));
        assert_eq!(item.quantity, 150.0);
        assert_eq!(log.items(MealSlot::Breakfast).len(), 1);
    }

    #[test]
    fn test_scaled_values_match_rounded_formula() {
        let food = oats();
        for quantity in [1.0, 13.0, 40.0, 55.5, 120.0, 333.3] {
            let item = LoggedMealItem::from_food(&food, quantity).unwrap();
            let factor = quantity / food.serving_size;
            for nutrient in Macro::ALL {
                assert_eq!(
                    item.nutrients.get(nutrient),
                    round1(food.nutrients.get(nutrient) * factor),
                    "{} at {}",
                    nutrient,
                    quantity
                );
            }
        }
    }

    #[test]
    fn test_serving_size_quantity_is_unscaled() {
        let item = LoggedMealItem::from_food(&banana(), 100.0).unwrap();
        assert_eq!(item.nutrients, banana().nutrients);
    }

    #[test]
    fn test_zero_and_negative_quantity_rejected() {
        let mut log = DailyMealLog::new(day());
        for quantity in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = log.add_item(&banana(), quantity, MealSlot::Lunch);
            assert!(matches!(result, Err(Error::Validation(_))));
        }
        assert!(log.is_empty());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 150 ").unwrap(), 150.0);
        assert_eq!(parse_quantity("2.5").unwrap(), 2.5);
        assert!(matches!(parse_quantity("abc"), Err(Error::Validation(_))));
        assert!(matches!(parse_quantity("0"), Err(Error::Validation(_))));
        assert!(matches!(parse_quantity("-1"), Err(Error::Validation(_))));
        assert!(matches!(parse_quantity("NaN"), Err(Error::Validation(_))));
        assert!(matches!(parse_quantity(""), Err(Error::Validation(_))));
    }

    #[test]
    fn test_edit_recomputes_from_baseline() {
        let mut log = DailyMealLog::new(day());
        log.add_item(&banana(), 150.0, MealSlot::Breakfast).unwrap();

        // Bounce through awkward quantities; the result must not drift
        for quantity in [7.0, 333.0, 1.0, 49.0] {
            log.edit_item(MealSlot::Breakfast, 0, quantity).unwrap();
        }
        let item = log.edit_item(MealSlot::Breakfast, 0, 150.0).unwrap();

        let fresh = LoggedMealItem::from_food(&banana(), 150.0).unwrap();
        assert_eq!(item.nutrients, fresh.nutrients);
        assert_eq!(item.baseline, banana().nutrients);
    }

    #[test]
    fn test_edit_missing_item_is_not_found() {
        let mut log = DailyMealLog::new(day());
        assert!(matches!(
            log.edit_item(MealSlot::Dinner, 0, 100.0),
            Err(Error::NotFound(_))
        ));
        log.add_item(&banana(), 100.0, MealSlot::Dinner).unwrap();
        assert!(matches!(
            log.edit_item(MealSlot::Dinner, 1, 100.0),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            log.edit_item(MealSlot::Dinner, 0, 0.0),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_delete_item() {
        let mut log = DailyMealLog::new(day());
        log.add_item(&banana(), 100.0, MealSlot::Lunch).unwrap();
        log.add_item(&oats(), 40.0, MealSlot::Lunch).unwrap();

        let removed = log.delete_item(MealSlot::Lunch, 0).unwrap();
        assert_eq!(removed.name, "Banana");
        assert_eq!(log.items(MealSlot::Lunch)[0].name, "Oats");

        log.delete_item(MealSlot::Lunch, 0).unwrap();
        assert!(log.items(MealSlot::Lunch).is_empty());
        assert_eq!(log.meal_total(MealSlot::Lunch, Macro::Calories), 0.0);

        assert!(matches!(
            log.delete_item(MealSlot::Lunch, 0),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_day_total_is_sum_of_meal_totals() {
        let mut log = DailyMealLog::new(day());
        log.add_item(&banana(), 120.0, MealSlot::Breakfast).unwrap();
        log.add_item(&oats(), 60.0, MealSlot::Breakfast).unwrap();
        log.add_item(&oats(), 33.0, MealSlot::Dinner).unwrap();

        for nutrient in Macro::ALL {
            let by_meal: f64 = MealSlot::ALL
                .iter()
                .map(|slot| log.meal_total(*slot, nutrient))
                .sum();
            assert_eq!(log.day_total(nutrient), by_meal);
        }
        assert_eq!(log.meal_total(MealSlot::Lunch, Macro::Protein), 0.0);
    }

    #[test]
    fn test_malformed_field_counts_as_zero() {
        let mut log = DailyMealLog::new(day());
        log.add_item(&banana(), 100.0, MealSlot::Lunch).unwrap();
        log.add_item(&banana(), 100.0, MealSlot::Lunch).unwrap();
        log.meals.get_mut(&MealSlot::Lunch).unwrap()[0].nutrients.calories = f64::NAN;

        assert_eq!(log.day_total(Macro::Calories), 89.0);
        assert!(!log.day_total(Macro::Protein).is_nan());
    }

    #[test]
    fn test_remaining_can_go_negative() {
        let mut log = DailyMealLog::new(day());
        log.add_item(&oats(), 400.0, MealSlot::Breakfast).unwrap();
        let target = MacroTarget {
            calories: 1200,
            protein: 150,
            carbs: 100,
            fats: 40,
        };

        assert_eq!(log.remaining(Macro::Calories, &target).unwrap(), -300.0);
        assert_eq!(log.remaining(Macro::Protein, &target).unwrap(), 100.0);
        assert!(matches!(
            log.remaining(Macro::Fiber, &target),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_nutrition_totals() {
        let mut log = DailyMealLog::new(day());
        log.add_item(&oats(), 40.0, MealSlot::Breakfast).unwrap();
        log.add_item(&oats(), 40.0, MealSlot::Lunch).unwrap();
        let totals = log.nutrition_totals();
        assert_eq!(totals.date, day());
        assert_eq!(totals.calories, 300.0);
        assert_eq!(totals.carbs, 54.0);
    }

    #[test]
    fn test_service_persists_each_mutation() {
        crate::logging::init_test();
        let mut store = MemoryStore::default();
        let mut service = NutritionService::new(&mut store);

        service
            .add_item("alice", day(), &banana(), 150.0, MealSlot::Breakfast)
            .unwrap();
        service
            .add_item("alice", day(), &oats(), 40.0, MealSlot::Dinner)
            .unwrap();
        service
            .edit_item("alice", day(), MealSlot::Breakfast, 0, 100.0)
            .unwrap();
        service
            .delete_item("alice", day(), MealSlot::Dinner, 0)
            .unwrap();

        let log = service.day_log("alice", day()).unwrap();
        assert_eq!(log.day_total(Macro::Calories), 89.0);
        assert!(log.updated_at.is_some());

        // Other users and days are untouched
        assert!(service.day_log("bob", day()).unwrap().is_empty());
        let next = day().succ_opt().unwrap();
        assert!(service.day_log("alice", next).unwrap().is_empty());
    }

    #[test]
    fn test_service_failed_edit_saves_nothing() {
        let mut store = MemoryStore::default();
        let mut service = NutritionService::new(&mut store);
        let result = service.edit_item("alice", day(), MealSlot::Lunch, 3, 50.0);
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(store.load_daily_logs("alice").unwrap().is_empty());
    }
}
