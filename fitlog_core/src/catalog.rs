//! Food catalog: the static reference data the ledger scales from.
//!
//! The built-in catalog is built once and cached. A JSON catalog file can
//! replace it (see `[catalog] path` in the config).

use crate::types::{FoodEntry, NutrientProfile};
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::path::Path;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// An in-memory list of foods
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub foods: Vec<FoodEntry>,
}

impl Catalog {
    pub fn new(foods: Vec<FoodEntry>) -> Self {
        Self { foods }
    }

    /// Load a catalog from a JSON array of food entries
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let foods: Vec<FoodEntry> = serde_json::from_str(&contents)?;
        let catalog = Self::new(foods);

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }

        tracing::info!("Loaded {} foods from {:?}", catalog.foods.len(), path);
        Ok(catalog)
    }

    /// Case-insensitive substring match on the name, optionally restricted
    /// to one category.
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<&FoodEntry> {
        let needle = query.trim().to_lowercase();
        self.foods
            .iter()
            .filter(|food| food.name.to_lowercase().contains(&needle))
            .filter(|food| category.map_or(true, |c| food.category.eq_ignore_ascii_case(c)))
            .collect()
    }

    /// Exact (case-insensitive) lookup by name
    pub fn find(&self, name: &str) -> Result<&FoodEntry> {
        self.foods
            .iter()
            .find(|food| food.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::NotFound(format!("Food '{}' is not in the catalog", name)))
    }

    /// Distinct categories, sorted
    pub fn categories(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.foods.iter().map(|f| f.category.as_str()).collect();
        set.into_iter().collect()
    }

    /// Returns one message per problem; empty when the catalog is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = BTreeSet::new();

        for food in &self.foods {
            if food.name.trim().is_empty() {
                errors.push("Food with empty name".to_string());
                continue;
            }
            if !seen.insert(food.name.to_lowercase()) {
                errors.push(format!("Duplicate food '{}'", food.name));
            }
            if !(food.serving_size.is_finite() && food.serving_size > 0.0) {
                errors.push(format!(
                    "Food '{}' has invalid serving size {}",
                    food.name, food.serving_size
                ));
            }
            let n = &food.nutrients;
            if [n.calories, n.protein, n.carbs, n.fats, n.fiber]
                .iter()
                .any(|v| *v < 0.0)
            {
                errors.push(format!("Food '{}' has negative nutrient values", food.name));
            }
        }

        if self.foods.is_empty() {
            errors.push("Catalog has no foods".to_string());
        }

        errors
    }
}

fn food(
    name: &str,
    category: &str,
    serving_size: f64,
    serving_unit: &str,
    nutrients: [f64; 5],
) -> FoodEntry {
    let [calories, protein, carbs, fats, fiber] = nutrients;
    FoodEntry {
        name: name.into(),
        category: category.into(),
        serving_size,
        serving_unit: serving_unit.into(),
        nutrients: NutrientProfile {
            calories,
            protein,
            carbs,
            fats,
            fiber,
        },
    }
}

/// Builds the built-in catalog
///
/// Prefer `get_default_catalog()`, which returns the cached copy.
pub fn build_default_catalog() -> Catalog {
    // [kcal, protein, carbs, fats, fiber] per serving
    Catalog::new(vec![
        // Vegetables
        food("Broccoli", "Vegetables", 100.0, "g", [34.0, 2.8, 6.6, 0.4, 2.6]),
        food("Spinach", "Vegetables", 100.0, "g", [23.0, 2.9, 3.6, 0.4, 2.2]),
        food("Carrot", "Vegetables", 100.0, "g", [41.0, 0.9, 9.6, 0.2, 2.8]),
        food("Potato", "Vegetables", 100.0, "g", [77.0, 2.0, 17.5, 0.1, 2.2]),
        // Fruits
        food("Banana", "Fruits", 100.0, "g", [89.0, 1.1, 22.8, 0.3, 2.6]),
        food("Apple", "Fruits", 100.0, "g", [52.0, 0.3, 13.8, 0.2, 2.4]),
        food("Orange", "Fruits", 100.0, "g", [47.0, 0.9, 11.8, 0.1, 2.4]),
        // Grains
        food("White Rice (cooked)", "Grains", 100.0, "g", [130.0, 2.7, 28.2, 0.3, 0.4]),
        food("Oats", "Grains", 100.0, "g", [389.0, 16.9, 66.3, 6.9, 10.6]),
        food("Whole Wheat Bread", "Grains", 1.0, "slice", [69.0, 3.6, 12.0, 0.9, 1.9]),
        // Pulses/Legumes
        food("Chickpeas (cooked)", "Pulses/Legumes", 100.0, "g", [164.0, 8.9, 27.4, 2.6, 7.6]),
        food("Lentils (cooked)", "Pulses/Legumes", 100.0, "g", [116.0, 9.0, 20.1, 0.4, 7.9]),
        // Nuts & Seeds
        food("Almonds", "Nuts & Seeds", 28.0, "g", [164.0, 6.0, 6.1, 14.2, 3.5]),
        food("Peanut Butter", "Nuts & Seeds", 32.0, "g", [188.0, 8.0, 6.0, 16.0, 1.9]),
        // Dairy
        food("Whole Milk", "Dairy", 250.0, "ml", [149.0, 7.7, 11.7, 7.9, 0.0]),
        food("Greek Yogurt", "Dairy", 100.0, "g", [59.0, 10.2, 3.6, 0.4, 0.0]),
        food("Paneer", "Dairy", 100.0, "g", [265.0, 18.3, 1.2, 20.8, 0.0]),
        // Non-Veg
        food("Chicken Breast", "Non-Veg", 100.0, "g", [165.0, 31.0, 0.0, 3.6, 0.0]),
        food("Egg", "Non-Veg", 1.0, "piece", [72.0, 6.3, 0.4, 4.8, 0.0]),
        food("Salmon", "Non-Veg", 100.0, "g", [208.0, 20.4, 0.0, 13.4, 0.0]),
        // Oils & Fats
        food("Olive Oil", "Oils & Fats", 15.0, "ml", [119.0, 0.0, 0.0, 13.5, 0.0]),
        food("Butter", "Oils & Fats", 10.0, "g", [72.0, 0.1, 0.0, 8.1, 0.0]),
        // Supplements
        food("Whey Protein", "Supplements", 30.0, "g", [120.0, 24.0, 3.0, 1.5, 0.0]),
        food("Creatine", "Supplements", 5.0, "g", [0.0, 0.0, 0.0, 0.0, 0.0]),
        // Snacks
        food("Dark Chocolate", "Snacks", 20.0, "g", [120.0, 1.6, 9.2, 8.6, 2.2]),
        // Beverages
        food("Orange Juice", "Beverages", 250.0, "ml", [112.0, 1.7, 25.8, 0.5, 0.5]),
        food("Black Coffee", "Beverages", 240.0, "ml", [2.0, 0.3, 0.0, 0.0, 0.0]),
    ])
}
