//! Configuration file support for fitlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitlog/config.toml`.

use crate::aggregate::MAX_WINDOW_DAYS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub targets: TargetsConfig,

    #[serde(default)]
    pub hydration: HydrationConfig,

    #[serde(default)]
    pub progress: ProgressConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Which `LogStore` adapter to open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Json,
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

/// Optional JSON catalog replacing the built-in foods
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TargetsConfig {
    /// Calories used when no target has been computed or set
    #[serde(default = "default_calories")]
    pub default_calories: i64,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            default_calories: default_calories(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HydrationConfig {
    #[serde(default = "default_daily_goal_ml")]
    pub daily_goal_ml: f64,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            daily_goal_ml: default_daily_goal_ml(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
        }
    }
}

// Default value functions
fn home_fallback(rel: &str) -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rel),
        None => PathBuf::from("."),
    }
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_fallback(".local/share"));
    base.join("fitlog")
}

fn default_user_id() -> String {
    "local".into()
}

fn default_calories() -> i64 {
    3200
}

fn default_daily_goal_ml() -> f64 {
    3000.0
}

fn default_window_days() -> u32 {
    30
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.targets.default_calories <= 0 {
            return Err(Error::Config(format!(
                "targets.default_calories must be positive (got {})",
                self.targets.default_calories
            )));
        }
        if !(self.hydration.daily_goal_ml.is_finite() && self.hydration.daily_goal_ml > 0.0) {
            return Err(Error::Config(format!(
                "hydration.daily_goal_ml must be positive (got {})",
                self.hydration.daily_goal_ml
            )));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.progress.window_days) {
            return Err(Error::Config(format!(
                "progress.window_days must be between 1 and {} (got {})",
                MAX_WINDOW_DAYS, self.progress.window_days
            )));
        }
        crate::store::validate_user_id(&self.user.id)
            .map_err(|e| Error::Config(format!("user.id: {}", e)))
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_fallback(".config"));
        base.join("fitlog").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
