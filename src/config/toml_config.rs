use crate::adapters::geocoder::DEFAULT_FALLBACK;
use crate::domain::model::Location;
use crate::utils::error::{DispatchError, Result};
use crate::utils::validation::{validate_not_blank, validate_path, validate_positive_number, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub couriers: CourierSeedConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub orders: Vec<OrderSeedConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_interval_ms")]
    pub assign_interval_ms: u64,
    #[serde(default = "default_interval_ms")]
    pub move_interval_ms: u64,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
    #[serde(default = "default_true")]
    pub stop_when_idle: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierSeedConfig {
    pub roster_path: Option<String>,
    #[serde(default)]
    pub random_count: usize,
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_fallback")]
    pub fallback: Location,
    #[serde(default)]
    pub streets: BTreeMap<String, Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSeedConfig {
    pub basket_id: Option<Uuid>,
    pub street: String,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_ticks() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_fallback() -> Location {
    DEFAULT_FALLBACK
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            assign_interval_ms: default_interval_ms(),
            move_interval_ms: default_interval_ms(),
            max_ticks: default_max_ticks(),
            stop_when_idle: default_true(),
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            streets: BTreeMap::new(),
        }
    }
}

impl SchedulerConfig {
    pub fn assign_interval(&self) -> Duration {
        Duration::from_millis(self.assign_interval_ms)
    }

    pub fn move_interval(&self) -> Duration {
        Duration::from_millis(self.move_interval_ms)
    }
}

impl DispatchConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${ROSTER_PATH})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DispatchError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_not_blank("service.name", &self.service.name)?;

        validate_positive_number(
            "scheduler.assign_interval_ms",
            self.scheduler.assign_interval_ms,
            1,
        )?;
        validate_positive_number(
            "scheduler.move_interval_ms",
            self.scheduler.move_interval_ms,
            1,
        )?;
        validate_positive_number("scheduler.max_ticks", self.scheduler.max_ticks, 1)?;

        if let Some(path) = &self.couriers.roster_path {
            validate_path("couriers.roster_path", path)?;
        }

        for street in self.geocoder.streets.keys() {
            validate_not_blank("geocoder.streets", street)?;
        }

        for (index, order) in self.orders.iter().enumerate() {
            validate_not_blank(&format!("orders[{}].street", index), &order.street)?;
            if order.basket_id.is_some_and(|id| id.is_nil()) {
                return Err(DispatchError::InvalidConfigValueError {
                    field: format!("orders[{}].basket_id", index),
                    value: Uuid::nil().to_string(),
                    reason: "Basket id cannot be nil".to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Validate for DispatchConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
