use std::{collections::BTreeMap, env, path::PathBuf};

use daybook_domain::{FuelType, RateTimeline};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable that overrides the data directory.
pub const DAYBOOK_HOME_ENV: &str = "DAYBOOK_HOME";

/// Outlet preferences persisted next to the day-books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_daybook: Option<String>,

    /// Static price per fuel type, used when no dated rate applies.
    #[serde(default = "Config::default_fuel_prices")]
    pub fuel_prices: BTreeMap<String, Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom root for day-books. Defaults to `~/Documents/Daybook`.
    pub data_root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_root: Option<PathBuf>,

    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,

    /// `tracing` filter directive applied when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-IN".into(),
            currency: "INR".into(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            last_opened_daybook: None,
            fuel_prices: Self::default_fuel_prices(),
            data_root: None,
            backup_root: None,
            backup_retention: Self::default_backup_retention(),
            log_filter: None,
        }
    }
}

impl Config {
    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_fuel_prices() -> BTreeMap<String, Decimal> {
        [
            ("Diesel", Decimal::new(9046, 2)),
            ("Petrol", Decimal::new(10250, 2)),
            ("CNG", Decimal::new(7520, 2)),
            ("Premium", Decimal::new(10890, 2)),
        ]
        .into_iter()
        .map(|(fuel, price)| (fuel.to_string(), price))
        .collect()
    }

    /// Rejects blank fuel names, non-positive prices and a zero retention.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (fuel, price) in &self.fuel_prices {
            if fuel.trim().is_empty() {
                return Err(ConfigError::Invalid("fuel type name is empty".into()));
            }
            if *price <= Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "price for {fuel} must be positive"
                )));
            }
        }
        if self.backup_retention == 0 {
            return Err(ConfigError::Invalid(
                "backup retention must keep at least one backup".into(),
            ));
        }
        Ok(())
    }

    /// Rate timeline seeded with the configured static prices.
    pub fn rate_timeline(&self) -> RateTimeline {
        RateTimeline::with_defaults(
            self.fuel_prices
                .iter()
                .map(|(fuel, price)| (FuelType::new(fuel.as_str()), *price)),
        )
    }

    /// `DAYBOOK_HOME`, then the configured root, then `~/Documents/Daybook`.
    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(home) = env::var_os(DAYBOOK_HOME_ENV).filter(|value| !value.is_empty()) {
            return PathBuf::from(home);
        }
        if let Some(path) = &self.data_root {
            return path.clone();
        }
        let base = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("Daybook")
    }

    pub fn resolve_daybooks_dir(&self) -> PathBuf {
        self.resolve_data_root().join("daybooks")
    }

    pub fn resolve_backup_root(&self) -> PathBuf {
        match &self.backup_root {
            Some(path) => path.clone(),
            None => self.resolve_data_root().join("backups"),
        }
    }
}
