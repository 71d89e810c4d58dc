//! Date-versioned fuel prices.

use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fuel grade sold at the outlet ("Petrol", "Diesel", "CNG"...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuelType(String);

impl FuelType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FuelType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FuelType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Per fuel type history of price changes plus the static configured price.
///
/// Entries are only ever upserted; nothing is removed and nothing already
/// priced from the timeline is revised when a rate changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RateTimeline {
    #[serde(default)]
    defaults: BTreeMap<FuelType, Decimal>,
    #[serde(default)]
    history: BTreeMap<FuelType, BTreeMap<NaiveDate, Decimal>>,
}

impl RateTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults<I>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (FuelType, Decimal)>,
    {
        Self {
            defaults: defaults.into_iter().collect(),
            history: BTreeMap::new(),
        }
    }

    /// Configures the price used when no dated change applies.
    pub fn set_default(&mut self, fuel_type: FuelType, price: Decimal) {
        self.defaults.insert(fuel_type, price);
    }

    pub fn default_price(&self, fuel_type: &FuelType) -> Option<Decimal> {
        self.defaults.get(fuel_type).copied()
    }

    /// Upserts the rate effective from `date`, returning the value it replaced.
    pub fn set(&mut self, fuel_type: FuelType, date: NaiveDate, rate: Decimal) -> Option<Decimal> {
        self.history.entry(fuel_type).or_default().insert(date, rate)
    }

    /// Rate in effect on `date`: the exact-date entry, else the latest earlier
    /// change, else the static default.
    pub fn resolve(&self, fuel_type: &FuelType, date: NaiveDate) -> Option<Decimal> {
        self.history
            .get(fuel_type)
            .and_then(|entries| entries.range(..=date).next_back())
            .map(|(_, rate)| *rate)
            .or_else(|| self.default_price(fuel_type))
    }

    pub fn history(&self, fuel_type: &FuelType) -> Vec<(NaiveDate, Decimal)> {
        self.history
            .get(fuel_type)
            .map(|entries| entries.iter().map(|(day, rate)| (*day, *rate)).collect())
            .unwrap_or_default()
    }

    /// Every fuel type with either a default or a dated entry.
    pub fn fuel_types(&self) -> Vec<FuelType> {
        let mut types: Vec<FuelType> = self
            .defaults
            .keys()
            .chain(self.history.keys())
            .cloned()
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// Resolves every known fuel type on `date`.
    pub fn rates_on(&self, date: NaiveDate) -> BTreeMap<FuelType, Decimal> {
        self.fuel_types()
            .into_iter()
            .filter_map(|fuel| self.resolve(&fuel, date).map(|rate| (fuel, rate)))
            .collect()
    }
}
