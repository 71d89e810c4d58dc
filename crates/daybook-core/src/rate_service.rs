use chrono::NaiveDate;
use daybook_domain::{FuelType, RateTimeline};
use rust_decimal::Decimal;

use crate::{storage::DaybookStore, CoreError, CoreResult};

/// Validated access to the fuel rate history.
pub struct RateService;

impl RateService {
    /// Records the rate effective from `date`. Earlier and later entries are
    /// left untouched and nothing already priced is recomputed.
    pub fn set_rate<S: DaybookStore>(
        store: &mut S,
        fuel_type: impl Into<FuelType>,
        date: NaiveDate,
        rate: Decimal,
    ) -> CoreResult<Option<Decimal>> {
        let fuel_type = fuel_type.into();
        Self::validate(&fuel_type, rate)?;
        let mut rates = store.rates()?;
        let previous = rates.set(fuel_type.clone(), date, rate);
        store.save_rates(rates)?;
        tracing::info!(fuel = %fuel_type, %date, %rate, "fuel rate updated");
        Ok(previous)
    }

    pub fn set_default<S: DaybookStore>(
        store: &mut S,
        fuel_type: impl Into<FuelType>,
        price: Decimal,
    ) -> CoreResult<()> {
        let fuel_type = fuel_type.into();
        Self::validate(&fuel_type, price)?;
        let mut rates = store.rates()?;
        rates.set_default(fuel_type, price);
        store.save_rates(rates)
    }

    pub fn resolve<S: DaybookStore>(
        store: &S,
        fuel_type: &FuelType,
        date: NaiveDate,
    ) -> CoreResult<Option<Decimal>> {
        Ok(store.rates()?.resolve(fuel_type, date))
    }

    /// Resolves a rate or fails with a validation error naming the fuel type.
    pub fn require(rates: &RateTimeline, fuel_type: &FuelType, date: NaiveDate) -> CoreResult<Decimal> {
        rates.resolve(fuel_type, date).ok_or_else(|| {
            CoreError::Validation(format!("No rate configured for {fuel_type} on {date}"))
        })
    }

    fn validate(fuel_type: &FuelType, rate: Decimal) -> CoreResult<()> {
        if fuel_type.is_empty() {
            return Err(CoreError::Validation("Fuel type is required".into()));
        }
        if rate <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "Rate for {fuel_type} must be positive"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[test]
    fn set_rate_rejects_non_positive_rates_and_blank_fuel() {
        let mut store = MemoryStore::new("Rates");
        assert!(matches!(
            RateService::set_rate(&mut store, "Petrol", day(1), dec!(0)),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            RateService::set_rate(&mut store, "  ", day(1), dec!(100)),
            Err(CoreError::Validation(_))
        ));
        assert!(store.as_snapshot().rates.fuel_types().is_empty());
    }

    #[test]
    fn set_rate_upserts_and_resolve_reads_back() {
        let mut store = MemoryStore::new("Rates");
        RateService::set_default(&mut store, "Diesel", dec!(90.46)).unwrap();
        assert_eq!(
            RateService::set_rate(&mut store, "Diesel", day(10), dec!(91)).unwrap(),
            None
        );
        assert_eq!(
            RateService::set_rate(&mut store, "Diesel", day(10), dec!(92)).unwrap(),
            Some(dec!(91))
        );
        let diesel = FuelType::new("Diesel");
        assert_eq!(RateService::resolve(&store, &diesel, day(9)).unwrap(), Some(dec!(90.46)));
        assert_eq!(RateService::resolve(&store, &diesel, day(11)).unwrap(), Some(dec!(92)));
        let err = RateService::require(&store.as_snapshot().rates, &FuelType::new("CNG"), day(1))
            .expect_err("no CNG rate");
        assert!(err.to_string().contains("CNG"));
    }
}
