use daybook_domain::{FuelSale, RecordId};
use rust_decimal::Decimal;

use crate::{
    rate_service::RateService,
    storage::{DaybookStore, RecordStore},
    validation::{not_found, require_text},
    CoreError, CoreResult,
};

/// Nozzle readings. A zero rate is filled in from the rate timeline.
pub struct FuelSaleService;

impl FuelSaleService {
    pub fn create<S: DaybookStore>(store: &mut S, sale: FuelSale) -> CoreResult<FuelSale> {
        let sale = Self::prepare(store, sale)?;
        let created = RecordStore::<FuelSale>::create(store, sale)?;
        tracing::debug!(id = %created.id, nozzle = %created.nozzle, amount = %created.amount, "fuel sale recorded");
        Ok(created)
    }

    pub fn update<S: DaybookStore>(store: &mut S, id: RecordId, sale: FuelSale) -> CoreResult<FuelSale> {
        let sale = Self::prepare(store, sale)?;
        RecordStore::<FuelSale>::update(store, id, sale)?.ok_or_else(|| not_found("fuel sale", id))
    }

    pub fn delete<S: DaybookStore>(store: &mut S, id: RecordId) -> CoreResult<()> {
        if RecordStore::<FuelSale>::delete(store, id)? {
            Ok(())
        } else {
            Err(not_found("fuel sale", id))
        }
    }

    fn prepare<S: DaybookStore>(store: &S, mut sale: FuelSale) -> CoreResult<FuelSale> {
        require_text(sale.fuel_type.as_str(), "Fuel type")?;
        require_text(&sale.nozzle, "Nozzle")?;
        if sale.end_reading < sale.start_reading {
            return Err(CoreError::Validation(format!(
                "End reading {} is below start reading {}",
                sale.end_reading, sale.start_reading
            )));
        }
        if sale.rate < Decimal::ZERO {
            return Err(CoreError::Validation("Rate cannot be negative".into()));
        }
        if sale.rate.is_zero() {
            sale.rate = RateService::require(&store.rates()?, &sale.fuel_type, sale.date)?;
        }
        sale.recompute();
        Ok(sale)
    }
}
