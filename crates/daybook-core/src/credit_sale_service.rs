use daybook_domain::{CreditSale, Customer, Payment, RecordId};
use rust_decimal::Decimal;

use crate::{
    cascade::{load_context, AutoPaymentCascade, CascadeSource},
    rate_service::RateService,
    storage::{DaybookStore, RecordStore},
    validation::{not_found, require_positive, require_text},
    CoreError, CoreResult,
};

/// Credit sales and the MPP mirror each one may carry.
///
/// Every mutation runs the [`AutoPaymentCascade`] and rolls the credit sale
/// back when the mirror cannot be written.
pub struct CreditSaleService;

impl CreditSaleService {
    pub fn create<S: DaybookStore>(store: &mut S, credit: CreditSale) -> CoreResult<CreditSale> {
        let credit = Self::prepare(store, credit)?;
        let created = RecordStore::<CreditSale>::create(store, credit)?;

        let (mpp_customer, payments) = load_context(store)?;
        let action = AutoPaymentCascade::new(mpp_customer.as_ref(), &payments)
            .on_create(CascadeSource::Credit(&created));
        if let Err(err) = action.apply(store) {
            tracing::error!(credit = %created.id, %err, "cascade failed; rolling back credit sale");
            RecordStore::<CreditSale>::delete(store, created.id)?;
            return Err(err);
        }
        tracing::info!(credit = %created.id, customer = %created.customer_name, total = %created.total_amount, "credit sale recorded");
        Ok(created)
    }

    pub fn update<S: DaybookStore>(store: &mut S, id: RecordId, credit: CreditSale) -> CoreResult<CreditSale> {
        let previous = RecordStore::<CreditSale>::get(store, id)?.ok_or_else(|| not_found("credit sale", id))?;
        let credit = Self::prepare(store, credit)?;
        let updated = RecordStore::<CreditSale>::update(store, id, credit)?
            .ok_or_else(|| not_found("credit sale", id))?;

        let (mpp_customer, payments) = load_context(store)?;
        let action = AutoPaymentCascade::new(mpp_customer.as_ref(), &payments).on_update(
            CascadeSource::Credit(&previous),
            CascadeSource::Credit(&updated),
        );
        if let Err(err) = action.apply(store) {
            tracing::error!(credit = %id, %err, "cascade failed; restoring previous credit sale");
            RecordStore::<CreditSale>::update(store, id, previous)?;
            return Err(err);
        }
        Ok(updated)
    }

    /// Removes the mirror first, then the credit sale. The mirror is put back
    /// when the credit sale cannot be removed.
    pub fn delete<S: DaybookStore>(store: &mut S, id: RecordId) -> CoreResult<()> {
        let existing = RecordStore::<CreditSale>::get(store, id)?.ok_or_else(|| not_found("credit sale", id))?;
        let (mpp_customer, payments) = load_context(store)?;
        let action = AutoPaymentCascade::new(mpp_customer.as_ref(), &payments)
            .on_delete(CascadeSource::Credit(&existing));
        action.apply(store)?;

        match RecordStore::<CreditSale>::delete(store, id) {
            Ok(true) => {
                tracing::info!(credit = %id, "credit sale deleted");
                Ok(())
            }
            Ok(false) => {
                action.revert(store, None);
                Err(not_found("credit sale", id))
            }
            Err(err) => {
                action.revert(store, None);
                Err(err)
            }
        }
    }

    /// Payment mirroring `id`, if any.
    pub fn linked_payment<S: DaybookStore>(store: &S, id: RecordId) -> CoreResult<Option<Payment>> {
        Ok(RecordStore::<Payment>::list(store)?
            .into_iter()
            .find(|payment| payment.auto_generated && payment.linked_credit_id() == Some(id)))
    }

    fn prepare<S: DaybookStore>(store: &S, mut credit: CreditSale) -> CoreResult<CreditSale> {
        let customer_id = credit
            .customer_id
            .ok_or_else(|| CoreError::Validation("Customer is required".into()))?;
        let customer = RecordStore::<Customer>::get(store, customer_id)?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;
        credit.customer_name = customer.name;

        if credit.fuel_entries.is_empty()
            && credit.income_entries.is_empty()
            && credit.expense_entries.is_empty()
        {
            return Err(CoreError::Validation(
                "Credit sale needs at least one entry".into(),
            ));
        }

        let rates = store.rates()?;
        for entry in &mut credit.fuel_entries {
            require_text(entry.fuel_type.as_str(), "Fuel type")?;
            require_positive(entry.liters, "Liters")?;
            if entry.rate.is_zero() {
                entry.rate = RateService::require(&rates, &entry.fuel_type, credit.date)?;
            }
            require_positive(entry.rate, "Rate")?;
            entry.amount = entry.liters * entry.rate;
        }
        for item in credit.income_entries.iter().chain(&credit.expense_entries) {
            require_text(&item.description, "Description")?;
            require_positive(item.amount, "Amount")?;
        }

        credit.recompute_total();
        if credit.total_amount <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "Credit sale total must be positive, got {}",
                credit.total_amount
            )));
        }
        Ok(credit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CustomerService, MemoryStore};
    use chrono::NaiveDate;
    use daybook_domain::{FuelEntry, LineItem};
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn setup() -> (MemoryStore, Customer, Customer) {
        let mut store = MemoryStore::new("Credits");
        let mpp = CustomerService::add(&mut store, Customer::mpp("MPP-Unit", dec!(0))).unwrap();
        let xyz = CustomerService::add(&mut store, Customer::new("XYZ", dec!(0))).unwrap();
        (store, mpp, xyz)
    }

    #[test]
    fn tagged_credit_gets_exactly_one_mirror() {
        let (mut store, mpp, xyz) = setup();
        let credit = CreditSale::new(day(1), xyz.id, "XYZ")
            .with_fuel(FuelEntry::new("Petrol", dec!(10), dec!(100)))
            .with_income(LineItem::new("Oil", dec!(50)))
            .tagged(true);
        let created = CreditSaleService::create(&mut store, credit).unwrap();
        assert_eq!(created.total_amount, dec!(1050));

        let payments = &store.as_snapshot().payments;
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].customer_id, Some(mpp.id));
        assert_eq!(payments[0].amount, dec!(1000));
        assert_eq!(payments[0].linked_credit_id(), Some(created.id));

        CreditSaleService::delete(&mut store, created.id).unwrap();
        assert!(store.as_snapshot().payments.is_empty());
        assert!(store.as_snapshot().credit_sales.is_empty());
    }

    #[test]
    fn validation_rejects_unknown_customer_and_empty_sales() {
        let (mut store, _, xyz) = setup();
        let stranger = Customer::new("Stranger", dec!(0));
        let credit = CreditSale::new(day(1), stranger.id, "Stranger")
            .with_fuel(FuelEntry::new("Petrol", dec!(1), dec!(100)));
        assert!(matches!(
            CreditSaleService::create(&mut store, credit),
            Err(CoreError::CustomerNotFound(_))
        ));

        let empty = CreditSale::new(day(1), xyz.id, "XYZ");
        assert!(matches!(
            CreditSaleService::create(&mut store, empty),
            Err(CoreError::Validation(_))
        ));

        let zero_liters = CreditSale::new(day(1), xyz.id, "XYZ")
            .with_fuel(FuelEntry::new("Petrol", dec!(0), dec!(100)));
        assert!(CreditSaleService::create(&mut store, zero_liters).is_err());

        let negative_total = CreditSale::new(day(1), xyz.id, "XYZ")
            .with_fuel(FuelEntry::new("Petrol", dec!(1), dec!(10)))
            .with_expense(LineItem::new("Discount", dec!(50)));
        assert!(CreditSaleService::create(&mut store, negative_total).is_err());
        assert!(store.as_snapshot().credit_sales.is_empty());
    }

    #[test]
    fn entry_amounts_are_derived_and_zero_rates_resolved() {
        let (mut store, _, xyz) = setup();
        RateService::set_rate(&mut store, "Diesel", day(1), dec!(90)).unwrap();
        let mut entry = FuelEntry::new("Diesel", dec!(5), dec!(0));
        entry.amount = dec!(1);
        let mut credit = CreditSale::new(day(2), xyz.id, "whatever");
        credit.fuel_entries.push(entry);
        let created = CreditSaleService::create(&mut store, credit).unwrap();
        assert_eq!(created.fuel_entries[0].rate, dec!(90));
        assert_eq!(created.total_amount, dec!(450));
        assert_eq!(created.customer_name, "XYZ");
        assert!(store.as_snapshot().payments.is_empty());
    }

    #[test]
    fn untagging_and_reassigning_remove_the_mirror() {
        let (mut store, mpp, xyz) = setup();
        let credit = CreditSale::new(day(1), xyz.id, "XYZ")
            .with_fuel(FuelEntry::new("Petrol", dec!(10), dec!(100)))
            .tagged(true);
        let created = CreditSaleService::create(&mut store, credit).unwrap();

        let mut more = created.clone();
        more.fuel_entries[0].liters = dec!(12);
        CreditSaleService::update(&mut store, created.id, more.clone()).unwrap();
        let mirror = CreditSaleService::linked_payment(&store, created.id).unwrap().unwrap();
        assert_eq!(mirror.amount, dec!(1200));

        let untagged = more.clone().tagged(false);
        CreditSaleService::update(&mut store, created.id, untagged).unwrap();
        assert!(CreditSaleService::linked_payment(&store, created.id).unwrap().is_none());

        CreditSaleService::update(&mut store, created.id, more.clone()).unwrap();
        assert!(CreditSaleService::linked_payment(&store, created.id).unwrap().is_some());

        let mut reassigned = more;
        reassigned.customer_id = Some(mpp.id);
        CreditSaleService::update(&mut store, created.id, reassigned).unwrap();
        assert!(store.as_snapshot().payments.is_empty());
    }
}
