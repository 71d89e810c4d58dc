use daybook_domain::{CreditSale, Customer, CustomerOwned, Payment, RecordId};
use rust_decimal::Decimal;

use crate::{
    cascade::resync_mirrors,
    storage::{DaybookStore, RecordStore},
    validation::require_text,
    CoreError, CoreResult,
};

/// Partial edit of a customer; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
    pub name: Option<String>,
    pub starting_balance: Option<Decimal>,
    pub is_mpp_designated: Option<bool>,
}

/// Customer records. Changing which customer is MPP-designated moves every
/// auto-generated mirror payment along with the designation.
pub struct CustomerService;

impl CustomerService {
    pub fn add<S: DaybookStore>(store: &mut S, mut customer: Customer) -> CoreResult<Customer> {
        customer.name = customer.name.trim().to_string();
        require_text(&customer.name, "Customer name")?;
        let customers = RecordStore::<Customer>::list(store)?;
        Self::validate_name(&customers, None, &customer.name)?;
        if customer.is_mpp_designated {
            Self::validate_single_mpp(&customers, None)?;
        }
        let created = RecordStore::<Customer>::create(store, customer)?;
        if created.is_mpp_designated {
            if let Err(err) = resync_mirrors(store) {
                RecordStore::<Customer>::delete(store, created.id)?;
                return Err(err);
            }
        }
        tracing::info!(customer = %created.name, mpp = created.is_mpp_designated, "customer added");
        Ok(created)
    }

    pub fn update<S: DaybookStore>(
        store: &mut S,
        id: RecordId,
        changes: CustomerChanges,
    ) -> CoreResult<Customer> {
        let customers = RecordStore::<Customer>::list(store)?;
        let mut customer = customers
            .iter()
            .find(|customer| customer.id == id)
            .cloned()
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()))?;
        let previous = customer.clone();

        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            require_text(&name, "Customer name")?;
            Self::validate_name(&customers, Some(id), &name)?;
            customer.name = name;
        }
        if let Some(balance) = changes.starting_balance {
            customer.starting_balance = balance;
        }
        if let Some(designated) = changes.is_mpp_designated {
            if designated {
                Self::validate_single_mpp(&customers, Some(id))?;
            }
            customer.is_mpp_designated = designated;
        }

        // Mirrors carry the MPP customer's id and name.
        let mirrors_affected = previous.is_mpp_designated != customer.is_mpp_designated
            || (customer.is_mpp_designated && previous.name != customer.name);
        let updated = RecordStore::<Customer>::update(store, id, customer)?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()))?;
        if mirrors_affected {
            if let Err(err) = resync_mirrors(store) {
                tracing::error!(customer = %id, %err, "mirror resync failed; restoring customer");
                RecordStore::<Customer>::update(store, id, previous)?;
                return Err(err);
            }
        }
        Ok(updated)
    }

    /// Marks `id` as the MPP customer. A second designation is rejected, not
    /// moved over; clear the current one first.
    pub fn designate_mpp<S: DaybookStore>(store: &mut S, id: RecordId) -> CoreResult<Customer> {
        Self::update(
            store,
            id,
            CustomerChanges {
                is_mpp_designated: Some(true),
                ..CustomerChanges::default()
            },
        )
    }

    /// Removes a customer that no credit sale or payment references.
    pub fn remove<S: DaybookStore>(store: &mut S, id: RecordId) -> CoreResult<()> {
        let customer = RecordStore::<Customer>::get(store, id)?
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()))?;
        let referenced = RecordStore::<CreditSale>::list(store)?
            .iter()
            .any(|credit| credit.belongs_to(&customer))
            || RecordStore::<Payment>::list(store)?
                .iter()
                .any(|payment| payment.belongs_to(&customer));
        if referenced {
            return Err(CoreError::InvalidOperation(format!(
                "Customer `{}` has credit sales or payments",
                customer.name
            )));
        }
        RecordStore::<Customer>::delete(store, id)?;
        tracing::info!(customer = %customer.name, "customer removed");
        Ok(())
    }

    pub fn list<S: DaybookStore>(store: &S) -> CoreResult<Vec<Customer>> {
        RecordStore::<Customer>::list(store)
    }

    fn validate_name(customers: &[Customer], exclude: Option<RecordId>, candidate: &str) -> CoreResult<()> {
        let normalized = candidate.trim().to_lowercase();
        let duplicate = customers.iter().any(|customer| {
            customer.normalized_name() == normalized && exclude.map_or(true, |id| customer.id != id)
        });
        if duplicate {
            Err(CoreError::Validation(format!(
                "Customer `{candidate}` already exists"
            )))
        } else {
            Ok(())
        }
    }

    fn validate_single_mpp(customers: &[Customer], exclude: Option<RecordId>) -> CoreResult<()> {
        let existing = customers
            .iter()
            .find(|customer| customer.is_mpp_designated && Some(customer.id) != exclude);
        match existing {
            Some(customer) => Err(CoreError::InvariantViolation(format!(
                "Only one MPP customer is allowed; `{}` is already designated",
                customer.name
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CreditSaleService, MemoryStore, SettlementService};
    use chrono::NaiveDate;
    use daybook_domain::{FuelEntry, PaymentMode, SettlementRecord};
    use rust_decimal_macros::dec;

    fn tagged_credit(customer: &Customer) -> CreditSale {
        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        CreditSale::new(date, customer.id, customer.name.clone())
            .with_fuel(FuelEntry::new("Petrol", dec!(10), dec!(100)))
            .tagged(true)
    }

    fn clear_mpp(store: &mut MemoryStore, id: RecordId) {
        CustomerService::update(
            store,
            id,
            CustomerChanges {
                is_mpp_designated: Some(false),
                ..CustomerChanges::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn add_rejects_blank_and_duplicate_names() {
        let mut store = MemoryStore::new("Customers");
        CustomerService::add(&mut store, Customer::new("ABC", dec!(0))).unwrap();
        assert!(matches!(
            CustomerService::add(&mut store, Customer::new("  abc ", dec!(0))),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            CustomerService::add(&mut store, Customer::new("   ", dec!(0))),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn second_mpp_designation_is_rejected() {
        let mut store = MemoryStore::new("Customers");
        CustomerService::add(&mut store, Customer::mpp("MPP-Unit", dec!(0))).unwrap();
        let other = CustomerService::add(&mut store, Customer::new("Other", dec!(0))).unwrap();

        let err = CustomerService::designate_mpp(&mut store, other.id).expect_err("second MPP");
        assert!(matches!(err, CoreError::InvariantViolation(_)));
        assert!(err.to_string().contains("Only one MPP customer is allowed"));
        assert!(matches!(
            CustomerService::add(&mut store, Customer::mpp("Another", dec!(0))),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn update_changes_name_and_balance() {
        let mut store = MemoryStore::new("Customers");
        let abc = CustomerService::add(&mut store, Customer::new("ABC", dec!(0))).unwrap();
        let updated = CustomerService::update(
            &mut store,
            abc.id,
            CustomerChanges {
                name: Some("ABC Transport".into()),
                starting_balance: Some(dec!(150)),
                ..CustomerChanges::default()
            },
        )
        .unwrap();
        assert_eq!(updated.name, "ABC Transport");
        assert_eq!(updated.starting_balance, dec!(150));
    }

    #[test]
    fn remove_is_refused_while_payments_reference_customer() {
        let mut store = MemoryStore::new("Customers");
        let abc = CustomerService::add(&mut store, Customer::new("ABC", dec!(0))).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        RecordStore::<Payment>::create(
            &mut store,
            Payment::new(abc.id, "ABC", dec!(10), date, PaymentMode::Cash),
        )
        .unwrap();
        assert!(matches!(
            CustomerService::remove(&mut store, abc.id),
            Err(CoreError::InvalidOperation(_))
        ));

        let idle = CustomerService::add(&mut store, Customer::new("Idle", dec!(0))).unwrap();
        CustomerService::remove(&mut store, idle.id).unwrap();
        assert_eq!(CustomerService::list(&store).unwrap().len(), 1);
    }

    #[test]
    fn moving_the_designation_moves_existing_mirrors() {
        let mut store = MemoryStore::new("Customers");
        let unit = CustomerService::add(&mut store, Customer::mpp("MPP-Unit", dec!(0))).unwrap();
        let other = CustomerService::add(&mut store, Customer::new("Other", dec!(0))).unwrap();
        let xyz = CustomerService::add(&mut store, Customer::new("XYZ", dec!(0))).unwrap();
        let credit = CreditSaleService::create(&mut store, tagged_credit(&xyz)).unwrap();
        let settlement = SettlementService::create(
            &mut store,
            SettlementRecord::new(credit.date, "PhonePe", dec!(300)).tagged(true),
        )
        .unwrap();
        let before = CreditSaleService::linked_payment(&store, credit.id).unwrap().unwrap();
        assert_eq!(before.customer_id, Some(unit.id));

        clear_mpp(&mut store, unit.id);
        assert!(RecordStore::<Payment>::list(&store).unwrap().is_empty());

        CustomerService::designate_mpp(&mut store, other.id).unwrap();
        let after = CreditSaleService::linked_payment(&store, credit.id).unwrap().unwrap();
        assert_eq!(after.customer_id, Some(other.id));
        assert_eq!(after.customer_name, "Other");
        assert_eq!(after.amount, dec!(1000));
        let settled = SettlementService::linked_payment(&store, settlement.id).unwrap().unwrap();
        assert_eq!(settled.customer_id, Some(other.id));
        assert_eq!(RecordStore::<Payment>::list(&store).unwrap().len(), 2);
    }

    #[test]
    fn late_designation_mirrors_earlier_tagged_credits() {
        let mut store = MemoryStore::new("Customers");
        let xyz = CustomerService::add(&mut store, Customer::new("XYZ", dec!(0))).unwrap();
        let credit = CreditSaleService::create(&mut store, tagged_credit(&xyz)).unwrap();
        assert!(CreditSaleService::linked_payment(&store, credit.id).unwrap().is_none());

        let unit = CustomerService::add(&mut store, Customer::mpp("MPP-Unit", dec!(0))).unwrap();
        let mirror = CreditSaleService::linked_payment(&store, credit.id)
            .unwrap()
            .expect("mirror after designation");
        assert_eq!(mirror.customer_id, Some(unit.id));
        assert_eq!(mirror.description.as_deref(), Some("MPP Credit Sale to XYZ"));
    }

    #[test]
    fn designating_the_owner_of_tagged_credits_drops_their_mirrors() {
        let mut store = MemoryStore::new("Customers");
        let unit = CustomerService::add(&mut store, Customer::mpp("MPP-Unit", dec!(0))).unwrap();
        let xyz = CustomerService::add(&mut store, Customer::new("XYZ", dec!(0))).unwrap();
        let credit = CreditSaleService::create(&mut store, tagged_credit(&xyz)).unwrap();
        assert!(CreditSaleService::linked_payment(&store, credit.id).unwrap().is_some());

        clear_mpp(&mut store, unit.id);
        CustomerService::designate_mpp(&mut store, xyz.id).unwrap();
        assert!(CreditSaleService::linked_payment(&store, credit.id).unwrap().is_none());
        assert!(RecordStore::<Payment>::list(&store).unwrap().is_empty());
    }

    #[test]
    fn renaming_the_mpp_customer_renames_its_mirrors() {
        let mut store = MemoryStore::new("Customers");
        let unit = CustomerService::add(&mut store, Customer::mpp("MPP-Unit", dec!(0))).unwrap();
        let xyz = CustomerService::add(&mut store, Customer::new("XYZ", dec!(0))).unwrap();
        let credit = CreditSaleService::create(&mut store, tagged_credit(&xyz)).unwrap();

        CustomerService::update(
            &mut store,
            unit.id,
            CustomerChanges {
                name: Some("Mobile Unit".into()),
                ..CustomerChanges::default()
            },
        )
        .unwrap();
        let mirror = CreditSaleService::linked_payment(&store, credit.id).unwrap().unwrap();
        assert_eq!(mirror.customer_name, "Mobile Unit");
    }
}
