use daybook_domain::{Customer, CustomerOwned, Payment, RecordId};

use crate::{
    storage::{DaybookStore, RecordStore},
    validation::{not_found, require_positive},
    CoreError, CoreResult,
};

/// Manually entered customer receipts. Auto-generated mirrors belong to the
/// cascade and cannot be created, edited or removed here.
pub struct PaymentService;

impl PaymentService {
    pub fn create<S: DaybookStore>(store: &mut S, mut payment: Payment) -> CoreResult<Payment> {
        if payment.auto_generated || payment.link.is_some() {
            return Err(CoreError::InvalidOperation(
                "Auto-generated payments are managed by their source record".into(),
            ));
        }
        payment.customer_name = Self::validate(store, &payment)?.name;
        let created = RecordStore::<Payment>::create(store, payment)?;
        tracing::info!(payment = %created.id, customer = %created.customer_name, amount = %created.amount, "payment received");
        Ok(created)
    }

    pub fn update<S: DaybookStore>(store: &mut S, id: RecordId, mut payment: Payment) -> CoreResult<Payment> {
        let existing = Self::manual(store, id)?;
        payment.customer_name = Self::validate(store, &payment)?.name;
        payment.auto_generated = false;
        payment.link = existing.link;
        RecordStore::<Payment>::update(store, id, payment)?.ok_or_else(|| not_found("payment", id))
    }

    pub fn delete<S: DaybookStore>(store: &mut S, id: RecordId) -> CoreResult<()> {
        Self::manual(store, id)?;
        if RecordStore::<Payment>::delete(store, id)? {
            Ok(())
        } else {
            Err(not_found("payment", id))
        }
    }

    /// Payments of `customer_id`, including legacy rows recorded by name only.
    pub fn list_for<S: DaybookStore>(store: &S, customer_id: RecordId) -> CoreResult<Vec<Payment>> {
        let customer = RecordStore::<Customer>::get(store, customer_id)?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))?;
        Ok(RecordStore::<Payment>::list(store)?
            .into_iter()
            .filter(|payment| payment.belongs_to(&customer))
            .collect())
    }

    fn manual<S: DaybookStore>(store: &S, id: RecordId) -> CoreResult<Payment> {
        let existing = RecordStore::<Payment>::get(store, id)?.ok_or_else(|| not_found("payment", id))?;
        if existing.auto_generated {
            return Err(CoreError::InvalidOperation(format!(
                "Payment {id} is generated from an MPP record; edit the source instead"
            )));
        }
        Ok(existing)
    }

    fn validate<S: DaybookStore>(store: &S, payment: &Payment) -> CoreResult<Customer> {
        require_positive(payment.amount, "Amount")?;
        let customer_id = payment
            .customer_id
            .ok_or_else(|| CoreError::Validation("Customer is required".into()))?;
        RecordStore::<Customer>::get(store, customer_id)?
            .ok_or_else(|| CoreError::CustomerNotFound(customer_id.to_string()))
    }
}
