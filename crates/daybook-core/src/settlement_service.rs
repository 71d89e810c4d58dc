use daybook_domain::{Payment, RecordId, SettlementRecord};

use crate::{
    cascade::{load_context, AutoPaymentCascade, CascadeSource},
    storage::{DaybookStore, RecordStore},
    validation::{not_found, require_positive, require_text},
    CoreResult,
};

/// Bank and wallet settlements. Tagged settlements are mirrored onto the MPP
/// customer the same way tagged credit sales are.
pub struct SettlementService;

impl SettlementService {
    pub fn create<S: DaybookStore>(store: &mut S, settlement: SettlementRecord) -> CoreResult<SettlementRecord> {
        Self::validate(&settlement)?;
        let created = RecordStore::<SettlementRecord>::create(store, settlement)?;

        let (mpp_customer, payments) = load_context(store)?;
        let action = AutoPaymentCascade::new(mpp_customer.as_ref(), &payments)
            .on_create(CascadeSource::Settlement(&created));
        if let Err(err) = action.apply(store) {
            tracing::error!(settlement = %created.id, %err, "cascade failed; rolling back settlement");
            RecordStore::<SettlementRecord>::delete(store, created.id)?;
            return Err(err);
        }
        tracing::info!(settlement = %created.id, amount = %created.amount, mpp = created.mpp, "settlement recorded");
        Ok(created)
    }

    pub fn update<S: DaybookStore>(
        store: &mut S,
        id: RecordId,
        settlement: SettlementRecord,
    ) -> CoreResult<SettlementRecord> {
        Self::validate(&settlement)?;
        let previous = RecordStore::<SettlementRecord>::get(store, id)?
            .ok_or_else(|| not_found("settlement", id))?;
        let updated = RecordStore::<SettlementRecord>::update(store, id, settlement)?
            .ok_or_else(|| not_found("settlement", id))?;

        let (mpp_customer, payments) = load_context(store)?;
        let action = AutoPaymentCascade::new(mpp_customer.as_ref(), &payments).on_update(
            CascadeSource::Settlement(&previous),
            CascadeSource::Settlement(&updated),
        );
        if let Err(err) = action.apply(store) {
            tracing::error!(settlement = %id, %err, "cascade failed; restoring previous settlement");
            RecordStore::<SettlementRecord>::update(store, id, previous)?;
            return Err(err);
        }
        Ok(updated)
    }

    pub fn delete<S: DaybookStore>(store: &mut S, id: RecordId) -> CoreResult<()> {
        let existing = RecordStore::<SettlementRecord>::get(store, id)?
            .ok_or_else(|| not_found("settlement", id))?;
        let (mpp_customer, payments) = load_context(store)?;
        let action = AutoPaymentCascade::new(mpp_customer.as_ref(), &payments)
            .on_delete(CascadeSource::Settlement(&existing));
        action.apply(store)?;

        match RecordStore::<SettlementRecord>::delete(store, id) {
            Ok(true) => Ok(()),
            Ok(false) => {
                action.revert(store, None);
                Err(not_found("settlement", id))
            }
            Err(err) => {
                action.revert(store, None);
                Err(err)
            }
        }
    }

    pub fn linked_payment<S: DaybookStore>(store: &S, id: RecordId) -> CoreResult<Option<Payment>> {
        Ok(RecordStore::<Payment>::list(store)?
            .into_iter()
            .find(|payment| payment.auto_generated && payment.linked_settlement_id() == Some(id)))
    }

    fn validate(settlement: &SettlementRecord) -> CoreResult<()> {
        require_text(&settlement.description, "Description")?;
        require_positive(settlement.amount, "Amount")
    }
}
