//! Auto-generated payments that mirror MPP-tagged credit sales and
//! settlements onto the MPP-designated customer.
//!
//! The cascade itself is pure: it inspects the current payments and returns
//! the [`CascadeAction`] a record service must apply. Every tagged source not
//! owned by the MPP customer ends up with exactly one mirrored payment.

use chrono::NaiveDate;
use daybook_domain::{
    CreditSale, Customer, CustomerOwned, Payment, PaymentLink, SettlementRecord,
};
use rust_decimal::Decimal;

use crate::{
    storage::{DaybookStore, RecordStore},
    CoreResult,
};

/// A record that may be mirrored by an auto-generated payment.
#[derive(Debug, Clone, Copy)]
pub enum CascadeSource<'a> {
    Credit(&'a CreditSale),
    Settlement(&'a SettlementRecord),
}

impl CascadeSource<'_> {
    pub fn link(&self) -> PaymentLink {
        match self {
            CascadeSource::Credit(credit) => PaymentLink::Credit(credit.id),
            CascadeSource::Settlement(settlement) => PaymentLink::Settlement(settlement.id),
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            CascadeSource::Credit(credit) => credit.date,
            CascadeSource::Settlement(settlement) => settlement.date,
        }
    }

    pub fn is_mpp(&self) -> bool {
        match self {
            CascadeSource::Credit(credit) => credit.mpp,
            CascadeSource::Settlement(settlement) => settlement.mpp,
        }
    }

    /// Only the fuel portion of a credit sale is mirrored; attached income
    /// and expense lines stay with the outlet.
    pub fn mirrored_amount(&self) -> Decimal {
        match self {
            CascadeSource::Credit(credit) => credit.fuel_amount(),
            CascadeSource::Settlement(settlement) => settlement.amount,
        }
    }

    pub fn description(&self) -> String {
        match self {
            CascadeSource::Credit(credit) => {
                format!("MPP Credit Sale to {}", credit.customer_name)
            }
            CascadeSource::Settlement(settlement) => {
                let label = settlement.description.trim();
                let label = if label.is_empty() { "Settlement" } else { label };
                format!("MPP Settlement - {label}")
            }
        }
    }

    fn owned_by(&self, customer: &Customer) -> bool {
        match self {
            CascadeSource::Credit(credit) => credit.belongs_to(customer),
            CascadeSource::Settlement(_) => false,
        }
    }
}

/// Instruction returned by the cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeAction {
    None,
    Create(Payment),
    Update(Payment),
    Delete(Payment),
}

impl CascadeAction {
    pub fn is_none(&self) -> bool {
        matches!(self, CascadeAction::None)
    }

    /// Writes the instruction to the payment collection.
    pub fn apply<S: RecordStore<Payment> + ?Sized>(&self, store: &mut S) -> CoreResult<()> {
        match self {
            CascadeAction::None => Ok(()),
            CascadeAction::Create(payment) => {
                let created = store.create(payment.clone())?;
                tracing::info!(payment = %created.id, amount = %created.amount, "auto payment created");
                Ok(())
            }
            CascadeAction::Update(payment) => {
                match store.update(payment.id, payment.clone())? {
                    Some(_) => {
                        tracing::info!(payment = %payment.id, amount = %payment.amount, "auto payment updated")
                    }
                    None => tracing::warn!(payment = %payment.id, "auto payment vanished before update"),
                }
                Ok(())
            }
            CascadeAction::Delete(payment) => {
                if store.delete(payment.id)? {
                    tracing::info!(payment = %payment.id, "auto payment removed");
                } else {
                    tracing::warn!(payment = %payment.id, "auto payment already gone");
                }
                Ok(())
            }
        }
    }

    /// Best-effort inverse of [`CascadeAction::apply`], used when the source
    /// mutation fails after the mirror was written.
    pub fn revert<S: RecordStore<Payment> + ?Sized>(&self, store: &mut S, previous: Option<&Payment>) {
        let result = match (self, previous) {
            (CascadeAction::Create(payment), _) => store.delete(payment.id).map(|_| ()),
            (CascadeAction::Update(payment), Some(previous)) => {
                store.update(payment.id, previous.clone()).map(|_| ())
            }
            (CascadeAction::Delete(payment), _) => store.create(payment.clone()).map(|_| ()),
            _ => Ok(()),
        };
        if let Err(err) = result {
            tracing::error!(%err, "failed to revert auto payment change");
        }
    }
}

/// Loads what the cascade needs to decide: the MPP customer and every payment.
pub(crate) fn load_context<S: DaybookStore>(store: &S) -> CoreResult<(Option<Customer>, Vec<Payment>)> {
    let mpp_customer = RecordStore::<Customer>::list(store)?
        .into_iter()
        .find(|customer| customer.is_mpp_designated);
    let payments = RecordStore::<Payment>::list(store)?;
    Ok((mpp_customer, payments))
}

/// Reconciles the mirror of every credit sale and settlement with the current
/// MPP designation. Returns how many payments changed. When one write fails
/// the ones already applied are reverted.
pub(crate) fn resync_mirrors<S: DaybookStore>(store: &mut S) -> CoreResult<usize> {
    let (mpp_customer, payments) = load_context(store)?;
    let credits = RecordStore::<CreditSale>::list(store)?;
    let settlements = RecordStore::<SettlementRecord>::list(store)?;
    let cascade = AutoPaymentCascade::new(mpp_customer.as_ref(), &payments);
    let actions: Vec<CascadeAction> = credits
        .iter()
        .map(CascadeSource::Credit)
        .chain(settlements.iter().map(CascadeSource::Settlement))
        .map(|source| cascade.reconcile(source))
        .filter(|action| !action.is_none())
        .collect();

    for (applied, action) in actions.iter().enumerate() {
        if let Err(err) = action.apply(store) {
            tracing::error!(%err, "mirror resync failed; reverting {applied} change(s)");
            for done in actions[..applied].iter().rev() {
                let previous = match done {
                    CascadeAction::Update(payment) => {
                        payments.iter().find(|existing| existing.id == payment.id)
                    }
                    _ => None,
                };
                done.revert(store, previous);
            }
            return Err(err);
        }
    }
    if !actions.is_empty() {
        tracing::info!(
            mpp = mpp_customer.as_ref().map_or("none", |customer| customer.name.as_str()),
            changed = actions.len(),
            "auto payments resynced"
        );
    }
    Ok(actions.len())
}

pub struct AutoPaymentCascade<'a> {
    mpp_customer: Option<&'a Customer>,
    payments: &'a [Payment],
}

impl<'a> AutoPaymentCascade<'a> {
    pub fn new(mpp_customer: Option<&'a Customer>, payments: &'a [Payment]) -> Self {
        Self {
            mpp_customer,
            payments,
        }
    }

    /// The MPP customer a source would be mirrored to, if it qualifies.
    pub fn qualifies(&self, source: &CascadeSource<'_>) -> Option<&'a Customer> {
        let customer = self.mpp_customer?;
        let qualifies = source.is_mpp()
            && !source.owned_by(customer)
            && source.mirrored_amount() > Decimal::ZERO;
        qualifies.then_some(customer)
    }

    pub fn linked_payment(&self, link: PaymentLink) -> Option<&'a Payment> {
        self.payments.iter().find(|payment| payment.is_mirror_of(link))
    }

    pub fn on_create(&self, source: CascadeSource<'_>) -> CascadeAction {
        match self.qualifies(&source) {
            Some(customer) => CascadeAction::Create(Self::mirror(customer, &source)),
            None => CascadeAction::None,
        }
    }

    /// Brings the mirror in line with an edited source. A source that stops
    /// qualifying (untagged, reassigned to the MPP customer, no fuel left)
    /// loses its mirror.
    pub fn on_update(
        &self,
        previous: CascadeSource<'_>,
        current: CascadeSource<'_>,
    ) -> CascadeAction {
        let link = current.link();
        if self.linked_payment(link).is_none()
            && self.qualifies(&previous).is_some()
            && self.qualifies(&current).is_some()
        {
            tracing::warn!(%link, "mirrored payment missing for edited source; recreating");
        }
        self.reconcile(current)
    }

    /// Action that leaves `source` with exactly the mirror the current MPP
    /// designation calls for, whatever mirror it has now.
    pub fn reconcile(&self, source: CascadeSource<'_>) -> CascadeAction {
        match (self.linked_payment(source.link()), self.qualifies(&source)) {
            (Some(payment), Some(customer)) => {
                let mirror = Payment {
                    id: payment.id,
                    mode: payment.mode,
                    ..Self::mirror(customer, &source)
                };
                if &mirror == payment {
                    CascadeAction::None
                } else {
                    CascadeAction::Update(mirror)
                }
            }
            (None, Some(customer)) => CascadeAction::Create(Self::mirror(customer, &source)),
            (Some(payment), None) => CascadeAction::Delete(payment.clone()),
            (None, None) => CascadeAction::None,
        }
    }

    /// Mirror to remove before the source itself is deleted.
    pub fn on_delete(&self, source: CascadeSource<'_>) -> CascadeAction {
        let link = source.link();
        match self.linked_payment(link) {
            Some(payment) => CascadeAction::Delete(payment.clone()),
            None => {
                if self.qualifies(&source).is_some() {
                    tracing::warn!(%link, "no mirrored payment found for deleted source");
                }
                CascadeAction::None
            }
        }
    }

    fn mirror(customer: &Customer, source: &CascadeSource<'_>) -> Payment {
        Payment::auto_generated(
            customer.id,
            customer.name.clone(),
            source.mirrored_amount(),
            source.date(),
            source.link(),
            source.description(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_domain::{FuelEntry, LineItem, PaymentMode};
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn xyz_credit(xyz: &Customer) -> CreditSale {
        CreditSale::new(day(), xyz.id, xyz.name.clone())
            .with_fuel(FuelEntry::new("Petrol", dec!(10), dec!(100)))
            .with_income(LineItem::new("Oil", dec!(50)))
            .tagged(true)
    }

    #[test]
    fn create_mirrors_fuel_portion_only() {
        let mpp = Customer::mpp("MPP-Unit", dec!(0));
        let xyz = Customer::new("XYZ", dec!(0));
        let credit = xyz_credit(&xyz);
        let cascade = AutoPaymentCascade::new(Some(&mpp), &[]);

        let CascadeAction::Create(payment) = cascade.on_create(CascadeSource::Credit(&credit))
        else {
            panic!("expected a mirrored payment");
        };
        assert_eq!(payment.amount, dec!(1000));
        assert_eq!(payment.customer_id, Some(mpp.id));
        assert_eq!(payment.linked_credit_id(), Some(credit.id));
        assert_eq!(payment.mode, PaymentMode::Transfer);
        assert_eq!(payment.description.as_deref(), Some("MPP Credit Sale to XYZ"));
        assert!(payment.auto_generated);
    }

    #[test]
    fn nothing_is_mirrored_without_an_mpp_customer_or_for_its_own_credits() {
        let mpp = Customer::mpp("MPP-Unit", dec!(0));
        let credit = xyz_credit(&mpp);
        assert!(AutoPaymentCascade::new(Some(&mpp), &[])
            .on_create(CascadeSource::Credit(&credit))
            .is_none());

        let xyz = Customer::new("XYZ", dec!(0));
        let credit = xyz_credit(&xyz);
        assert!(AutoPaymentCascade::new(None, &[])
            .on_create(CascadeSource::Credit(&credit))
            .is_none());
    }

    #[test]
    fn settlement_mirror_uses_full_amount_and_default_label() {
        let mpp = Customer::mpp("MPP-Unit", dec!(0));
        let settlement = SettlementRecord::new(day(), "", dec!(750)).tagged(true);
        let cascade = AutoPaymentCascade::new(Some(&mpp), &[]);
        let CascadeAction::Create(payment) =
            cascade.on_create(CascadeSource::Settlement(&settlement))
        else {
            panic!("expected a mirrored payment");
        };
        assert_eq!(payment.amount, dec!(750));
        assert_eq!(payment.description.as_deref(), Some("MPP Settlement - Settlement"));
        assert_eq!(payment.linked_settlement_id(), Some(settlement.id));
    }

    #[test]
    fn update_follows_amount_and_untagging_deletes() {
        let mpp = Customer::mpp("MPP-Unit", dec!(0));
        let xyz = Customer::new("XYZ", dec!(0));
        let credit = xyz_credit(&xyz);
        let CascadeAction::Create(existing) = AutoPaymentCascade::new(Some(&mpp), &[])
            .on_create(CascadeSource::Credit(&credit))
        else {
            panic!("expected a mirrored payment");
        };
        let payments = vec![existing.clone()];
        let cascade = AutoPaymentCascade::new(Some(&mpp), &payments);

        let mut edited = credit.clone();
        edited.fuel_entries[0] = FuelEntry::new("Petrol", dec!(12), dec!(100));
        edited.recompute_total();
        match cascade.on_update(CascadeSource::Credit(&credit), CascadeSource::Credit(&edited)) {
            CascadeAction::Update(payment) => {
                assert_eq!(payment.id, existing.id);
                assert_eq!(payment.amount, dec!(1200));
            }
            other => panic!("unexpected action {other:?}"),
        }

        assert!(cascade
            .on_update(CascadeSource::Credit(&credit), CascadeSource::Credit(&credit))
            .is_none());

        let untagged = credit.clone().tagged(false);
        assert_eq!(
            cascade.on_update(CascadeSource::Credit(&credit), CascadeSource::Credit(&untagged)),
            CascadeAction::Delete(existing.clone())
        );
        assert_eq!(
            cascade.on_delete(CascadeSource::Credit(&credit)),
            CascadeAction::Delete(existing)
        );
    }

    #[test]
    fn missing_mirror_is_recreated_on_update_and_ignored_on_delete() {
        let mpp = Customer::mpp("MPP-Unit", dec!(0));
        let xyz = Customer::new("XYZ", dec!(0));
        let credit = xyz_credit(&xyz);
        let cascade = AutoPaymentCascade::new(Some(&mpp), &[]);
        assert!(matches!(
            cascade.on_update(CascadeSource::Credit(&credit), CascadeSource::Credit(&credit)),
            CascadeAction::Create(_)
        ));
        assert!(cascade.on_delete(CascadeSource::Credit(&credit)).is_none());
    }

    #[test]
    fn reconcile_moves_mirror_to_the_current_mpp_customer() {
        let old_mpp = Customer::new("MPP-Unit", dec!(0));
        let new_mpp = Customer::mpp("Other", dec!(0));
        let xyz = Customer::new("XYZ", dec!(0));
        let credit = xyz_credit(&xyz);
        let CascadeAction::Create(stale) = AutoPaymentCascade::new(Some(&old_mpp), &[])
            .on_create(CascadeSource::Credit(&credit))
        else {
            panic!("expected a mirrored payment");
        };
        let payments = vec![stale.clone()];

        match AutoPaymentCascade::new(Some(&new_mpp), &payments).reconcile(CascadeSource::Credit(&credit)) {
            CascadeAction::Update(payment) => {
                assert_eq!(payment.id, stale.id);
                assert_eq!(payment.customer_id, Some(new_mpp.id));
                assert_eq!(payment.customer_name, "Other");
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert_eq!(
            AutoPaymentCascade::new(None, &payments).reconcile(CascadeSource::Credit(&credit)),
            CascadeAction::Delete(stale.clone())
        );
        assert_eq!(
            AutoPaymentCascade::new(Some(&xyz_as_mpp(&xyz)), &payments)
                .reconcile(CascadeSource::Credit(&credit)),
            CascadeAction::Delete(stale)
        );
    }

    fn xyz_as_mpp(xyz: &Customer) -> Customer {
        Customer {
            is_mpp_designated: true,
            ..xyz.clone()
        }
    }
}
