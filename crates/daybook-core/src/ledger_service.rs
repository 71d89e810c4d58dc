//! Per-customer running-balance ledgers.

use chrono::NaiveDate;
use daybook_domain::{
    CreditSale, Customer, CustomerOwned, DateRange, DaybookSnapshot, Displayable, Payment,
    RecordId,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::reconcile_service::ReconcileService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LedgerEntryKind {
    CreditSale,
    Payment,
    AutoMppPayment,
    MppCash,
}

/// One line of a customer ledger. `outstanding` is the balance after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub kind: LedgerEntryKind,
    pub description: String,
    pub credit: Decimal,
    pub received: Decimal,
    pub outstanding: Decimal,
    pub source_id: Option<RecordId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerLedger {
    pub customer_id: RecordId,
    pub customer_name: String,
    pub range: DateRange,
    pub is_mpp: bool,
    pub opening_balance: Decimal,
    pub rows: Vec<LedgerRow>,
    pub total_credit: Decimal,
    pub total_received: Decimal,
    pub closing_balance: Decimal,
}

impl CustomerLedger {
    fn empty(customer_id: RecordId, range: DateRange) -> Self {
        Self {
            customer_id,
            customer_name: String::new(),
            range,
            is_mpp: false,
            opening_balance: Decimal::ZERO,
            rows: Vec::new(),
            total_credit: Decimal::ZERO,
            total_received: Decimal::ZERO,
            closing_balance: Decimal::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct LedgerBuilder;

impl LedgerBuilder {
    /// Builds the ledger of `customer_id` over `range`. Unknown customers
    /// yield an empty ledger.
    pub fn generate(
        snapshot: &DaybookSnapshot,
        customer_id: RecordId,
        range: DateRange,
    ) -> CustomerLedger {
        let Some(customer) = snapshot.customer(customer_id) else {
            tracing::debug!(%customer_id, "ledger requested for unknown customer");
            return CustomerLedger::empty(customer_id, range);
        };

        let rows = if customer.is_mpp_designated {
            Self::mpp_rows(snapshot, customer, range)
        } else {
            Self::regular_rows(snapshot, customer, range)
        };
        Self::assemble(customer, range, rows)
    }

    pub fn generate_by_name(
        snapshot: &DaybookSnapshot,
        name: &str,
        range: DateRange,
    ) -> Option<CustomerLedger> {
        let customer = snapshot.customer_by_name(name)?;
        Some(Self::generate(snapshot, customer.id, range))
    }

    fn regular_rows(
        snapshot: &DaybookSnapshot,
        customer: &Customer,
        range: DateRange,
    ) -> Vec<LedgerRow> {
        let credits = snapshot
            .credit_sales
            .iter()
            .filter(|credit| credit.belongs_to(customer) && range.includes(*credit))
            .map(Self::credit_row);
        let payments = Self::payment_rows(snapshot, customer, range);
        credits.chain(payments).collect()
    }

    fn mpp_rows(snapshot: &DaybookSnapshot, customer: &Customer, range: DateRange) -> Vec<LedgerRow> {
        let mut rows: Vec<LedgerRow> = snapshot
            .credit_sales
            .iter()
            .filter(|credit| !credit.mpp && credit.belongs_to(customer) && range.includes(*credit))
            .map(Self::credit_row)
            .collect();

        let mpp_cash = ReconcileService::mpp_cash(snapshot, range);
        if !mpp_cash.is_zero() {
            let (credit, received) = if mpp_cash > Decimal::ZERO {
                (Decimal::ZERO, mpp_cash)
            } else {
                (mpp_cash.abs(), Decimal::ZERO)
            };
            rows.push(LedgerRow {
                date: range.to,
                kind: LedgerEntryKind::MppCash,
                description: "MPP Cash".into(),
                credit,
                received,
                outstanding: Decimal::ZERO,
                source_id: None,
            });
        }

        rows.extend(Self::payment_rows(snapshot, customer, range));
        rows
    }

    fn payment_rows<'a>(
        snapshot: &'a DaybookSnapshot,
        customer: &'a Customer,
        range: DateRange,
    ) -> impl Iterator<Item = LedgerRow> + 'a {
        snapshot
            .payments
            .iter()
            .filter(move |payment| payment.belongs_to(customer) && range.includes(*payment))
            .map(Self::payment_row)
    }

    fn credit_row(credit: &CreditSale) -> LedgerRow {
        LedgerRow {
            date: credit.date,
            kind: LedgerEntryKind::CreditSale,
            description: credit.display_label(),
            credit: credit.total_amount,
            received: Decimal::ZERO,
            outstanding: Decimal::ZERO,
            source_id: Some(credit.id),
        }
    }

    fn payment_row(payment: &Payment) -> LedgerRow {
        let kind = if payment.auto_generated {
            LedgerEntryKind::AutoMppPayment
        } else {
            LedgerEntryKind::Payment
        };
        LedgerRow {
            date: payment.date,
            kind,
            description: payment.display_label(),
            credit: Decimal::ZERO,
            received: payment.amount,
            outstanding: Decimal::ZERO,
            source_id: Some(payment.id),
        }
    }

    /// Sorts rows by date (stable, so same-day rows keep group then
    /// insertion order) and threads the running balance through them.
    fn assemble(customer: &Customer, range: DateRange, mut rows: Vec<LedgerRow>) -> CustomerLedger {
        rows.sort_by_key(|row| row.date);

        let mut balance = customer.starting_balance;
        let mut total_credit = Decimal::ZERO;
        let mut total_received = Decimal::ZERO;
        for row in &mut rows {
            balance += row.credit - row.received;
            total_credit += row.credit;
            total_received += row.received;
            row.outstanding = balance;
        }

        CustomerLedger {
            customer_id: customer.id,
            customer_name: customer.name.clone(),
            range,
            is_mpp: customer.is_mpp_designated,
            opening_balance: customer.starting_balance,
            rows,
            total_credit,
            total_received,
            closing_balance: balance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_domain::{FuelEntry, FuelSale, PaymentMode, SettlementRecord};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn credit(customer: &Customer, date: NaiveDate, amount: Decimal) -> CreditSale {
        CreditSale::new(date, customer.id, customer.name.clone())
            .with_fuel(FuelEntry::new("Petrol", dec!(1), amount))
    }

    #[test]
    fn regular_ledger_runs_balance_from_starting_balance() {
        let mut snapshot = DaybookSnapshot::new("Ledger");
        let abc = Customer::new("ABC", dec!(0));
        snapshot.credit_sales.push(credit(&abc, day(1), dec!(1000)));
        snapshot.payments.push(Payment::new(abc.id, "ABC", dec!(400), day(3), PaymentMode::Cash));
        snapshot.payments.push(Payment::new(abc.id, "ABC", dec!(50), day(9), PaymentMode::Cash));
        snapshot.customers.push(abc.clone());

        let ledger = LedgerBuilder::generate(&snapshot, abc.id, DateRange::new(day(1), day(3)).unwrap());
        let balances: Vec<_> = ledger.rows.iter().map(|r| (r.credit, r.received, r.outstanding)).collect();
        assert_eq!(
            balances,
            vec![(dec!(1000), dec!(0), dec!(1000)), (dec!(0), dec!(400), dec!(600))]
        );
        assert_eq!(ledger.rows[0].description, "Credit Sale - Petrol 1L");
        assert_eq!(ledger.rows[1].description, "Payment Received");
        assert_eq!(ledger.closing_balance, dec!(600));
        assert!(!ledger.is_mpp);
    }

    #[test]
    fn unknown_customer_gives_empty_ledger() {
        let snapshot = DaybookSnapshot::new("Ledger");
        let ledger = LedgerBuilder::generate(&snapshot, Uuid::new_v4(), DateRange::single(day(1)));
        assert!(ledger.is_empty());
        assert_eq!(ledger.closing_balance, Decimal::ZERO);
    }

    #[test]
    fn legacy_credit_without_id_matches_by_name() {
        let mut snapshot = DaybookSnapshot::new("Ledger");
        let abc = Customer::new("ABC", dec!(100));
        let mut legacy = credit(&abc, day(2), dec!(250));
        legacy.customer_id = None;
        legacy.customer_name = " ABC ".into();
        snapshot.credit_sales.push(legacy);
        snapshot.customers.push(abc.clone());

        let ledger = LedgerBuilder::generate(&snapshot, abc.id, DateRange::single(day(2)));
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.closing_balance, dec!(350));
    }

    #[test]
    fn legacy_payment_without_id_matches_by_name() {
        let mut snapshot = DaybookSnapshot::new("Ledger");
        let abc = Customer::new("ABC", dec!(0));
        snapshot.credit_sales.push(credit(&abc, day(1), dec!(1000)));
        let mut legacy = Payment::new(abc.id, "ABC", dec!(400), day(3), PaymentMode::Cash);
        legacy.customer_id = None;
        snapshot.payments.push(legacy);
        let mut stranger = Payment::new(abc.id, "XYZ", dec!(90), day(3), PaymentMode::Cash);
        stranger.customer_id = None;
        snapshot.payments.push(stranger);
        snapshot.customers.push(abc.clone());

        let ledger = LedgerBuilder::generate(&snapshot, abc.id, DateRange::new(day(1), day(3)).unwrap());
        assert_eq!(ledger.rows.len(), 2);
        assert_eq!(ledger.rows[1].kind, LedgerEntryKind::Payment);
        assert_eq!(ledger.rows[1].description, "Payment Received");
        assert_eq!(ledger.closing_balance, dec!(600));
    }

    #[test]
    fn payment_rows_keep_their_own_descriptions() {
        let mut snapshot = DaybookSnapshot::new("Ledger");
        let mpp = Customer::mpp("MPP-Unit", dec!(0));
        let xyz = Customer::new("XYZ", dec!(0));
        let sale = credit(&xyz, day(2), dec!(500)).tagged(true);
        let mut mirror = Payment::auto_generated(
            mpp.id,
            "MPP-Unit",
            dec!(500),
            day(2),
            daybook_domain::PaymentLink::Credit(sale.id),
            "MPP Credit Sale to XYZ",
        );
        snapshot.payments.push(mirror.clone());
        mirror.id = Uuid::new_v4();
        mirror.description = None;
        snapshot.payments.push(mirror);
        snapshot.credit_sales.push(sale);
        snapshot.customers.push(mpp.clone());
        snapshot.customers.push(xyz);

        let ledger = LedgerBuilder::generate(&snapshot, mpp.id, DateRange::single(day(2)));
        let labels: Vec<_> = ledger
            .rows
            .iter()
            .filter(|row| row.kind == LedgerEntryKind::AutoMppPayment)
            .map(|row| row.description.as_str())
            .collect();
        assert_eq!(labels, vec!["MPP Credit Sale to XYZ", "MPP Transaction"]);
    }

    #[test]
    fn mpp_ledger_has_one_cash_row_at_range_end_and_lists_auto_payments() {
        let mut snapshot = DaybookSnapshot::new("Ledger");
        let mpp = Customer::mpp("MPP-Unit", dec!(0));
        let xyz = Customer::new("XYZ", dec!(0));
        snapshot
            .fuel_sales
            .push(FuelSale::new(day(1), "M1", "Diesel", dec!(0), dec!(100), dec!(90)).tagged(true));
        snapshot
            .settlements
            .push(SettlementRecord::new(day(2), "UPI", dec!(1000)).tagged(true));
        snapshot.credit_sales.push(credit(&mpp, day(2), dec!(300)));
        snapshot.credit_sales.push(credit(&mpp, day(2), dec!(999)).tagged(true));
        snapshot.payments.push(Payment::auto_generated(
            mpp.id,
            "MPP-Unit",
            dec!(1000),
            day(2),
            daybook_domain::PaymentLink::Settlement(snapshot.settlements[0].id),
            "MPP Settlement - UPI",
        ));
        snapshot.customers.push(mpp.clone());
        snapshot.customers.push(xyz);

        let ledger = LedgerBuilder::generate(&snapshot, mpp.id, DateRange::new(day(1), day(3)).unwrap());
        assert!(ledger.is_mpp);
        let kinds: Vec<_> = ledger.rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LedgerEntryKind::CreditSale,
                LedgerEntryKind::AutoMppPayment,
                LedgerEntryKind::MppCash
            ]
        );
        // 9000 - 999 - 1000
        let cash_row = &ledger.rows[2];
        assert_eq!(cash_row.date, day(3));
        assert_eq!(cash_row.received, dec!(7001));
        assert_eq!(ledger.rows[1].description, "MPP Settlement - UPI");
        assert_eq!(ledger.closing_balance, dec!(300) - dec!(1000) - dec!(7001));
    }

    #[test]
    fn negative_mpp_cash_posts_as_credit_and_zero_posts_nothing() {
        let mut snapshot = DaybookSnapshot::new("Ledger");
        let mpp = Customer::mpp("MPP-Unit", dec!(0));
        snapshot
            .settlements
            .push(SettlementRecord::new(day(1), "Card", dec!(200)).tagged(true));
        snapshot.customers.push(mpp.clone());

        let ledger = LedgerBuilder::generate(&snapshot, mpp.id, DateRange::single(day(1)));
        assert_eq!(ledger.rows.len(), 1);
        assert_eq!(ledger.rows[0].credit, dec!(200));
        assert_eq!(ledger.closing_balance, dec!(200));

        let quiet = LedgerBuilder::generate(&snapshot, mpp.id, DateRange::single(day(5)));
        assert!(quiet.is_empty());
    }
}
