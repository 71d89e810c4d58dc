//! Cash positions derived from the day-book streams.

use std::collections::BTreeMap;

use daybook_domain::{DateRange, DaybookSnapshot, FuelType};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::partition::{RecordSet, TransactionPartitioner};

/// Sums of every stream that feeds the cash formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamTotals {
    pub fuel_sales: Decimal,
    pub fuel_liters: Decimal,
    pub credit_total: Decimal,
    pub credit_liters: Decimal,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub settlement_total: Decimal,
}

impl StreamTotals {
    /// `fuel_sales − credit_total − expense_total + income_total − settlement_total`
    pub fn cash(&self) -> Decimal {
        self.fuel_sales - self.credit_total - self.expense_total + self.income_total
            - self.settlement_total
    }

    pub fn has_activity(&self) -> bool {
        !(self.fuel_sales.is_zero()
            && self.credit_total.is_zero()
            && self.income_total.is_zero()
            && self.expense_total.is_zero()
            && self.settlement_total.is_zero())
    }
}

pub struct CashReconciler;

impl CashReconciler {
    /// Totals one set of records. Income and expense lines attached to credit
    /// sales count toward the sundry totals.
    pub fn reconcile(records: &RecordSet<'_>) -> StreamTotals {
        let mut totals = StreamTotals::default();
        for sale in records.sales.iter().filter(|sale| sale.is_cash()) {
            totals.fuel_sales += sale.amount;
            totals.fuel_liters += sale.liters;
        }
        for credit in &records.credits {
            totals.credit_total += credit.total_amount;
            totals.credit_liters += credit.total_liters();
            totals.income_total += credit.income_amount();
            totals.expense_total += credit.expense_amount();
        }
        totals.income_total += records.income.iter().map(|r| r.amount).sum::<Decimal>();
        totals.expense_total += records.expenses.iter().map(|r| r.amount).sum::<Decimal>();
        totals.settlement_total = records.settlements.iter().map(|r| r.amount).sum();
        totals
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FuelTypeTotals {
    pub liters: Decimal,
    pub amount: Decimal,
}

/// Dashboard figures for one date range.
#[derive(Debug, Clone, Serialize)]
pub struct DaybookStatistics {
    pub range: DateRange,
    pub regular: StreamTotals,
    pub mpp: StreamTotals,
    pub cash_in_hand: Decimal,
    pub mpp_cash: Decimal,
    pub total_available_cash: Decimal,
    pub has_mpp_data: bool,
    pub fuel_by_type: BTreeMap<FuelType, FuelTypeTotals>,
    pub total_liters: Decimal,
}

pub struct ReconcileService;

impl ReconcileService {
    pub fn statistics(snapshot: &DaybookSnapshot, range: DateRange) -> DaybookStatistics {
        let records = RecordSet::from_snapshot(snapshot, range);
        let parts = TransactionPartitioner::partition_set(&records);
        let regular = CashReconciler::reconcile(&parts.regular);
        let mpp = CashReconciler::reconcile(&parts.mpp);

        let mut fuel_by_type: BTreeMap<FuelType, FuelTypeTotals> = BTreeMap::new();
        for sale in &records.sales {
            let entry = fuel_by_type.entry(sale.fuel_type.clone()).or_default();
            entry.liters += sale.liters;
            entry.amount += sale.amount;
        }
        let total_liters = fuel_by_type.values().map(|totals| totals.liters).sum();

        let cash_in_hand = regular.cash();
        let mpp_cash = mpp.cash();
        tracing::debug!(%range, %cash_in_hand, %mpp_cash, "reconciled day-book");
        DaybookStatistics {
            range,
            regular,
            mpp,
            cash_in_hand,
            mpp_cash,
            total_available_cash: cash_in_hand + mpp_cash,
            has_mpp_data: mpp.has_activity(),
            fuel_by_type,
            total_liters,
        }
    }

    /// MPP cash over the tagged records of `range`.
    pub fn mpp_cash(snapshot: &DaybookSnapshot, range: DateRange) -> Decimal {
        let records = RecordSet::from_snapshot(snapshot, range);
        CashReconciler::reconcile(&TransactionPartitioner::partition_set(&records).mpp).cash()
    }
}
