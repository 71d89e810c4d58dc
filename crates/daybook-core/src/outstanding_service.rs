use std::cmp::Ordering;

use chrono::NaiveDate;
use daybook_domain::{CustomerOwned, DaybookSnapshot, RecordId};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum OutstandingSort {
    #[default]
    ByOutstandingDesc,
    ByName,
}

#[derive(Debug, Clone, Copy)]
pub struct OutstandingQuery {
    pub till: NaiveDate,
    pub hide_zero: bool,
    pub hide_negative: bool,
    pub sort: OutstandingSort,
}

impl OutstandingQuery {
    pub fn till(till: NaiveDate) -> Self {
        Self {
            till,
            hide_zero: false,
            hide_negative: false,
            sort: OutstandingSort::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutstandingRow {
    pub customer_id: RecordId,
    pub name: String,
    pub starting_balance: Decimal,
    pub total_credit: Decimal,
    pub total_received: Decimal,
    pub outstanding: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutstandingReport {
    pub till: NaiveDate,
    pub rows: Vec<OutstandingRow>,
    pub total_outstanding: Decimal,
}

impl OutstandingReport {
    pub fn row(&self, customer_id: RecordId) -> Option<&OutstandingRow> {
        self.rows.iter().find(|row| row.customer_id == customer_id)
    }
}

/// Point-in-time balances for every customer; no ledger detail.
pub struct OutstandingAggregator;

impl OutstandingAggregator {
    pub fn compute(snapshot: &DaybookSnapshot, query: &OutstandingQuery) -> OutstandingReport {
        let mut rows: Vec<OutstandingRow> = snapshot
            .customers
            .iter()
            .map(|customer| {
                let total_credit: Decimal = snapshot
                    .credit_sales
                    .iter()
                    .filter(|credit| credit.date <= query.till && credit.belongs_to(customer))
                    .map(|credit| credit.total_amount)
                    .sum();
                let total_received: Decimal = snapshot
                    .payments
                    .iter()
                    .filter(|payment| payment.date <= query.till && payment.belongs_to(customer))
                    .map(|payment| payment.amount)
                    .sum();
                OutstandingRow {
                    customer_id: customer.id,
                    name: customer.name.clone(),
                    starting_balance: customer.starting_balance,
                    total_credit,
                    total_received,
                    outstanding: customer.starting_balance + total_credit - total_received,
                }
            })
            .filter(|row| !(query.hide_zero && row.outstanding.is_zero()))
            .filter(|row| !(query.hide_negative && row.outstanding < Decimal::ZERO))
            .collect();

        match query.sort {
            OutstandingSort::ByOutstandingDesc => rows.sort_by(|a, b| {
                b.outstanding
                    .cmp(&a.outstanding)
                    .then_with(|| Self::compare_names(a, b))
            }),
            OutstandingSort::ByName => rows.sort_by(Self::compare_names),
        }

        let total_outstanding = rows.iter().map(|row| row.outstanding).sum();
        OutstandingReport {
            till: query.till,
            rows,
            total_outstanding,
        }
    }

    fn compare_names(a: &OutstandingRow, b: &OutstandingRow) -> Ordering {
        a.name.to_lowercase().cmp(&b.name.to_lowercase())
    }
}
