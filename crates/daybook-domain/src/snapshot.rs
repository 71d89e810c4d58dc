use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    common::*, customer::Customer, payment::Payment, rates::RateTimeline, records::*,
};

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

/// Full read snapshot of a day-book: every record collection plus the rate
/// history. Collections keep insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaybookSnapshot {
    pub name: String,
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub fuel_sales: Vec<FuelSale>,
    #[serde(default)]
    pub credit_sales: Vec<CreditSale>,
    #[serde(default)]
    pub income: Vec<IncomeRecord>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub settlements: Vec<SettlementRecord>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub rates: RateTimeline,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "DaybookSnapshot::schema_version_default")]
    pub schema_version: u8,
}

impl DaybookSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            customers: Vec::new(),
            fuel_sales: Vec::new(),
            credit_sales: Vec::new(),
            income: Vec::new(),
            expenses: Vec::new(),
            settlements: Vec::new(),
            payments: Vec::new(),
            rates: RateTimeline::default(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn with_rates(mut self, rates: RateTimeline) -> Self {
        self.rates = rates;
        self
    }

    pub fn customer(&self, id: RecordId) -> Option<&Customer> {
        self.customers.iter().find(|customer| customer.id == id)
    }

    pub fn customer_by_name(&self, name: &str) -> Option<&Customer> {
        let wanted = name.trim().to_lowercase();
        self.customers
            .iter()
            .find(|customer| customer.normalized_name() == wanted)
    }

    /// The single MPP-designated customer, if one exists.
    pub fn mpp_customer(&self) -> Option<&Customer> {
        self.customers
            .iter()
            .find(|customer| customer.is_mpp_designated)
    }

    pub fn credit_sale(&self, id: RecordId) -> Option<&CreditSale> {
        self.credit_sales.iter().find(|credit| credit.id == id)
    }

    pub fn settlement(&self, id: RecordId) -> Option<&SettlementRecord> {
        self.settlements.iter().find(|settlement| settlement.id == id)
    }

    pub fn payment(&self, id: RecordId) -> Option<&Payment> {
        self.payments.iter().find(|payment| payment.id == id)
    }

    pub fn record_count(&self) -> usize {
        self.fuel_sales.len()
            + self.credit_sales.len()
            + self.income.len()
            + self.expenses.len()
            + self.settlements.len()
            + self.payments.len()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
