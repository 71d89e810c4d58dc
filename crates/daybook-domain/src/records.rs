//! Day-book transaction records: nozzle readings, credit sales, sundry
//! income/expense and settlements.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;
use crate::rates::FuelType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
/// How a nozzle reading was paid for. Non-cash readings surface only through
/// [`CreditSale`] records.
pub enum PaymentKind {
    #[default]
    Cash,
    Credit,
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentKind::Cash => "Cash",
            PaymentKind::Credit => "Credit",
        };
        f.write_str(label)
    }
}

/// One nozzle reading for a day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelSale {
    pub id: RecordId,
    pub date: NaiveDate,
    pub nozzle: String,
    pub fuel_type: FuelType,
    pub start_reading: Decimal,
    pub end_reading: Decimal,
    pub liters: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    #[serde(default, alias = "type")]
    pub payment_kind: PaymentKind,
    #[serde(default, deserialize_with = "mpp_flag::deserialize")]
    pub mpp: bool,
}

impl FuelSale {
    /// Builds a cash reading, deriving liters and amount from the meter values.
    pub fn new(
        date: NaiveDate,
        nozzle: impl Into<String>,
        fuel_type: impl Into<FuelType>,
        start_reading: Decimal,
        end_reading: Decimal,
        rate: Decimal,
    ) -> Self {
        let liters = end_reading - start_reading;
        Self {
            id: Uuid::new_v4(),
            date,
            nozzle: nozzle.into(),
            fuel_type: fuel_type.into(),
            start_reading,
            end_reading,
            liters,
            rate,
            amount: liters * rate,
            payment_kind: PaymentKind::Cash,
            mpp: false,
        }
    }

    pub fn tagged(mut self, mpp: bool) -> Self {
        self.mpp = mpp;
        self
    }

    pub fn is_cash(&self) -> bool {
        self.payment_kind == PaymentKind::Cash
    }

    /// Re-derives liters and amount after a reading or rate change.
    pub fn recompute(&mut self) {
        self.liters = self.end_reading - self.start_reading;
        self.amount = self.liters * self.rate;
    }
}

/// Fuel line of a credit sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelEntry {
    pub fuel_type: FuelType,
    pub liters: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

impl FuelEntry {
    pub fn new(fuel_type: impl Into<FuelType>, liters: Decimal, rate: Decimal) -> Self {
        Self {
            fuel_type: fuel_type.into(),
            liters,
            rate,
            amount: liters * rate,
        }
    }
}

/// Free-text income or expense line attached to a credit sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub description: String,
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

/// Fuel sold on account to a customer, optionally with attached income and
/// expense lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditSale {
    pub id: RecordId,
    pub date: NaiveDate,
    #[serde(default)]
    pub customer_id: Option<RecordId>,
    pub customer_name: String,
    #[serde(default)]
    pub fuel_entries: Vec<FuelEntry>,
    #[serde(default)]
    pub income_entries: Vec<LineItem>,
    #[serde(default)]
    pub expense_entries: Vec<LineItem>,
    #[serde(alias = "amount")]
    pub total_amount: Decimal,
    /// Single-fuel legacy rows predate `fuel_entries` and only carry liters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liters: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
    #[serde(default, deserialize_with = "mpp_flag::deserialize")]
    pub mpp: bool,
}

impl CreditSale {
    pub fn new(date: NaiveDate, customer_id: RecordId, customer_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            customer_id: Some(customer_id),
            customer_name: customer_name.into(),
            fuel_entries: Vec::new(),
            income_entries: Vec::new(),
            expense_entries: Vec::new(),
            total_amount: Decimal::ZERO,
            liters: None,
            vehicle_number: None,
            mpp: false,
        }
    }

    pub fn with_fuel(mut self, entry: FuelEntry) -> Self {
        self.fuel_entries.push(entry);
        self.recompute_total();
        self
    }

    pub fn with_income(mut self, item: LineItem) -> Self {
        self.income_entries.push(item);
        self.recompute_total();
        self
    }

    pub fn with_expense(mut self, item: LineItem) -> Self {
        self.expense_entries.push(item);
        self.recompute_total();
        self
    }

    pub fn tagged(mut self, mpp: bool) -> Self {
        self.mpp = mpp;
        self
    }

    pub fn fuel_amount(&self) -> Decimal {
        self.fuel_entries.iter().map(|entry| entry.amount).sum()
    }

    pub fn income_amount(&self) -> Decimal {
        self.income_entries.iter().map(|item| item.amount).sum()
    }

    pub fn expense_amount(&self) -> Decimal {
        self.expense_entries.iter().map(|item| item.amount).sum()
    }

    /// Total implied by the entries: fuel + income − expense.
    pub fn computed_total(&self) -> Decimal {
        self.fuel_amount() + self.income_amount() - self.expense_amount()
    }

    pub fn recompute_total(&mut self) {
        self.total_amount = self.computed_total();
    }

    /// Liters across fuel entries, falling back to the legacy single field.
    pub fn total_liters(&self) -> Decimal {
        if self.fuel_entries.is_empty() {
            self.liters.unwrap_or(Decimal::ZERO)
        } else {
            self.fuel_entries.iter().map(|entry| entry.liters).sum()
        }
    }

    /// Short "Petrol 10L, Diesel 5L" summary used in ledger descriptions.
    pub fn fuel_summary(&self) -> String {
        if self.fuel_entries.is_empty() {
            return match self.liters {
                Some(liters) => format!("{}L", liters.normalize()),
                None => "N/A".into(),
            };
        }
        self.fuel_entries
            .iter()
            .map(|entry| format!("{} {}L", entry.fuel_type, entry.liters.normalize()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Sundry income recorded directly in the day-book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeRecord {
    pub id: RecordId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "mpp_flag::deserialize")]
    pub mpp: bool,
}

impl IncomeRecord {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: description.into(),
            amount,
            mpp: false,
        }
    }

    pub fn tagged(mut self, mpp: bool) -> Self {
        self.mpp = mpp;
        self
    }
}

/// Sundry expense recorded directly in the day-book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    pub id: RecordId,
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "mpp_flag::deserialize")]
    pub mpp: bool,
}

impl ExpenseRecord {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: description.into(),
            amount,
            mpp: false,
        }
    }

    pub fn tagged(mut self, mpp: bool) -> Self {
        self.mpp = mpp;
        self
    }
}

/// Money moved out of the till into a bank or digital wallet (card, UPI...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettlementRecord {
    pub id: RecordId,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub amount: Decimal,
    #[serde(default, deserialize_with = "mpp_flag::deserialize")]
    pub mpp: bool,
}

impl SettlementRecord {
    pub fn new(date: NaiveDate, description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: description.into(),
            amount,
            mpp: false,
        }
    }

    pub fn tagged(mut self, mpp: bool) -> Self {
        self.mpp = mpp;
        self
    }
}

macro_rules! impl_record_traits {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Identifiable for $ty {
                fn id(&self) -> RecordId {
                    self.id
                }
            }

            impl Dated for $ty {
                fn date(&self) -> NaiveDate {
                    self.date
                }
            }

            impl MppTagged for $ty {
                fn is_mpp(&self) -> bool {
                    self.mpp
                }
            }
        )+
    };
}

impl_record_traits!(
    FuelSale,
    CreditSale,
    IncomeRecord,
    ExpenseRecord,
    SettlementRecord
);

impl CustomerOwned for CreditSale {
    fn customer_id(&self) -> Option<RecordId> {
        self.customer_id
    }

    fn customer_name(&self) -> &str {
        &self.customer_name
    }
}

impl Displayable for CreditSale {
    fn display_label(&self) -> String {
        format!("Credit Sale - {}", self.fuel_summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn credit_total_is_fuel_plus_income_minus_expense() {
        let credit = CreditSale::new(day(), Uuid::new_v4(), "ABC")
            .with_fuel(FuelEntry::new("Petrol", dec!(10), dec!(102.50)))
            .with_fuel(FuelEntry::new("Diesel", dec!(4), dec!(90.46)))
            .with_income(LineItem::new("Oil", dec!(250)))
            .with_expense(LineItem::new("Discount", dec!(20)));

        assert_eq!(credit.fuel_amount(), dec!(1386.84));
        assert_eq!(credit.total_amount, dec!(1616.84));
        assert_eq!(credit.total_amount, credit.computed_total());
        assert_eq!(credit.total_liters(), dec!(14));
    }

    #[test]
    fn legacy_credit_falls_back_to_single_liters_field() {
        let json = r#"{
            "id": "6b1f4c34-7f0e-4a52-9d65-6f3c0f6f2f10",
            "date": "2024-01-01",
            "customer_name": "Legacy",
            "amount": 500,
            "liters": 5,
            "mpp": "true"
        }"#;
        let credit: CreditSale = serde_json::from_str(json).expect("legacy credit");
        assert_eq!(credit.total_amount, dec!(500));
        assert_eq!(credit.total_liters(), dec!(5));
        assert!(credit.customer_id.is_none());
        assert!(credit.mpp);
    }

    #[test]
    fn fuel_sale_derives_liters_and_amount() {
        let mut sale = FuelSale::new(day(), "N1", "Petrol", dec!(1000), dec!(1040), dec!(100));
        assert_eq!(sale.liters, dec!(40));
        assert_eq!(sale.amount, dec!(4000));
        sale.end_reading = dec!(1050);
        sale.recompute();
        assert_eq!(sale.amount, dec!(5000));
        assert!(sale.is_cash());
    }
}
