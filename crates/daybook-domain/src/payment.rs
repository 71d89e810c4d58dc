//! Customer receipts, including the cascade-maintained MPP mirrors.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
/// Channel a payment was received through.
pub enum PaymentMode {
    #[default]
    Cash,
    Card,
    Wallet,
    Upi,
    Bank,
    /// Internal transfer to the MPP account, used by auto-generated payments.
    Transfer,
    Other,
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Card => "Card",
            PaymentMode::Wallet => "Wallet",
            PaymentMode::Upi => "UPI",
            PaymentMode::Bank => "Bank",
            PaymentMode::Transfer => "Transfer",
            PaymentMode::Other => "Other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
/// Source record an auto-generated payment mirrors. Exactly one source per
/// payment, so the credit/settlement links are mutually exclusive by type.
pub enum PaymentLink {
    Credit(RecordId),
    Settlement(RecordId),
}

impl PaymentLink {
    pub fn source_id(&self) -> RecordId {
        match self {
            PaymentLink::Credit(id) | PaymentLink::Settlement(id) => *id,
        }
    }
}

impl fmt::Display for PaymentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentLink::Credit(id) => write!(f, "credit:{id}"),
            PaymentLink::Settlement(id) => write!(f, "settlement:{id}"),
        }
    }
}

/// Money received against a customer's account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub id: RecordId,
    /// Absent on legacy payments, which are matched by name instead.
    #[serde(default)]
    pub customer_id: Option<RecordId>,
    pub customer_name: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub mode: PaymentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<PaymentLink>,
    #[serde(default)]
    pub auto_generated: bool,
}

impl Payment {
    pub fn new(
        customer_id: RecordId,
        customer_name: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
        mode: PaymentMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: Some(customer_id),
            customer_name: customer_name.into(),
            amount,
            date,
            mode,
            description: None,
            link: None,
            auto_generated: false,
        }
    }

    /// Builds a cascade mirror of `link`'s source.
    pub fn auto_generated(
        customer_id: RecordId,
        customer_name: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
        link: PaymentLink,
        description: impl Into<String>,
    ) -> Self {
        Self {
            description: Some(description.into()),
            link: Some(link),
            auto_generated: true,
            ..Self::new(customer_id, customer_name, amount, date, PaymentMode::Transfer)
        }
    }

    pub fn linked_credit_id(&self) -> Option<RecordId> {
        match self.link {
            Some(PaymentLink::Credit(id)) => Some(id),
            _ => None,
        }
    }

    pub fn linked_settlement_id(&self) -> Option<RecordId> {
        match self.link {
            Some(PaymentLink::Settlement(id)) => Some(id),
            _ => None,
        }
    }

    pub fn is_mirror_of(&self, link: PaymentLink) -> bool {
        self.auto_generated && self.link == Some(link)
    }
}

impl Identifiable for Payment {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Dated for Payment {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl CustomerOwned for Payment {
    fn customer_id(&self) -> Option<RecordId> {
        self.customer_id
    }

    fn customer_name(&self) -> &str {
        &self.customer_name
    }
}

impl Displayable for Payment {
    fn display_label(&self) -> String {
        match (&self.description, self.auto_generated) {
            (Some(description), _) => description.clone(),
            (None, true) => "MPP Transaction".into(),
            (None, false) => "Payment Received".into(),
        }
    }
}
