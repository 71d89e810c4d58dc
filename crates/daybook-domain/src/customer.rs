use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// Credit customer of the outlet.
///
/// At most one customer in a day-book may be MPP-designated; the service
/// layer enforces that, this type only carries the flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub starting_balance: Decimal,
    #[serde(default, alias = "isMPP")]
    pub is_mpp_designated: bool,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>, starting_balance: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            starting_balance,
            is_mpp_designated: false,
            created_at: Utc::now(),
        }
    }

    pub fn mpp(name: impl Into<String>, starting_balance: Decimal) -> Self {
        Self {
            is_mpp_designated: true,
            ..Self::new(name, starting_balance)
        }
    }

    /// Case-insensitive, whitespace-trimmed name used for duplicate checks.
    pub fn normalized_name(&self) -> String {
        self.name.trim().to_lowercase()
    }
}

impl Identifiable for Customer {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Displayable for Customer {
    fn display_label(&self) -> String {
        if self.is_mpp_designated {
            format!("{} (MPP)", self.name)
        } else {
            self.name.clone()
        }
    }
}
