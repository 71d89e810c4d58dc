//! Shared traits, identifiers, date ranges and the MPP tag coercion.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customer::Customer;

/// Identifier assigned to every persisted record.
pub type RecordId = Uuid;

/// Exposes a stable identifier for entities stored in the day-book.
pub trait Identifiable {
    fn id(&self) -> RecordId;
}

/// Records that belong to a single calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Records that carry the Mobile Petrol Pump tag.
pub trait MppTagged {
    fn is_mpp(&self) -> bool;
}

impl<T: Dated + ?Sized> Dated for &T {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }
}

impl<T: MppTagged + ?Sized> MppTagged for &T {
    fn is_mpp(&self) -> bool {
        (**self).is_mpp()
    }
}

/// Records owned by a customer, matched by id or, for legacy rows, by name.
pub trait CustomerOwned {
    fn customer_id(&self) -> Option<RecordId>;
    fn customer_name(&self) -> &str;

    fn belongs_to(&self, customer: &Customer) -> bool {
        match self.customer_id() {
            Some(id) => id == customer.id,
            None => self.customer_name().trim() == customer.name.trim(),
        }
    }
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Inclusive calendar range used by every report.
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, DateRangeError> {
        if to < from {
            return Err(DateRangeError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// Range covering a single day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            from: date,
            to: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    pub fn includes<T: Dated + ?Sized>(&self, record: &T) -> bool {
        self.contains(record.date())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{} to {}", self.from, self.to)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`DateRange`] values.
pub enum DateRangeError {
    Inverted { from: NaiveDate, to: NaiveDate },
}

impl fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRangeError::Inverted { from, to } => {
                write!(f, "date range end {to} is before start {from}")
            }
        }
    }
}

impl std::error::Error for DateRangeError {}

/// Ingestion-time coercion of the MPP tag.
///
/// Older exports store the tag as a boolean, newer ones sometimes as the
/// string `"true"`. Only those two spellings mark a record as tagged; any
/// other value (absent, `null`, numbers, other strings) is untagged.
pub mod mpp_flag {
    use serde::{de::IgnoredAny, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Text(String),
        Other(IgnoredAny),
    }

    /// Returns `true` when a textual tag marks the record as MPP.
    pub fn is_tagged_text(value: &str) -> bool {
        value == "true"
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawFlag::deserialize(deserializer)?;
        Ok(match raw {
            RawFlag::Bool(value) => value,
            RawFlag::Text(text) => is_tagged_text(&text),
            RawFlag::Other(_) => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Tagged {
        #[serde(default, deserialize_with = "mpp_flag::deserialize")]
        mpp: bool,
    }

    fn parse(json: &str) -> bool {
        serde_json::from_str::<Tagged>(json).expect("parse").mpp
    }

    #[test]
    fn mpp_flag_accepts_bool_and_true_string_only() {
        assert!(parse(r#"{"mpp": true}"#));
        assert!(parse(r#"{"mpp": "true"}"#));
        assert!(!parse(r#"{"mpp": false}"#));
        assert!(!parse(r#"{"mpp": "false"}"#));
        assert!(!parse(r#"{"mpp": "yes"}"#));
        assert!(!parse(r#"{"mpp": 1}"#));
        assert!(!parse(r#"{"mpp": null}"#));
        assert!(!parse(r#"{}"#));
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = DateRange::new(from, to).expect_err("inverted range");
        assert!(err.to_string().contains("before start"));
    }

    #[test]
    fn date_range_is_inclusive_on_both_ends() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let range = DateRange::new(from, to).unwrap();
        assert!(range.contains(from));
        assert!(range.contains(to));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 1, 4).unwrap()));
        assert!(DateRange::single(from).contains(from));
    }
}
