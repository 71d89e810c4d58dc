//! daybook-domain
//!
//! Pure domain models for the fuel outlet day-book (sales, credits, payments,
//! customers, rate history). No I/O, no CLI, no storage. Only data types and
//! the invariants that can be checked on a single record.

pub mod common;
pub mod customer;
pub mod payment;
pub mod rates;
pub mod records;
pub mod snapshot;

pub use common::*;
pub use customer::*;
pub use payment::*;
pub use rates::*;
pub use records::*;
pub use snapshot::*;

// Re-export common dependencies so consumers can rely on this crate as a façade.
pub use chrono;
pub use rust_decimal;
pub use uuid;
