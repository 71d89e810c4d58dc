//! daybook-core
//!
//! Reconciliation engine and record services for the fuel outlet day-book.
//! Depends on daybook-domain. No CLI, no terminal I/O, no filesystem access.

pub mod cascade;
pub mod credit_sale_service;
pub mod customer_service;
pub mod error;
pub mod fuel_sale_service;
pub mod ledger_service;
pub mod memory_store;
pub mod outstanding_service;
pub mod partition;
pub mod payment_service;
pub mod rate_service;
pub mod reconcile_service;
pub mod settlement_service;
pub mod storage;
pub mod sundry_service;
mod validation;

pub use cascade::*;
pub use credit_sale_service::*;
pub use customer_service::*;
pub use error::{CoreError, CoreResult};
pub use fuel_sale_service::*;
pub use ledger_service::*;
pub use memory_store::MemoryStore;
pub use outstanding_service::*;
pub use partition::*;
pub use payment_service::*;
pub use rate_service::*;
pub use reconcile_service::*;
pub use settlement_service::*;
pub use storage::*;
pub use sundry_service::*;
