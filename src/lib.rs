#![doc(test(attr(deny(warnings))))]

//! Day-book offers the reconciliation engine of a fuel outlet (cash
//! positions, MPP mirroring, customer ledgers and outstanding balances)
//! together with JSON persistence, configuration and a small CLI.

pub mod cli;
pub mod errors;
pub mod utils;

pub use daybook_config as config;
pub use daybook_core as engine;
pub use daybook_domain as domain;
pub use daybook_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    init_with_filter(None);
}

/// Like [`init`], with a fallback filter directive used when `RUST_LOG` is unset.
pub fn init_with_filter(directive: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(directive);
        tracing::info!("Day-book tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
