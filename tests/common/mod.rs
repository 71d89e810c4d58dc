#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::NaiveDate;
use daybook::{
    domain::{CreditSale, Customer, DaybookSnapshot, FuelEntry, FuelSale, Payment, PaymentMode},
    engine::{CreditSaleService, CustomerService, FuelSaleService, MemoryStore, PaymentService},
    storage::save_snapshot_to_path,
};
use once_cell::sync::Lazy;
use rust_decimal_macros::dec;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Creates an isolated directory used as `DAYBOOK_HOME`.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

/// Day-book with one cash reading, one credit customer and one payment:
/// cash in hand 9000 over the first three days of 2024, ABC owes 600.
pub fn sample_snapshot() -> DaybookSnapshot {
    let mut store = MemoryStore::new("Outlet");
    let abc = CustomerService::add(&mut store, Customer::new("ABC", dec!(0))).expect("customer");
    FuelSaleService::create(
        &mut store,
        FuelSale::new(date(2024, 1, 1), "N1", "Petrol", dec!(500), dec!(600), dec!(100)),
    )
    .expect("fuel sale");
    CreditSaleService::create(
        &mut store,
        CreditSale::new(date(2024, 1, 1), abc.id, "ABC")
            .with_fuel(FuelEntry::new("Petrol", dec!(10), dec!(100))),
    )
    .expect("credit sale");
    PaymentService::create(
        &mut store,
        Payment::new(abc.id, "ABC", dec!(400), date(2024, 1, 3), PaymentMode::Cash),
    )
    .expect("payment");
    store.into_snapshot()
}

/// Writes [`sample_snapshot`] to `dir/outlet.json` and returns its path.
pub fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("outlet.json");
    save_snapshot_to_path(&sample_snapshot(), &path).expect("save sample snapshot");
    path
}
