//! In-memory [`DaybookStore`] over a [`DaybookSnapshot`].

use daybook_domain::{
    CreditSale, Customer, DaybookSnapshot, ExpenseRecord, FuelSale, IncomeRecord,
    Payment, RateTimeline, RecordId, SettlementRecord,
};
use uuid::Uuid;

use crate::{
    storage::{DaybookStore, RecordStore, StoredRecord},
    CoreError,
};

/// Keeps every collection in a snapshot; insertion order is preserved.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    snapshot: DaybookSnapshot,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_snapshot(DaybookSnapshot::new(name))
    }

    pub fn from_snapshot(snapshot: DaybookSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn as_snapshot(&self) -> &DaybookSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> DaybookSnapshot {
        self.snapshot
    }

    /// Replaces the whole snapshot, e.g. after a sync from another device.
    pub fn replace(&mut self, snapshot: DaybookSnapshot) {
        self.snapshot = snapshot;
    }
}

fn create_in<T: StoredRecord>(records: &mut Vec<T>, mut record: T) -> Result<T, CoreError> {
    if record.id().is_nil() {
        record.assign_id(Uuid::new_v4());
    }
    let id = record.id();
    if records.iter().any(|existing| existing.id() == id) {
        return Err(CoreError::Storage(format!("{} {} already exists", T::KIND, id)));
    }
    records.push(record.clone());
    Ok(record)
}

fn update_in<T: StoredRecord>(records: &mut [T], id: RecordId, mut record: T) -> Option<T> {
    let slot = records.iter_mut().find(|existing| existing.id() == id)?;
    record.assign_id(id);
    *slot = record.clone();
    Some(record)
}

fn delete_in<T: StoredRecord>(records: &mut Vec<T>, id: RecordId) -> bool {
    let before = records.len();
    records.retain(|record| record.id() != id);
    records.len() != before
}

macro_rules! memory_record_store {
    ($($ty:ty => $field:ident),+ $(,)?) => {
        $(
            impl RecordStore<$ty> for MemoryStore {
                fn list(&self) -> Result<Vec<$ty>, CoreError> {
                    Ok(self.snapshot.$field.clone())
                }

                fn create(&mut self, record: $ty) -> Result<$ty, CoreError> {
                    let created = create_in(&mut self.snapshot.$field, record)?;
                    self.snapshot.touch();
                    Ok(created)
                }

                fn update(&mut self, id: RecordId, record: $ty) -> Result<Option<$ty>, CoreError> {
                    let updated = update_in(&mut self.snapshot.$field, id, record);
                    if updated.is_some() {
                        self.snapshot.touch();
                    }
                    Ok(updated)
                }

                fn delete(&mut self, id: RecordId) -> Result<bool, CoreError> {
                    let removed = delete_in(&mut self.snapshot.$field, id);
                    if removed {
                        self.snapshot.touch();
                    }
                    Ok(removed)
                }
            }
        )+
    };
}

memory_record_store!(
    Customer => customers,
    FuelSale => fuel_sales,
    CreditSale => credit_sales,
    IncomeRecord => income,
    ExpenseRecord => expenses,
    SettlementRecord => settlements,
    Payment => payments,
);

impl DaybookStore for MemoryStore {
    fn rates(&self) -> Result<RateTimeline, CoreError> {
        Ok(self.snapshot.rates.clone())
    }

    fn save_rates(&mut self, rates: RateTimeline) -> Result<(), CoreError> {
        self.snapshot.rates = rates;
        self.snapshot.touch();
        Ok(())
    }

    fn snapshot(&self) -> Result<DaybookSnapshot, CoreError> {
        Ok(self.snapshot.clone())
    }
}
