use daybook_domain::{ExpenseRecord, IncomeRecord, RecordId};
use rust_decimal::Decimal;

use crate::{
    storage::{RecordStore, StoredRecord},
    validation::{not_found, require_positive, require_text},
    CoreResult,
};

/// Free-standing income and expense lines of the day-book.
pub trait SundryRecord: StoredRecord {
    fn description(&self) -> &str;
    fn amount(&self) -> Decimal;
}

impl SundryRecord for IncomeRecord {
    fn description(&self) -> &str {
        &self.description
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

impl SundryRecord for ExpenseRecord {
    fn description(&self) -> &str {
        &self.description
    }

    fn amount(&self) -> Decimal {
        self.amount
    }
}

pub struct SundryService;

impl SundryService {
    pub fn create<T, S>(store: &mut S, record: T) -> CoreResult<T>
    where
        T: SundryRecord,
        S: RecordStore<T> + ?Sized,
    {
        Self::validate(&record)?;
        let created = store.create(record)?;
        tracing::debug!(kind = T::KIND, id = %created.id(), amount = %created.amount(), "sundry record added");
        Ok(created)
    }

    pub fn update<T, S>(store: &mut S, id: RecordId, record: T) -> CoreResult<T>
    where
        T: SundryRecord,
        S: RecordStore<T> + ?Sized,
    {
        Self::validate(&record)?;
        store.update(id, record)?.ok_or_else(|| not_found(T::KIND, id))
    }

    pub fn delete<T, S>(store: &mut S, id: RecordId) -> CoreResult<()>
    where
        T: SundryRecord,
        S: RecordStore<T> + ?Sized,
    {
        if store.delete(id)? {
            Ok(())
        } else {
            Err(not_found(T::KIND, id))
        }
    }

    fn validate<T: SundryRecord>(record: &T) -> CoreResult<()> {
        require_text(record.description(), "Description")?;
        require_positive(record.amount(), "Amount")
    }
}
