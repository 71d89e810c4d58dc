use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use daybook_domain::{
    CreditSale, Customer, DaybookSnapshot, ExpenseRecord, FuelSale, Identifiable, IncomeRecord,
    Payment, PaymentLink, RateTimeline, RecordId, SettlementRecord,
};

use crate::CoreError;

/// Records the persistence collaborator knows how to keep, keyed by id.
pub trait StoredRecord: Clone + Identifiable {
    /// Human label used in errors and logs.
    const KIND: &'static str;

    fn assign_id(&mut self, id: RecordId);
}

macro_rules! stored_record {
    ($($ty:ty => $kind:literal),+ $(,)?) => {
        $(
            impl StoredRecord for $ty {
                const KIND: &'static str = $kind;

                fn assign_id(&mut self, id: RecordId) {
                    self.id = id;
                }
            }
        )+
    };
}

stored_record!(
    Customer => "customer",
    FuelSale => "fuel sale",
    CreditSale => "credit sale",
    IncomeRecord => "income record",
    ExpenseRecord => "expense record",
    SettlementRecord => "settlement",
    Payment => "payment",
);

/// CRUD contract of the persistence collaborator for one record type.
///
/// `create` assigns an id when the record carries the nil id, `update`
/// returns `None` for unknown ids and `delete` reports whether anything was
/// removed.
pub trait RecordStore<T: StoredRecord> {
    fn list(&self) -> Result<Vec<T>, CoreError>;
    fn create(&mut self, record: T) -> Result<T, CoreError>;
    fn update(&mut self, id: RecordId, record: T) -> Result<Option<T>, CoreError>;
    fn delete(&mut self, id: RecordId) -> Result<bool, CoreError>;

    fn get(&self, id: RecordId) -> Result<Option<T>, CoreError> {
        Ok(self.list()?.into_iter().find(|record| record.id() == id))
    }
}

/// Every record collection of a day-book plus its rate history.
pub trait DaybookStore:
    RecordStore<Customer>
    + RecordStore<FuelSale>
    + RecordStore<CreditSale>
    + RecordStore<IncomeRecord>
    + RecordStore<ExpenseRecord>
    + RecordStore<SettlementRecord>
    + RecordStore<Payment>
{
    fn rates(&self) -> Result<RateTimeline, CoreError>;
    fn save_rates(&mut self, rates: RateTimeline) -> Result<(), CoreError>;

    /// Consistent read snapshot that every report is derived from.
    fn snapshot(&self) -> Result<DaybookSnapshot, CoreError>;
}

/// Describes a persisted backup artifact for a day-book snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotBackupInfo {
    pub daybook: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over backends that persist whole day-book snapshots.
pub trait SnapshotStorage: Send + Sync {
    fn save_snapshot(&self, name: &str, snapshot: &DaybookSnapshot) -> Result<(), CoreError>;
    fn load_snapshot(&self, name: &str) -> Result<DaybookSnapshot, CoreError>;
    fn list_snapshots(&self) -> Result<Vec<String>, CoreError>;
    fn delete_snapshot(&self, name: &str) -> Result<(), CoreError>;
    fn load_snapshot_from_path(&self, path: &Path) -> Result<DaybookSnapshot, CoreError>;
    fn backup_snapshot(
        &self,
        name: &str,
        snapshot: &DaybookSnapshot,
        note: Option<&str>,
    ) -> Result<SnapshotBackupInfo, CoreError>;
    fn list_backups(&self, name: &str) -> Result<Vec<SnapshotBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &SnapshotBackupInfo) -> Result<DaybookSnapshot, CoreError>;
}

/// Detects dangling references and other anomalies within a snapshot.
pub fn snapshot_warnings(snapshot: &DaybookSnapshot) -> Vec<String> {
    let customer_ids: HashSet<_> = snapshot.customers.iter().map(|c| c.id).collect();
    let credit_ids: HashSet<_> = snapshot.credit_sales.iter().map(|c| c.id).collect();
    let settlement_ids: HashSet<_> = snapshot.settlements.iter().map(|s| s.id).collect();
    let mut warnings = Vec::new();

    let designated = snapshot
        .customers
        .iter()
        .filter(|customer| customer.is_mpp_designated)
        .count();
    if designated > 1 {
        warnings.push(format!("{designated} customers are MPP-designated"));
    }

    for credit in &snapshot.credit_sales {
        if let Some(customer_id) = credit.customer_id {
            if !customer_ids.contains(&customer_id) {
                warnings.push(format!(
                    "credit sale {} references unknown customer {}",
                    credit.id, customer_id
                ));
            }
        }
        if !credit.fuel_entries.is_empty() && credit.total_amount != credit.computed_total() {
            warnings.push(format!(
                "credit sale {} total {} does not match its entries ({})",
                credit.id,
                credit.total_amount,
                credit.computed_total()
            ));
        }
    }

    for payment in &snapshot.payments {
        if let Some(customer_id) = payment.customer_id {
            if !customer_ids.contains(&customer_id) {
                warnings.push(format!(
                    "payment {} references unknown customer {}",
                    payment.id, customer_id
                ));
            }
        }
        if !payment.auto_generated {
            continue;
        }
        match payment.link {
            Some(PaymentLink::Credit(id)) if !credit_ids.contains(&id) => warnings.push(format!(
                "auto payment {} mirrors missing credit sale {}",
                payment.id, id
            )),
            Some(PaymentLink::Settlement(id)) if !settlement_ids.contains(&id) => {
                warnings.push(format!(
                    "auto payment {} mirrors missing settlement {}",
                    payment.id, id
                ))
            }
            None => warnings.push(format!("auto payment {} has no source link", payment.id)),
            _ => {}
        }
    }
    warnings
}
