//! Splits record streams by their MPP tag.

use daybook_domain::{
    CreditSale, DateRange, DaybookSnapshot, ExpenseRecord, FuelSale, IncomeRecord, MppTagged,
    SettlementRecord,
};

/// Records of one stream split into MPP-tagged and untagged halves.
#[derive(Debug, Clone)]
pub struct Partition<T> {
    pub tagged: Vec<T>,
    pub untagged: Vec<T>,
}

impl<T> Default for Partition<T> {
    fn default() -> Self {
        Self {
            tagged: Vec::new(),
            untagged: Vec::new(),
        }
    }
}

/// Borrowed view over every reconcilable stream of a day-book.
#[derive(Debug, Clone, Default)]
pub struct RecordSet<'a> {
    pub sales: Vec<&'a FuelSale>,
    pub credits: Vec<&'a CreditSale>,
    pub income: Vec<&'a IncomeRecord>,
    pub expenses: Vec<&'a ExpenseRecord>,
    pub settlements: Vec<&'a SettlementRecord>,
}

impl<'a> RecordSet<'a> {
    /// Every record of the snapshot, regardless of date.
    pub fn all(snapshot: &'a DaybookSnapshot) -> Self {
        Self {
            sales: snapshot.fuel_sales.iter().collect(),
            credits: snapshot.credit_sales.iter().collect(),
            income: snapshot.income.iter().collect(),
            expenses: snapshot.expenses.iter().collect(),
            settlements: snapshot.settlements.iter().collect(),
        }
    }

    /// Records dated inside the inclusive `range`; the rest are dropped.
    pub fn from_snapshot(snapshot: &'a DaybookSnapshot, range: DateRange) -> Self {
        Self {
            sales: snapshot.fuel_sales.iter().filter(|r| range.includes(*r)).collect(),
            credits: snapshot.credit_sales.iter().filter(|r| range.includes(*r)).collect(),
            income: snapshot.income.iter().filter(|r| range.includes(*r)).collect(),
            expenses: snapshot.expenses.iter().filter(|r| range.includes(*r)).collect(),
            settlements: snapshot.settlements.iter().filter(|r| range.includes(*r)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
            && self.credits.is_empty()
            && self.income.is_empty()
            && self.expenses.is_empty()
            && self.settlements.is_empty()
    }
}

/// Both halves of a [`RecordSet`].
#[derive(Debug, Clone, Default)]
pub struct PartitionedRecords<'a> {
    pub mpp: RecordSet<'a>,
    pub regular: RecordSet<'a>,
}

pub struct TransactionPartitioner;

impl TransactionPartitioner {
    /// Splits one stream, keeping the input order within each half.
    pub fn partition<T: MppTagged + Copy>(records: &[T]) -> Partition<T> {
        let (tagged, untagged) = records.iter().copied().partition(|record| record.is_mpp());
        Partition { tagged, untagged }
    }

    pub fn partition_set<'a>(records: &RecordSet<'a>) -> PartitionedRecords<'a> {
        let sales = Self::partition(&records.sales);
        let credits = Self::partition(&records.credits);
        let income = Self::partition(&records.income);
        let expenses = Self::partition(&records.expenses);
        let settlements = Self::partition(&records.settlements);
        PartitionedRecords {
            mpp: RecordSet {
                sales: sales.tagged,
                credits: credits.tagged,
                income: income.tagged,
                expenses: expenses.tagged,
                settlements: settlements.tagged,
            },
            regular: RecordSet {
                sales: sales.untagged,
                credits: credits.untagged,
                income: income.untagged,
                expenses: expenses.untagged,
                settlements: settlements.untagged,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn partition_keeps_order_and_splits_by_tag() {
        let a = IncomeRecord::new(day(1), "a", dec!(1)).tagged(true);
        let b = IncomeRecord::new(day(1), "b", dec!(2));
        let c = IncomeRecord::new(day(1), "c", dec!(3)).tagged(true);
        let records = vec![&a, &b, &c];

        let split = TransactionPartitioner::partition(&records);
        let tagged: Vec<_> = split.tagged.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(tagged, ["a", "c"]);
        assert_eq!(split.untagged.len(), 1);
        assert_eq!(split.untagged[0].description, "b");
    }

    #[test]
    fn record_set_drops_out_of_range_records() {
        let mut snapshot = DaybookSnapshot::new("Range");
        snapshot.income.push(IncomeRecord::new(day(1), "in", dec!(10)));
        snapshot.income.push(IncomeRecord::new(day(5), "out", dec!(10)));
        snapshot
            .settlements
            .push(SettlementRecord::new(day(3), "card", dec!(5)).tagged(true));

        let range = DateRange::new(day(1), day(3)).unwrap();
        let set = RecordSet::from_snapshot(&snapshot, range);
        assert_eq!(set.income.len(), 1);
        assert_eq!(set.settlements.len(), 1);

        let parts = TransactionPartitioner::partition_set(&set);
        assert_eq!(parts.mpp.settlements.len(), 1);
        assert!(parts.regular.settlements.is_empty());
        assert_eq!(parts.regular.income.len(), 1);
        assert!(RecordSet::all(&snapshot).income.len() == 2);
    }
}
