use super::feature_registry::IndicatorColumn;

/// A column of the feature table. `None` marks an undefined value, either
/// missing history or a 0/0 result.
pub type Column = Vec<Option<f64>>;

/// Candle series augmented with derived indicator columns, oldest row first.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    len: usize,
    columns: Vec<Column>,
}

impl FeatureTable {
    /// Table of `len` rows with every column undefined.
    pub fn with_len(len: usize) -> Self {
        Self {
            len,
            columns: vec![vec![None; len]; IndicatorColumn::COUNT],
        }
    }

    /// Replaces a column. Values must have one entry per row.
    pub fn insert(&mut self, column: IndicatorColumn, values: Column) {
        assert_eq!(
            values.len(),
            self.len,
            "column {} has {} rows, table has {}",
            column,
            values.len(),
            self.len
        );
        self.columns[column.index()] = values;
    }

    pub fn column(&self, column: IndicatorColumn) -> &[Option<f64>] {
        &self.columns[column.index()]
    }

    pub fn value(&self, column: IndicatorColumn, row: usize) -> Option<f64> {
        self.columns[column.index()].get(row).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_row_complete(&self, row: usize) -> bool {
        self.columns.iter().all(|column| column[row].is_some())
    }

    /// Drops every row with an undefined value in any column, whether or not
    /// that column is a configured feature.
    pub fn purge_incomplete(self) -> FeatureTable {
        let keep: Vec<usize> = (0..self.len).filter(|&row| self.is_row_complete(row)).collect();
        if keep.len() == self.len {
            return self;
        }

        let columns = self
            .columns
            .iter()
            .map(|column| keep.iter().map(|&row| column[row]).collect())
            .collect();

        FeatureTable {
            len: keep.len(),
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(len: usize) -> FeatureTable {
        let mut table = FeatureTable::with_len(len);
        for column in IndicatorColumn::ALL {
            table.insert(column, (0..len).map(|i| Some(i as f64)).collect());
        }
        table
    }

    #[test]
    fn test_purge_removes_rows_with_any_gap() {
        let mut table = filled(5);
        table.insert(
            IndicatorColumn::Volatility,
            vec![None, None, Some(2.0), Some(3.0), Some(4.0)],
        );
        table.insert(
            IndicatorColumn::Rsi,
            vec![Some(0.0), Some(1.0), Some(2.0), None, Some(4.0)],
        );

        let purged = table.purge_incomplete();
        assert_eq!(purged.len(), 2);
        assert_eq!(purged.column(IndicatorColumn::Close), &[Some(2.0), Some(4.0)]);
    }

    #[test]
    fn test_purge_keeps_complete_table() {
        let purged = filled(3).purge_incomplete();
        assert_eq!(purged.len(), 3);
        assert_eq!(purged.value(IndicatorColumn::Open, 2), Some(2.0));
    }

    #[test]
    fn test_fresh_table_is_entirely_undefined() {
        let table = FeatureTable::with_len(4);
        assert!(table.purge_incomplete().is_empty());
    }
}
