//! Column-oriented observation table
//!
//! A deliberately minimal dataframe: equal-length named columns, whole-column
//! mutation only, and row subsets produced as new tables. A table is either
//! valid (at least one column, all lengths equal) or the single
//! invalid/empty instance holding no columns at all; no partially-valid
//! state is ever observable.

use indexmap::IndexMap;
use tracing::warn;

use crate::DataError;

/// One named column: text as parsed off the wire, or coerced numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Number(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(values) => values.len(),
            Column::Number(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow as text values; `None` for a numeric column.
    pub fn text(&self) -> Option<&[String]> {
        match self {
            Column::Text(values) => Some(values),
            Column::Number(_) => None,
        }
    }

    /// Borrow as numeric values; `None` for a text column.
    pub fn number(&self) -> Option<&[f64]> {
        match self {
            Column::Number(values) => Some(values),
            Column::Text(_) => None,
        }
    }

    fn filtered(&self, keep: &[bool]) -> Column {
        fn pick<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, &k)| k)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            Column::Text(values) => Column::Text(pick(values, keep)),
            Column::Number(values) => Column::Number(pick(values, keep)),
        }
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Text(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Text(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Number(values)
    }
}

/// Numeric parse used by coercion: trimmed float or the NaN sentinel.
fn parse_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// The observation table. Column order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTable {
    columns: IndexMap<String, Column>,
}

impl ColumnTable {
    /// Build a table, yielding the invalid instance when the column set is
    /// empty or the lengths disagree. Callers check [`ColumnTable::is_valid`]
    /// rather than handle an error.
    pub fn new(columns: IndexMap<String, Column>) -> Self {
        let Some(first_len) = columns.values().next().map(Column::len) else {
            return Self::invalid();
        };
        if columns.values().any(|c| c.len() != first_len) {
            warn!("rejecting column set with unequal lengths");
            return Self::invalid();
        }
        Self { columns }
    }

    /// The universal invalid/empty instance.
    pub fn invalid() -> Self {
        Self {
            columns: IndexMap::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Common column length; 0 for the invalid instance.
    pub fn row_count(&self) -> usize {
        self.columns.values().next().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Result<&Column, DataError> {
        self.columns
            .get(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Replace or insert a column in place. On a valid table the length must
    /// match the row count; on the invalid instance the first column
    /// establishes the table.
    pub fn set_column(&mut self, name: &str, column: Column) -> Result<(), DataError> {
        if self.is_valid() && column.len() != self.row_count() {
            return Err(DataError::LengthMismatch {
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    /// Coerce a column to numbers in place, substituting the NaN sentinel
    /// for anything unparseable. Never fails on content; an absent column or
    /// an already-numeric one is a no-op.
    pub fn coerce_to_numeric(&mut self, name: &str) {
        if let Some(column) = self.columns.get_mut(name) {
            if let Column::Text(values) = column {
                let numbers = values.iter().map(|v| parse_number(v)).collect();
                *column = Column::Number(numbers);
            }
        }
    }

    /// New table keeping only rows where `keep[i]` is true. Pure: the source
    /// table is unchanged.
    pub fn filter_rows(&self, keep: &[bool]) -> Result<ColumnTable, DataError> {
        if keep.len() != self.row_count() {
            return Err(DataError::LengthMismatch {
                expected: self.row_count(),
                actual: keep.len(),
            });
        }
        Ok(Self {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.filtered(keep)))
                .collect(),
        })
    }
}
