//! Column-oriented formant table

use crate::error::{Result, TableError};
use std::collections::BTreeMap;

/// A single table column
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Measurements; missing values are NaN
    Numeric(Vec<f64>),
    /// Labels such as speaker or vowel
    Text(Vec<String>),
}

impl Column {
    /// Number of rows in the column
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(values) => values.len(),
            Column::Text(values) => values.len(),
        }
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column holds numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Numeric values, if this is a numeric column
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(values) => Some(values),
            Column::Text(_) => None,
        }
    }

    /// String rendering of a single cell
    pub fn label(&self, row: usize) -> String {
        match self {
            Column::Numeric(values) => format_number(values[row]),
            Column::Text(values) => values[row].clone(),
        }
    }

    /// New column containing only the given rows, in the given order
    pub fn take(&self, rows: &[usize]) -> Column {
        match self {
            Column::Numeric(values) => Column::Numeric(rows.iter().map(|&r| values[r]).collect()),
            Column::Text(values) => Column::Text(rows.iter().map(|&r| values[r].clone()).collect()),
        }
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Numeric(values)
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Text(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Text(values.into_iter().map(String::from).collect())
    }
}

/// Render a number the way it is written back to CSV
pub(crate) fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{}", value)
    }
}

/// Rows sharing the same values in the grouping columns
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Values of the grouping columns, in grouping-column order
    pub key: Vec<String>,
    /// Row indices into the source table, ascending
    pub rows: Vec<usize>,
}

/// Table of formant observations: one row per vowel token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormantTable {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl FormantTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from named columns
    pub fn from_columns<N, I>(columns: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Column)>,
    {
        let mut table = Self::new();
        for (name, column) in columns {
            let name = name.into();
            if table.has_column(&name) {
                return Err(TableError::DuplicateColumn(name));
            }
            table.set_column(name, column)?;
        }
        Ok(table)
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names in table order
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Result<&Column> {
        self.position(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    /// Numeric values of a column
    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        self.column(name)?
            .as_numeric()
            .ok_or_else(|| TableError::NotNumeric(name.to_string()))
    }

    /// Text values of a column
    pub fn text(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Text(values) => Ok(values),
            Column::Numeric(_) => Err(TableError::NotText(name.to_string())),
        }
    }

    /// String view of any column
    pub fn labels(&self, name: &str) -> Result<Vec<String>> {
        let column = self.column(name)?;
        Ok((0..self.rows).map(|row| column.label(row)).collect())
    }

    /// Replace a column in place, or append it if absent
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(TableError::LengthMismatch {
                name,
                expected: self.rows,
                actual: column.len(),
            });
        }
        match self.position(&name) {
            Some(i) => self.columns[i] = column,
            None => {
                self.names.push(name);
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// Remove a column, returning it
    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        let i = self
            .position(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        self.names.remove(i);
        Ok(self.columns.remove(i))
    }

    /// New table holding only the given rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&index) = rows.iter().find(|&&r| r >= self.rows) {
            return Err(TableError::RowOutOfRange {
                index,
                rows: self.rows,
            });
        }
        Ok(Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
            rows: rows.len(),
        })
    }

    /// Fail with the first missing column
    pub fn require_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in names {
            let name = name.as_ref();
            if !self.has_column(name) {
                return Err(TableError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// Split rows by the values of the key columns.
    ///
    /// Groups are ordered by key; rows keep their table order. With no
    /// keys the whole table is a single group with an empty key.
    pub fn group_by<S: AsRef<str>>(&self, keys: &[S]) -> Result<Vec<Group>> {
        if keys.is_empty() {
            return Ok(vec![Group {
                key: Vec::new(),
                rows: (0..self.rows).collect(),
            }]);
        }
        let key_columns = keys
            .iter()
            .map(|k| self.column(k.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut groups: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();
        for row in 0..self.rows {
            let key = key_columns.iter().map(|c| c.label(row)).collect();
            groups.entry(key).or_default().push(row);
        }
        Ok(groups
            .into_iter()
            .map(|(key, rows)| Group { key, rows })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FormantTable {
        FormantTable::from_columns(vec![
            ("speaker", Column::from(vec!["s2", "s1", "s2", "s1"])),
            ("vowel", Column::from(vec!["a", "i", "i", "a"])),
            ("f1", Column::from(vec![700.0, 300.0, 320.0, 750.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let result = FormantTable::from_columns(vec![
            ("a", Column::from(vec![1.0, 2.0])),
            ("b", Column::from(vec![1.0])),
        ]);
        assert!(matches!(result, Err(TableError::LengthMismatch { .. })));
    }

    #[test]
    fn test_from_columns_rejects_duplicates() {
        let result = FormantTable::from_columns(vec![
            ("a", Column::from(vec![1.0])),
            ("a", Column::from(vec![2.0])),
        ]);
        assert!(matches!(result, Err(TableError::DuplicateColumn(_))));
    }

    #[test]
    fn test_set_column_replaces_in_place() {
        let mut table = sample();
        table
            .set_column("vowel", Column::from(vec!["e", "e", "e", "e"]))
            .unwrap();
        assert_eq!(table.column_names(), &["speaker", "vowel", "f1"]);
        assert_eq!(table.labels("vowel").unwrap(), vec!["e"; 4]);
    }

    #[test]
    fn test_set_column_appends() {
        let mut table = sample();
        table
            .set_column("f2", Column::from(vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        assert_eq!(table.column_names().last().unwrap(), "f2");
    }

    #[test]
    fn test_numeric_on_text_column() {
        let table = sample();
        assert!(matches!(
            table.numeric("speaker"),
            Err(TableError::NotNumeric(_))
        ));
        assert_eq!(table.text("vowel").unwrap()[0], "a");
        assert!(matches!(table.text("f1"), Err(TableError::NotText(_))));
        assert!(matches!(
            table.numeric("f9"),
            Err(TableError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_group_by_sorted_keys() {
        let table = sample();
        let groups = table.group_by(&["speaker"]).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, vec!["s1"]);
        assert_eq!(groups[0].rows, vec![1, 3]);
        assert_eq!(groups[1].rows, vec![0, 2]);
    }

    #[test]
    fn test_group_by_multiple_keys() {
        let table = sample();
        let groups = table.group_by(&["speaker", "vowel"]).unwrap();
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].key, vec!["s1", "a"]);
        assert_eq!(groups[0].rows, vec![3]);
    }

    #[test]
    fn test_group_by_no_keys() {
        let table = sample();
        let groups = table.group_by::<&str>(&[]).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_take_rows() {
        let table = sample();
        let subset = table.take_rows(&[3, 0]).unwrap();
        assert_eq!(subset.n_rows(), 2);
        assert_eq!(subset.numeric("f1").unwrap(), &[750.0, 700.0]);
        assert!(table.take_rows(&[4]).is_err());
    }

    #[test]
    fn test_numeric_labels() {
        let table = FormantTable::from_columns(vec![("n", Column::from(vec![1.0, 2.5]))]).unwrap();
        assert_eq!(table.labels("n").unwrap(), vec!["1", "2.5"]);
    }
}
