//! In-memory table: the unit of data passed from extract to load.

use serde::{Deserialize, Serialize};

use super::value::{ColumnType, Value};
use crate::error::{EtlError, Result};

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name (header text as read).
    pub name: String,

    /// Logical type of every non-null cell in the column.
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Ordered rows over a fixed column set.
///
/// Every row holds exactly one [`Value`] per column, in column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table over the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, checking each row's arity.
    pub fn with_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Position of a column, or a config error naming the missing column.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| EtlError::Config(format!("Column '{}' not found", name)))
    }

    /// Iterate over the cells of one column.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(EtlError::Config(format!(
                "Row has {} values but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a column computed from each row. Replaces an existing column
    /// of the same name in place.
    pub fn add_column<F>(&mut self, column: Column, mut f: F)
    where
        F: FnMut(&[Value]) -> Value,
    {
        match self.column_index(&column.name) {
            Some(idx) => {
                for row in &mut self.rows {
                    let value = f(row);
                    row[idx] = value;
                }
                self.columns[idx] = column;
            }
            None => {
                for row in &mut self.rows {
                    let value = f(row);
                    row.push(value);
                }
                self.columns.push(column);
            }
        }
    }

    /// First `n` rows as a new table.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Fixed-width text rendering of the first `n` rows, for console output.
    pub fn render_preview(&self, n: usize) -> String {
        let head = self.head(n);
        let cells: Vec<Vec<String>> = head
            .rows
            .iter()
            .map(|row| row.iter().map(Value::to_string).collect())
            .collect();

        let widths: Vec<usize> = head
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                cells
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(col.name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_line = |values: Vec<&str>| -> String {
            values
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:>width$}", v, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut lines = vec![format_line(head.column_names())];
        for row in &cells {
            lines.push(format_line(row.iter().map(String::as_str).collect()));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        Table::with_rows(
            vec![
                Column::new("id", ColumnType::Int),
                Column::new("name", ColumnType::Text),
                Column::new("amount", ColumnType::Float),
            ],
            vec![
                vec![Value::Int(1), Value::from("A"), Value::Float(10.0)],
                vec![Value::Int(2), Value::from("B"), Value::Null],
                vec![Value::Int(1), Value::from("A"), Value::Float(10.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_push_row_checks_arity() {
        let mut table = people();
        assert!(table.push_row(vec![Value::Int(3)]).is_err());
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_add_column_appends_and_replaces() {
        let mut table = people();
        table.add_column(Column::new("double", ColumnType::Float), |row| {
            row[2].as_f64().map(|v| v * 2.0).into()
        });
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.rows[0][3], Value::Float(20.0));
        assert_eq!(table.rows[1][3], Value::Null);

        table.add_column(Column::new("name", ColumnType::Text), |row| {
            Value::from(row[1].to_text().to_lowercase())
        });
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.rows[0][1], Value::from("a"));
    }

    #[test]
    fn test_render_preview() {
        let preview = people().render_preview(2);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("id"));
        assert!(lines[0].contains("amount"));
        assert!(lines[2].contains("NULL"));
    }

    #[test]
    fn test_column_lookup() {
        let table = people();
        assert_eq!(table.column_index("name"), Some(1));
        assert!(table.require_column("missing").is_err());
        let ids: Vec<&Value> = table.column("id").unwrap().collect();
        assert_eq!(ids.len(), 3);
    }
}
