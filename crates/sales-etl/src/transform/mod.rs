//! Transform stage: sales cleaning, totals, filtering, grouping and rate
//! flattening. Every function takes a table and returns or mutates one; none
//! touches the file system or the network.

use std::collections::BTreeMap;

use crate::core::{Column, ColumnType, Table, Value};
use crate::error::Result;
use crate::extract::RateDocument;

/// Title-case every run of letters: `"north east"` → `"North East"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Add (or recompute) `total_sales = quantity * price_usd`.
///
/// The total is null when either factor is null.
pub fn add_total_sales(table: &mut Table) -> Result<()> {
    let qty = table.require_column("quantity")?;
    let price = table.require_column("price_usd")?;
    table.add_column(Column::new("total_sales", ColumnType::Float), |row| {
        match (row[qty].as_f64(), row[price].as_f64()) {
            (Some(q), Some(p)) => Value::float(q * p),
            _ => Value::Null,
        }
    });
    Ok(())
}

/// Clean a raw store-sales table in place.
///
/// Null quantities become 0, `total_sales` is computed and `region` is
/// title-cased. Duplicate removal and price parsing happen at load time.
pub fn clean_sales(table: &mut Table) -> Result<()> {
    let qty = table.require_column("quantity")?;
    for row in &mut table.rows {
        if row[qty].is_null() {
            row[qty] = Value::Float(0.0);
        }
    }

    add_total_sales(table)?;

    if let Some(region) = table.column_index("region") {
        for row in &mut table.rows {
            let titled = row[region].as_str().map(title_case);
            if let Some(titled) = titled {
                row[region] = Value::Text(titled);
            }
        }
    }
    Ok(())
}

/// Rows whose `column` equals `value`, in their original order.
pub fn filter_eq(table: &Table, column: &str, value: &Value) -> Result<Table> {
    let idx = table.require_column(column)?;
    Ok(Table {
        columns: table.columns.clone(),
        rows: table
            .rows
            .iter()
            .filter(|row| &row[idx] == value)
            .cloned()
            .collect(),
    })
}

/// Group by `key` and sum each of `sums`.
///
/// Output columns are `key` followed by `sums`; groups are sorted by the key's
/// text form. Nulls are skipped; a group with no numeric values sums to 0.
/// Rows with a null key are dropped.
pub fn group_sum(table: &Table, key: &str, sums: &[&str]) -> Result<Table> {
    let key_idx = table.require_column(key)?;
    let sum_idx = sums
        .iter()
        .map(|name| table.require_column(name))
        .collect::<Result<Vec<_>>>()?;

    let mut groups: BTreeMap<String, (Value, Vec<f64>)> = BTreeMap::new();
    for row in &table.rows {
        let key_value = &row[key_idx];
        if key_value.is_null() {
            continue;
        }
        let entry = groups
            .entry(key_value.to_text())
            .or_insert_with(|| (key_value.clone(), vec![0.0; sum_idx.len()]));
        for (acc, &idx) in entry.1.iter_mut().zip(&sum_idx) {
            if let Some(v) = row[idx].as_f64() {
                *acc += v;
            }
        }
    }

    let mut columns = vec![table.columns[key_idx].clone()];
    columns.extend(sums.iter().map(|name| Column::new(*name, ColumnType::Float)));

    let rows = groups
        .into_values()
        .map(|(key_value, totals)| {
            std::iter::once(key_value)
                .chain(totals.into_iter().map(Value::float))
                .collect()
        })
        .collect();

    Table::with_rows(columns, rows)
}

/// Flatten a rate document into `currency, rate` rows, one per currency.
pub fn rates_table(document: &RateDocument) -> Table {
    Table {
        columns: vec![
            Column::new("currency", ColumnType::Text),
            Column::new("rate", ColumnType::Float),
        ],
        rows: document
            .bpi
            .iter()
            .map(|(currency, entry)| {
                vec![Value::Text(currency.clone()), Value::float(entry.rate_float)]
            })
            .collect(),
    }
}
