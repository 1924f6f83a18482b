//! Delimited-file loader with static, best-effort column coercion.
//!
//! Columns named by a [`CoercionRule`] are converted to the rule's type;
//! cells that do not convert become `Null` (or the rule's fill value) and
//! never abort the load. Columns without a rule are typed by inspecting their
//! cells: all integers → `Int`, all numbers → `Float`, otherwise `Text`.

use std::collections::HashSet;
use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use tracing::{debug, info, warn};

use crate::core::value::parse_date;
use crate::core::{Column, ColumnType, Table, Value};
use crate::error::{EtlError, Result};

/// Cells treated as missing before any coercion.
pub const DEFAULT_NA_VALUES: &[&str] = &["", "NaN", "nan", "NA", "N/A", "null", "NULL"];

/// What a coerced column holds when a cell is missing or unconvertible.
#[derive(Debug, Clone, PartialEq)]
pub enum NullPolicy {
    /// Store `Null`.
    Keep,
    /// Store the given value instead.
    Fill(Value),
}

/// Static per-column rule: raw text to a target type.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionRule {
    pub column: String,
    pub target: ColumnType,
    pub on_null: NullPolicy,
    /// Token removed from the raw text before numeric parsing (e.g. `"USD"`).
    pub strip: Option<String>,
}

impl CoercionRule {
    pub fn new(column: impl Into<String>, target: ColumnType) -> Self {
        Self {
            column: column.into(),
            target,
            on_null: NullPolicy::Keep,
            strip: None,
        }
    }

    pub fn fill(mut self, value: impl Into<Value>) -> Self {
        self.on_null = NullPolicy::Fill(value.into());
        self
    }

    pub fn strip(mut self, token: impl Into<String>) -> Self {
        self.strip = Some(token.into());
        self
    }

    /// Convert one raw cell. `None` input means the cell was an NA marker.
    pub fn coerce(&self, raw: Option<&str>) -> Value {
        let value = raw.map_or(Value::Null, |raw| {
            let cleaned = match &self.strip {
                Some(token) => raw.replace(token.as_str(), ""),
                None => raw.to_string(),
            };
            convert(cleaned.trim(), self.target)
        });

        match (&value, &self.on_null) {
            (Value::Null, NullPolicy::Fill(fill)) => fill.clone(),
            _ => value,
        }
    }
}

/// Options for [`load_csv`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub rules: Vec<CoercionRule>,
    /// Remove rows whose raw cells equal an earlier row's, before coercion.
    pub dedup: bool,
    pub delimiter: u8,
    pub na_values: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            dedup: false,
            delimiter: b',',
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LoadOptions {
    pub fn with_rule(mut self, rule: CoercionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Order export: `order_id,customer_name,state,order_date,amount`.
    pub fn sales_orders() -> Self {
        Self::default()
            .with_rule(CoercionRule::new("order_id", ColumnType::Int))
            .with_rule(CoercionRule::new("customer_name", ColumnType::Text))
            .with_rule(CoercionRule::new("state", ColumnType::Text))
            .with_rule(CoercionRule::new("order_date", ColumnType::Date))
            .with_rule(CoercionRule::new("amount", ColumnType::Float))
    }

    /// Raw store sales: `date,store_id,region,product,quantity,price_usd`.
    ///
    /// Duplicates are dropped, missing quantities become 0 and prices may
    /// carry a `USD` suffix.
    pub fn sales_raw() -> Self {
        Self::default()
            .with_dedup(true)
            .with_rule(CoercionRule::new("date", ColumnType::Date))
            .with_rule(CoercionRule::new("quantity", ColumnType::Float).fill(0.0))
            .with_rule(CoercionRule::new("price_usd", ColumnType::Float).strip("USD"))
    }

    fn rule_for(&self, column: &str) -> Option<&CoercionRule> {
        self.rules.iter().find(|r| r.column == column)
    }

    fn is_na(&self, raw: &str) -> bool {
        self.na_values.iter().any(|na| na == raw)
    }
}

/// Load a delimited file into a [`Table`].
///
/// Fails with [`EtlError::FileNotFound`] when `path` does not exist and with
/// [`EtlError::Csv`] on malformed input (ragged rows, invalid UTF-8).
pub fn load_csv<P: AsRef<Path>>(path: P, opts: &LoadOptions) -> Result<Table> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(EtlError::FileNotFound(path.to_path_buf()));
    }
    let shown = path.display().to_string();

    let mut reader = ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| EtlError::csv(&shown, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EtlError::csv(&shown, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EtlError::csv(&shown, e))?;
        raw_rows.push(
            record
                .iter()
                .map(|cell| (!opts.is_na(cell)).then(|| cell.to_string()))
                .collect(),
        );
    }

    if opts.dedup {
        let before = raw_rows.len();
        let mut seen: HashSet<Vec<Option<String>>> = HashSet::with_capacity(before);
        raw_rows.retain(|row| seen.insert(row.clone()));
        debug!("{}: removed {} duplicate rows", shown, before - raw_rows.len());
    }

    for rule in &opts.rules {
        if !headers.contains(&rule.column) {
            warn!("{}: no column '{}' to coerce, rule ignored", shown, rule.column);
        }
    }

    let columns: Vec<Column> = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let column_type = match opts.rule_for(name) {
                Some(rule) => rule.target,
                None => infer_type(raw_rows.iter().filter_map(|row| row[idx].as_deref())),
            };
            Column::new(name.clone(), column_type)
        })
        .collect();

    let mut table = Table::new(columns);
    for raw in raw_rows {
        let row = raw
            .iter()
            .zip(&table.columns)
            .map(|(cell, column)| match opts.rule_for(&column.name) {
                Some(rule) => rule.coerce(cell.as_deref()),
                None => cell
                    .as_deref()
                    .map_or(Value::Null, |c| convert(c, column.column_type)),
            })
            .collect();
        table.push_row(row)?;
    }

    info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        shown
    );
    Ok(table)
}

/// Write a table as comma-separated text with a header row.
///
/// Nulls become empty cells; dates use `YYYY-MM-DD[ HH:MM:SS]`.
pub fn write_csv<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let file = std::fs::File::create(path)?;
    let mut writer = WriterBuilder::new().from_writer(file);

    writer
        .write_record(table.column_names())
        .map_err(|e| EtlError::csv(&shown, e))?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Value::to_text))
            .map_err(|e| EtlError::csv(&shown, e))?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", table.len(), shown);
    Ok(())
}

/// Best-effort conversion of trimmed, non-missing text.
fn convert(raw: &str, target: ColumnType) -> Value {
    match target {
        ColumnType::Int => parse_int(raw).map_or(Value::Null, Value::Int),
        ColumnType::Float => raw.parse::<f64>().map_or(Value::Null, Value::float),
        ColumnType::Text => Value::Text(raw.to_string()),
        ColumnType::Date => parse_date(raw).map_or(Value::Null, Value::Date),
    }
}

/// Integers, also accepting integral floats such as `"3.0"`.
fn parse_int(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
            .map(|v| v as i64)
    })
}

fn infer_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut inferred = ColumnType::Int;
    for cell in cells {
        if inferred == ColumnType::Int && cell.parse::<i64>().is_err() {
            inferred = ColumnType::Float;
        }
        if inferred == ColumnType::Float && cell.parse::<f64>().is_err() {
            return ColumnType::Text;
        }
    }
    inferred
}
