//! Core data types shared by the extract, transform and load stages.
//!
//! - [`value`]: typed cell values and column types
//! - [`table`]: the in-memory table passed between stages
//! - [`identifier`]: identifier validation and dialect quoting

pub mod identifier;
pub mod table;
pub mod value;

pub use table::{Column, Table};
pub use value::{ColumnType, Value};
