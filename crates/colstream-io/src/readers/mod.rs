//! Row-oriented input adapters producing `ColumnBlock`s.

pub mod csv;
