//! Row-oriented output adapters consuming `ColumnBlock`s.

pub mod csv;
