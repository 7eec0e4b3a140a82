#![forbid(unsafe_code)]
//! colstream-core: shared kernel for the colstream block protocol.
//!
//! This crate contains only *pure* types and small helpers. There is
//! **no I/O** here; byte sinks, codecs and the stream framing live in
//! `colstream-io`.
//!
//! Crates that use this:
//! - colstream-io: encodes/decodes `ColumnBlock`s and frames them into streams.
//! - colstream-cli: builds blocks from CSV input and prints decoded streams.

pub mod block;
pub mod config;
pub mod error;
pub mod prelude;
pub mod schema;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
