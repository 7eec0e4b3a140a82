//! colstream: streaming serialization of column blocks.
//!
//! Umbrella crate for the workspace; see `colstream-core` for the block and
//! schema types and `colstream-io` for codecs and the stream framing.

pub use colstream_core;
pub use colstream_io;
