#![forbid(unsafe_code)]
//! colstream-io: byte sinks/sources, block codecs and the block stream.
//!
//! - `buf`: position-tracked `ByteSink`/`ByteSource` over memory or files.
//! - `codec`: codec tags, the schema descriptor codec, and the per-encoding
//!   block codecs (uncompressed, run-length, dictionary) plus their registry.
//! - `stream`: the stream writer/reader and the `write_blocks`/`read_blocks`
//!   entry points.
//! - `readers`/`writers`: CSV adapters that turn rows into blocks and back.
//!
//! Wire layout of a block stream:
//!
//! ```plain
//! BlockStream := Header Body*
//! Header      := CodecTag SchemaDescriptor   (written once)
//! Body        := u32 payload_len, then codec-specific payload for one block
//! ```

pub mod buf;
pub mod codec;
pub mod error;
pub mod readers;
pub mod stream;
pub mod writers;

pub use buf::{ByteSink, ByteSource, PositionedReader, PositionedWriter};
pub use codec::CodecTag;
pub use error::{Error, Result};
pub use stream::{
    create_blocks_writer, read_blocks, read_blocks_from, read_blocks_from_start, write_blocks,
    Blocks, BlocksReader, BlocksWriter,
};
