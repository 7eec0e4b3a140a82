//! Block stream framing and its entry points.
//!
//! One stream carries exactly one codec and one schema, bound from the first
//! block written. Readers rebuild global tuple positions from a caller
//! supplied start position; positions are not stored on the wire.

use std::borrow::Borrow;
use std::io;

use colstream_core::block::ColumnBlock;

use crate::buf::{ByteSink, ByteSource};
use crate::error::Result;

mod reader;
mod writer;

pub use reader::{Blocks, BlocksIter, BlocksReader};
pub use writer::BlocksWriter;

pub fn create_blocks_writer<S: ByteSink>(sink: S) -> BlocksWriter<S> {
    BlocksWriter::new(sink)
}

/// Write every block in iteration order as one stream, then finish it.
/// On error the sink is left with whatever was already written.
pub fn write_blocks<S, I>(sink: S, blocks: I) -> Result<S>
where
    S: ByteSink,
    I: IntoIterator,
    I::Item: Borrow<ColumnBlock>,
{
    let mut writer = BlocksWriter::new(sink);
    for block in blocks {
        writer.append(block.borrow())?;
    }
    writer.finish()
}

/// Single-pass reader over one source. The header is decoded here.
pub fn read_blocks<S: ByteSource>(source: S, start_position: u64) -> Result<BlocksReader<S>> {
    BlocksReader::new(source, start_position)
}

/// Restartable view; each traversal reopens the source via `supplier`.
pub fn read_blocks_from<F, S>(supplier: F, start_position: u64) -> Blocks<F>
where
    F: Fn() -> io::Result<S>,
    S: ByteSource,
{
    Blocks::new(supplier, start_position)
}

pub fn read_blocks_from_start<F, S>(supplier: F) -> Blocks<F>
where
    F: Fn() -> io::Result<S>,
    S: ByteSource,
{
    read_blocks_from(supplier, 0)
}
