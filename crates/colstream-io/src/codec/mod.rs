//! Block codecs and the header codecs.
//!
//! Every block body is framed as `u32 payload_len` followed by the payload,
//! so a codec can tell a truncated body from a short final read. What goes
//! inside the payload is up to each codec.

use std::io::Read;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use colstream_core::block::ColumnBlock;
use colstream_core::schema::Schema;

use crate::buf::{ByteSink, ByteSource};
use crate::error::{Error, Result};

pub mod dictionary;
pub mod registry;
pub mod rle;
pub mod schema;
pub mod tag;
pub mod tuple;
pub mod uncompressed;

pub use registry::{codec_for_block, codec_for_tag};
pub use tag::{read_codec_tag, write_codec_tag, CodecTag};

/// A pluggable encoder/decoder for one block-body representation.
pub trait BlockCodec: Send + Sync {
    fn tag(&self) -> CodecTag;

    /// A fresh body writer for one stream.
    fn create_writer(&self) -> Box<dyn BodyWriter>;

    /// Decode exactly one block body from the current source position.
    /// The returned block starts at `position_offset`.
    fn read_block(
        &self,
        source: &mut dyn ByteSource,
        schema: &Arc<Schema>,
        position_offset: u64,
    ) -> Result<ColumnBlock>;
}

/// Appends block bodies for one stream. The stream writer owns the sink and
/// lends it to every call.
pub trait BodyWriter: Send {
    fn append(&mut self, sink: &mut dyn ByteSink, block: &ColumnBlock) -> Result<()>;

    /// Write any trailing state. Called once, after the last append.
    fn finish(&mut self, sink: &mut dyn ByteSink) -> Result<()>;
}

pub(crate) fn write_body(sink: &mut dyn ByteSink, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| {
        Error::InvalidArgument(format!("block body of {} bytes exceeds u32", payload.len()))
    })?;
    sink.write_u32::<LittleEndian>(len)?;
    sink.write_all(payload)?;
    Ok(())
}

/// Read one framed payload. Returns the payload and the source position
/// where the body started.
pub(crate) fn read_body(source: &mut dyn ByteSource) -> Result<(Vec<u8>, u64)> {
    let start = source.position();
    let len = source.read_u32::<LittleEndian>().map_err(|e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::body(start, "truncated body length"),
        _ => Error::Io(e),
    })?;
    let mut payload = Vec::new();
    (&mut *source)
        .take(u64::from(len))
        .read_to_end(&mut payload)?;
    if payload.len() != len as usize {
        return Err(Error::body(
            start,
            format!(
                "declared length {} exceeds remaining {} bytes",
                len,
                payload.len()
            ),
        ));
    }
    Ok((payload, start))
}

/// Map a short read inside an already-framed payload to a body error.
pub(crate) fn payload_err(position: u64) -> impl Fn(std::io::Error) -> Error {
    move |e| match e.kind() {
        std::io::ErrorKind::UnexpectedEof => Error::body(position, "payload ends mid-value"),
        _ => Error::Io(e),
    }
}

/// Reject a declared tuple count the remaining payload cannot hold. Every
/// encoded field takes at least one byte, and a zero-width schema carries
/// no tuples.
pub(crate) fn check_declared_tuples(
    count: u64,
    schema: &Schema,
    remaining: usize,
    position: u64,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    if schema.is_empty() {
        return Err(Error::body(
            position,
            format!("{count} tuples declared for a zero-width schema"),
        ));
    }
    let fits = (remaining / schema.len()) as u64;
    if count > fits {
        return Err(Error::body(
            position,
            format!("{count} tuples declared but only {remaining} payload bytes remain"),
        ));
    }
    Ok(())
}

pub(crate) fn expect_consumed(payload: &[u8], position: u64) -> Result<()> {
    if payload.is_empty() {
        Ok(())
    } else {
        Err(Error::body(
            position,
            format!("{} trailing bytes after block payload", payload.len()),
        ))
    }
}
