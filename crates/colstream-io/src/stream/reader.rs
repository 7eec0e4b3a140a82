//! Lazy, single-pass block readers.

use std::io;
use std::iter::FusedIterator;
use std::sync::Arc;

use colstream_core::block::ColumnBlock;
use colstream_core::schema::Schema;

use crate::buf::ByteSource;
use crate::codec::schema::read_schema;
use crate::codec::{codec_for_tag, read_codec_tag, BlockCodec, CodecTag};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    HeaderRead,
    Exhausted,
}

/// Decodes the header on construction, then one block per pull until the
/// source runs dry. Not restartable: once exhausted it stays exhausted, and
/// a decode error is yielded once before exhaustion.
pub struct BlocksReader<S: ByteSource> {
    source: S,
    codec: &'static dyn BlockCodec,
    schema: Arc<Schema>,
    position_offset: u64,
    state: ReaderState,
}

impl<S: ByteSource> BlocksReader<S> {
    pub fn new(mut source: S, start_position: u64) -> Result<Self> {
        let tag = read_codec_tag(&mut source)?;
        let schema = Arc::new(read_schema(&mut source)?);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            codec = %tag,
            fields = schema.len(),
            start_position,
            "read block stream header"
        );

        Ok(Self {
            source,
            codec: codec_for_tag(tag),
            schema,
            position_offset: start_position,
            state: ReaderState::HeaderRead,
        })
    }

    pub fn codec_tag(&self) -> CodecTag {
        self.codec.tag()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Global position the next block will start at.
    pub fn position_offset(&self) -> u64 {
        self.position_offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == ReaderState::Exhausted
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    fn next_block(&mut self) -> Result<Option<ColumnBlock>> {
        if !self.source.is_readable()? {
            return Ok(None);
        }
        let body_at = self.source.position();
        let block = self
            .codec
            .read_block(&mut self.source, &self.schema, self.position_offset)?;
        self.position_offset = self
            .position_offset
            .checked_add(block.count())
            .ok_or_else(|| Error::body(body_at, "tuple position overflows u64"))?;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            start = block.start_position(),
            count = block.count(),
            bytes = self.source.position(),
            "decoded block"
        );

        Ok(Some(block))
    }
}

impl<S: ByteSource> Iterator for BlocksReader<S> {
    type Item = Result<ColumnBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ReaderState::Exhausted {
            return None;
        }
        match self.next_block() {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => {
                self.state = ReaderState::Exhausted;
                #[cfg(feature = "tracing")]
                tracing::debug!(end_position = self.position_offset, "block stream exhausted");
                None
            }
            Err(e) => {
                self.state = ReaderState::Exhausted;
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %e, "block stream decode failed");
                Some(Err(e))
            }
        }
    }
}

impl<S: ByteSource> FusedIterator for BlocksReader<S> {}

/// Restartable view over a stream: every traversal asks the supplier for a
/// fresh source. Nothing is opened until the first pull.
pub struct Blocks<F> {
    supplier: F,
    start_position: u64,
}

impl<F> Blocks<F> {
    pub fn new(supplier: F, start_position: u64) -> Self {
        Self {
            supplier,
            start_position,
        }
    }

    pub fn start_position(&self) -> u64 {
        self.start_position
    }
}

impl<F, S> Blocks<F>
where
    F: Fn() -> io::Result<S>,
    S: ByteSource,
{
    pub fn iter(&self) -> BlocksIter<'_, F, S> {
        BlocksIter {
            supplier: &self.supplier,
            start_position: self.start_position,
            state: IterState::Pending,
        }
    }
}

impl<'a, F, S> IntoIterator for &'a Blocks<F>
where
    F: Fn() -> io::Result<S>,
    S: ByteSource,
{
    type Item = Result<ColumnBlock>;
    type IntoIter = BlocksIter<'a, F, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

enum IterState<S: ByteSource> {
    Pending,
    Reading(BlocksReader<S>),
    Done,
}

/// One traversal of a [`Blocks`] view. Open and header errors surface as
/// the first item.
pub struct BlocksIter<'a, F, S: ByteSource> {
    supplier: &'a F,
    start_position: u64,
    state: IterState<S>,
}

impl<'a, F, S> BlocksIter<'a, F, S>
where
    F: Fn() -> io::Result<S>,
    S: ByteSource,
{
    fn open(&self) -> Result<BlocksReader<S>> {
        let source = (self.supplier)()?;
        BlocksReader::new(source, self.start_position)
    }
}

impl<'a, F, S> Iterator for BlocksIter<'a, F, S>
where
    F: Fn() -> io::Result<S>,
    S: ByteSource,
{
    type Item = Result<ColumnBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if let IterState::Pending = self.state {
            match self.open() {
                Ok(reader) => self.state = IterState::Reading(reader),
                Err(e) => {
                    self.state = IterState::Done;
                    return Some(Err(e));
                }
            }
        }
        let IterState::Reading(reader) = &mut self.state else {
            return None;
        };
        let item = reader.next();
        if item.is_none() {
            self.state = IterState::Done;
        }
        item
    }
}

impl<'a, F, S> FusedIterator for BlocksIter<'a, F, S>
where
    F: Fn() -> io::Result<S>,
    S: ByteSource,
{
}
