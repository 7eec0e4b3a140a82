//! Stream writer: binds codec and schema on the first block, writes the
//! header once, then forwards every block to the bound body writer.

use std::io::{self, Write};
use std::sync::Arc;

use colstream_core::block::ColumnBlock;
use colstream_core::schema::Schema;

use crate::buf::ByteSink;
use crate::codec::schema::write_schema;
use crate::codec::{codec_for_block, codec_for_tag, write_codec_tag};
use crate::codec::{BlockCodec, BodyWriter, CodecTag};
use crate::error::{Error, Result};

enum WriterState {
    Unbound,
    Bound {
        codec: &'static dyn BlockCodec,
        body: Box<dyn BodyWriter>,
        schema: Arc<Schema>,
        blocks: u64,
        tuples: u64,
    },
}

pub struct BlocksWriter<S: ByteSink> {
    sink: S,
    state: WriterState,
}

impl<S: ByteSink> BlocksWriter<S> {
    /// A writer that binds its codec and schema from the first appended
    /// block.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: WriterState::Unbound,
        }
    }

    /// A writer bound up front; the header is written immediately, so
    /// finishing without appends yields a valid header-only stream.
    pub fn bound(sink: S, tag: CodecTag, schema: impl Into<Arc<Schema>>) -> Result<Self> {
        let mut writer = Self::new(sink);
        writer.bind(codec_for_tag(tag), schema.into())?;
        Ok(writer)
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.state, WriterState::Bound { .. })
    }

    pub fn codec_tag(&self) -> Option<CodecTag> {
        match &self.state {
            WriterState::Bound { codec, .. } => Some(codec.tag()),
            WriterState::Unbound => None,
        }
    }

    /// The schema written into the header, once bound.
    pub fn schema(&self) -> Option<&Schema> {
        match &self.state {
            WriterState::Bound { schema, .. } => Some(&**schema),
            WriterState::Unbound => None,
        }
    }

    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    /// Append one block. Later blocks are not checked against the bound
    /// schema.
    pub fn append(&mut self, block: &ColumnBlock) -> Result<&mut Self> {
        if !self.sink.is_writable() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "byte sink is not writable",
            )));
        }
        if let WriterState::Unbound = self.state {
            self.bind(codec_for_block(block), Arc::clone(block.schema_arc()))?;
        }
        let WriterState::Bound {
            body,
            blocks,
            tuples,
            ..
        } = &mut self.state
        else {
            return Err(Error::Unbound);
        };
        let total = tuples.checked_add(block.count()).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "block of {} tuples overflows the stream position after {} tuples",
                block.count(),
                tuples
            ))
        })?;
        body.append(&mut self.sink, block)?;
        *blocks += 1;
        *tuples = total;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            block = *blocks,
            count = block.count(),
            position = self.sink.position(),
            "appended block"
        );

        Ok(self)
    }

    /// Finalize the bound body writer, flush the sink and hand it back.
    pub fn finish(mut self) -> Result<S> {
        let WriterState::Bound {
            body,
            codec,
            blocks,
            tuples,
            ..
        } = &mut self.state
        else {
            return Err(Error::Unbound);
        };
        body.finish(&mut self.sink)?;
        self.sink.flush()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            codec = %codec.tag(),
            blocks = *blocks,
            tuples = *tuples,
            bytes = self.sink.position(),
            "finished block stream"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = (codec, blocks, tuples);

        Ok(self.sink)
    }

    fn bind(&mut self, codec: &'static dyn BlockCodec, schema: Arc<Schema>) -> Result<()> {
        let body = codec.create_writer();
        write_codec_tag(&mut self.sink, codec.tag())?;
        write_schema(&mut self.sink, &schema)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            codec = %codec.tag(),
            fields = schema.len(),
            header_bytes = self.sink.position(),
            "bound block stream"
        );

        self.state = WriterState::Bound {
            codec,
            body,
            schema,
            blocks: 0,
            tuples: 0,
        };
        Ok(())
    }
}
