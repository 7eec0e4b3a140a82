//! Uncompressed bodies: `u32 tuple_count` followed by every tuple.
//!
//! The writer accepts blocks in any encoding and materializes their tuples.

use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use colstream_core::block::ColumnBlock;
use colstream_core::schema::Schema;

use crate::buf::{ByteSink, ByteSource};
use crate::codec::tuple::{read_tuple, write_tuple};
use crate::codec::{
    check_declared_tuples, expect_consumed, payload_err, read_body, write_body,
};
use crate::codec::{BlockCodec, BodyWriter, CodecTag};
use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct UncompressedCodec;

impl BlockCodec for UncompressedCodec {
    fn tag(&self) -> CodecTag {
        CodecTag::Uncompressed
    }

    fn create_writer(&self) -> Box<dyn BodyWriter> {
        Box::new(UncompressedWriter::default())
    }

    fn read_block(
        &self,
        source: &mut dyn ByteSource,
        schema: &Arc<Schema>,
        position_offset: u64,
    ) -> Result<ColumnBlock> {
        let (payload, position) = read_body(source)?;
        let mut input = payload.as_slice();
        let count = input
            .read_u32::<LittleEndian>()
            .map_err(payload_err(position))?;
        check_declared_tuples(u64::from(count), schema, input.len(), position)?;
        let mut tuples = Vec::with_capacity(count as usize);
        for _ in 0..count {
            tuples.push(read_tuple(&mut input, schema, position)?);
        }
        expect_consumed(input, position)?;
        let block = ColumnBlock::uncompressed(Arc::clone(schema), tuples)
            .map_err(|e| Error::body(position, e.to_string()))?;
        Ok(block.with_start_position(position_offset))
    }
}

#[derive(Debug, Default)]
pub struct UncompressedWriter {
    buf: Vec<u8>,
}

impl BodyWriter for UncompressedWriter {
    fn append(&mut self, sink: &mut dyn ByteSink, block: &ColumnBlock) -> Result<()> {
        let count = u32::try_from(block.count()).map_err(|_| {
            Error::InvalidArgument(format!(
                "uncompressed block of {} tuples exceeds u32",
                block.count()
            ))
        })?;
        self.buf.clear();
        self.buf.write_u32::<LittleEndian>(count)?;
        for tuple in block.tuples() {
            write_tuple(&mut self.buf, block.schema(), tuple)?;
        }
        write_body(sink, &self.buf)
    }

    fn finish(&mut self, _sink: &mut dyn ByteSink) -> Result<()> {
        self.buf = Vec::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buf::{PositionedReader, PositionedWriter};
    use colstream_core::block::EncodingKind;
    use colstream_core::schema::{DataType, Field};
    use colstream_core::types::Scalar;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![Field::new("v", DataType::Int32, false)]))
    }

    #[test]
    fn materializes_run_length_blocks() {
        let rle = ColumnBlock::run_length(schema(), vec![Scalar::I32(4)], 3).unwrap();
        let mut sink = PositionedWriter::in_memory();
        let mut w = UncompressedCodec.create_writer();
        w.append(&mut sink, &rle).unwrap();
        w.finish(&mut sink).unwrap();

        let mut source = PositionedReader::from_bytes(sink.into_inner());
        let block = UncompressedCodec.read_block(&mut source, &schema(), 5).unwrap();
        assert!(block.same_content(&rle));
        assert_eq!(block.start_position(), 5);
        assert_eq!(block.kind(), EncodingKind::Uncompressed);
    }

    #[test]
    fn truncated_body_reports_declared_length() {
        let block = ColumnBlock::uncompressed(schema(), vec![vec![Scalar::I32(1)]]).unwrap();
        let mut sink = PositionedWriter::in_memory();
        let mut w = UncompressedCodec.create_writer();
        w.append(&mut sink, &block).unwrap();
        let mut bytes = sink.into_inner();
        bytes.pop();

        let mut source = PositionedReader::from_bytes(bytes);
        let err = UncompressedCodec.read_block(&mut source, &schema(), 0).unwrap_err();
        match err {
            Error::MalformedBody { position, reason } => {
                assert_eq!(position, 0);
                assert!(reason.contains("declared length"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn body(payload: &[u8]) -> Vec<u8> {
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn zero_width_schema_rejects_declared_tuples() {
        let empty = Arc::new(Schema::new(vec![]));
        let bytes = body(&200_000_000u32.to_le_bytes());
        let mut source = PositionedReader::from_bytes(bytes);
        let err = UncompressedCodec.read_block(&mut source, &empty, 0).unwrap_err();
        assert!(matches!(err, Error::MalformedBody { .. }), "{err}");

        let mut source = PositionedReader::from_bytes(body(&0u32.to_le_bytes()));
        let block = UncompressedCodec.read_block(&mut source, &empty, 0).unwrap();
        assert!(block.is_empty());
    }

    #[test]
    fn declared_count_bounded_by_payload() {
        let mut payload = u32::MAX.to_le_bytes().to_vec();
        payload.extend_from_slice(&7i32.to_le_bytes());
        let mut source = PositionedReader::from_bytes(body(&payload));
        match UncompressedCodec.read_block(&mut source, &schema(), 0).unwrap_err() {
            Error::MalformedBody { reason, .. } => {
                assert!(reason.contains("payload bytes remain"), "{reason}")
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
