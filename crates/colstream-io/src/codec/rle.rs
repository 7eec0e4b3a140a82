//! Run-length bodies: `u64 count` followed by the single repeated tuple.

use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use colstream_core::block::{BlockEncoding, ColumnBlock};
use colstream_core::schema::Schema;

use crate::buf::{ByteSink, ByteSource};
use crate::codec::tuple::{read_tuple, write_tuple};
use crate::codec::{expect_consumed, payload_err, read_body, write_body};
use crate::codec::{BlockCodec, BodyWriter, CodecTag};
use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct RunLengthCodec;

impl BlockCodec for RunLengthCodec {
    fn tag(&self) -> CodecTag {
        CodecTag::RunLength
    }

    fn create_writer(&self) -> Box<dyn BodyWriter> {
        Box::new(RunLengthWriter::default())
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
            .read_u64::<LittleEndian>()
            .map_err(payload_err(position))?;
        if schema.is_empty() && count > 0 {
            return Err(Error::body(
                position,
                format!("{count} tuples declared for a zero-width schema"),
            ));
        }
        let value = read_tuple(&mut input, schema, position)?;
        expect_consumed(input, position)?;
        let block = ColumnBlock::run_length(Arc::clone(schema), value, count)
            .map_err(|e| Error::body(position, e.to_string()))?;
        Ok(block.with_start_position(position_offset))
    }
}

#[derive(Debug, Default)]
pub struct RunLengthWriter {
    buf: Vec<u8>,
}

impl BodyWriter for RunLengthWriter {
    fn append(&mut self, sink: &mut dyn ByteSink, block: &ColumnBlock) -> Result<()> {
        let BlockEncoding::RunLength { value, count } = block.encoding() else {
            return Err(Error::InvalidArgument(format!(
                "run-length writer cannot encode a {} block",
                block.kind()
            )));
        };
        self.buf.clear();
        self.buf.write_u64::<LittleEndian>(*count)?;
        write_tuple(&mut self.buf, block.schema(), value)?;
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
    use colstream_core::schema::{DataType, Field};
    use colstream_core::types::Scalar;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("k", DataType::Utf8, false),
            Field::new("v", DataType::Int64, true),
        ]))
    }

    #[test]
    fn body_is_compact() {
        let block = ColumnBlock::run_length(
            schema(),
            vec![Scalar::Str("ab".into()), Scalar::Null],
            1_000_000,
        )
        .unwrap();
        let mut sink = PositionedWriter::in_memory();
        RunLengthCodec.create_writer().append(&mut sink, &block).unwrap();
        // len + count + (u32 len + "ab") + presence byte
        assert_eq!(sink.position(), 4 + 8 + 6 + 1);

        let mut source = PositionedReader::from_bytes(sink.into_inner());
        let decoded = RunLengthCodec.read_block(&mut source, &schema(), 0).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn rejects_other_encodings() {
        let block = ColumnBlock::uncompressed(
            schema(),
            vec![vec![Scalar::Str("a".into()), Scalar::I64(1)]],
        )
        .unwrap();
        let mut sink = PositionedWriter::in_memory();
        let err = RunLengthCodec
            .create_writer()
            .append(&mut sink, &block)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(sink.position(), 0);
    }

    #[test]
    fn zero_width_schema_rejects_run() {
        let empty = Arc::new(Schema::new(vec![]));
        let payload = u64::MAX.to_le_bytes();
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&payload);

        let mut source = PositionedReader::from_bytes(bytes);
        let err = RunLengthCodec.read_block(&mut source, &empty, 0).unwrap_err();
        assert!(matches!(err, Error::MalformedBody { .. }), "{err}");
    }
}
