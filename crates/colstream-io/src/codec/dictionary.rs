//! Dictionary bodies.
//!
//! ```plain
//! u32 dict_len | dict_len tuples | u32 id_count | id_count x u32 id
//! ```

use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use colstream_core::block::{BlockEncoding, ColumnBlock};
use colstream_core::schema::Schema;

use crate::buf::{ByteSink, ByteSource};
use crate::codec::tuple::{read_tuple, write_tuple};
use crate::codec::{
    check_declared_tuples, expect_consumed, payload_err, read_body, write_body,
};
use crate::codec::{BlockCodec, BodyWriter, CodecTag};
use crate::error::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct DictionaryCodec;

impl BlockCodec for DictionaryCodec {
    fn tag(&self) -> CodecTag {
        CodecTag::Dictionary
    }

    fn create_writer(&self) -> Box<dyn BodyWriter> {
        Box::new(DictionaryWriter::default())
    }

    fn read_block(
        &self,
        source: &mut dyn ByteSource,
        schema: &Arc<Schema>,
        position_offset: u64,
    ) -> Result<ColumnBlock> {
        let (payload, position) = read_body(source)?;
        let eof = payload_err(position);
        let mut input = payload.as_slice();

        let dict_len = input.read_u32::<LittleEndian>().map_err(&eof)?;
        check_declared_tuples(u64::from(dict_len), schema, input.len(), position)?;
        let mut dictionary = Vec::with_capacity(dict_len as usize);
        for _ in 0..dict_len {
            dictionary.push(read_tuple(&mut input, schema, position)?);
        }

        let id_count = input.read_u32::<LittleEndian>().map_err(&eof)? as usize;
        if id_count.saturating_mul(4) > input.len() {
            return Err(Error::body(
                position,
                format!("{} ids exceed remaining {} bytes", id_count, input.len()),
            ));
        }
        let mut ids = Vec::with_capacity(id_count);
        for _ in 0..id_count {
            ids.push(input.read_u32::<LittleEndian>().map_err(&eof)?);
        }
        expect_consumed(input, position)?;

        let block = ColumnBlock::dictionary(Arc::clone(schema), dictionary, ids)
            .map_err(|e| Error::body(position, e.to_string()))?;
        Ok(block.with_start_position(position_offset))
    }
}

#[derive(Debug, Default)]
pub struct DictionaryWriter {
    buf: Vec<u8>,
}

impl BodyWriter for DictionaryWriter {
    fn append(&mut self, sink: &mut dyn ByteSink, block: &ColumnBlock) -> Result<()> {
        let BlockEncoding::Dictionary { dictionary, ids } = block.encoding() else {
            return Err(Error::InvalidArgument(format!(
                "dictionary writer cannot encode a {} block",
                block.kind()
            )));
        };
        let dict_len = u32::try_from(dictionary.len())
            .map_err(|_| Error::InvalidArgument("dictionary exceeds u32 entries".into()))?;
        let id_count = u32::try_from(ids.len())
            .map_err(|_| Error::InvalidArgument("dictionary block exceeds u32 ids".into()))?;

        self.buf.clear();
        self.buf.write_u32::<LittleEndian>(dict_len)?;
        for entry in dictionary {
            write_tuple(&mut self.buf, block.schema(), entry)?;
        }
        self.buf.write_u32::<LittleEndian>(id_count)?;
        for &id in ids {
            self.buf.write_u32::<LittleEndian>(id)?;
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
    use colstream_core::schema::{DataType, Field};
    use colstream_core::types::Scalar;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![Field::new("city", DataType::Utf8, false)]))
    }

    fn city(s: &str) -> Vec<Scalar> {
        vec![Scalar::Str(s.into())]
    }

    #[test]
    fn decodes_ids_against_dictionary() {
        let block =
            ColumnBlock::dictionary(schema(), vec![city("oslo"), city("rome")], vec![1, 0, 1, 1])
                .unwrap();
        let mut sink = PositionedWriter::in_memory();
        DictionaryCodec.create_writer().append(&mut sink, &block).unwrap();

        let mut source = PositionedReader::from_bytes(sink.into_inner());
        let decoded = DictionaryCodec.read_block(&mut source, &schema(), 9).unwrap();
        assert_eq!(decoded.count(), 4);
        assert_eq!(decoded.start_position(), 9);
        let names: Vec<_> = decoded.tuples().map(|t| t[0].to_string()).collect();
        assert_eq!(names, ["rome", "oslo", "rome", "rome"]);
    }

    #[test]
    fn out_of_range_id_is_malformed() {
        // dict_len = 0, id_count = 1, id = 0
        let payload: Vec<u8> = [0u32, 1, 0].iter().flat_map(|v| v.to_le_bytes()).collect();
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&payload);

        let mut source = PositionedReader::from_bytes(bytes);
        let err = DictionaryCodec.read_block(&mut source, &schema(), 0).unwrap_err();
        assert!(err.is_malformed(), "{err}");
    }

    #[test]
    fn zero_width_schema_rejects_dictionary_entries() {
        let empty = Arc::new(Schema::new(vec![]));
        let mut payload = 1_000_000u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&0u32.to_le_bytes());
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(&payload);

        let mut source = PositionedReader::from_bytes(bytes);
        let err = DictionaryCodec.read_block(&mut source, &empty, 0).unwrap_err();
        assert!(matches!(err, Error::MalformedBody { .. }), "{err}");
    }
}
