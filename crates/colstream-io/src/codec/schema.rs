//! Binary schema descriptor.
//!
//! ```plain
//! u16 field_count
//! per field: u8 type_id | u8 nullable | u16 name_len | name (utf-8)
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use colstream_core::schema::{DataType, Field, Schema};

use crate::buf::{ByteSink, ByteSource};
use crate::error::{Error, Result};

pub fn write_schema(sink: &mut dyn ByteSink, schema: &Schema) -> Result<()> {
    let count = u16::try_from(schema.len()).map_err(|_| {
        Error::InvalidArgument(format!("schema has {} fields, max {}", schema.len(), u16::MAX))
    })?;
    sink.write_u16::<LittleEndian>(count)?;
    for field in &schema.fields {
        let name = field.name.as_bytes();
        let name_len = u16::try_from(name.len()).map_err(|_| {
            Error::InvalidArgument(format!("field name '{}' is too long", field.name))
        })?;
        sink.write_u8(field.data_type.type_id())?;
        sink.write_u8(u8::from(field.nullable))?;
        sink.write_u16::<LittleEndian>(name_len)?;
        sink.write_all(name)?;
    }
    Ok(())
}

pub fn read_schema(source: &mut dyn ByteSource) -> Result<Schema> {
    let count = source
        .read_u16::<LittleEndian>()
        .map_err(|e| Error::header(e, "schema field count"))?;
    let mut fields = Vec::with_capacity(count as usize);
    for idx in 0..count {
        let type_id = source
            .read_u8()
            .map_err(|e| Error::header(e, "schema field type"))?;
        let data_type = DataType::from_type_id(type_id).ok_or_else(|| {
            Error::MalformedHeader(format!("field {idx} has unknown type id {type_id}"))
        })?;
        let nullable = match source
            .read_u8()
            .map_err(|e| Error::header(e, "schema nullable flag"))?
        {
            0 => false,
            1 => true,
            other => {
                return Err(Error::MalformedHeader(format!(
                    "field {idx} has invalid nullable flag {other}"
                )))
            }
        };
        let name_len = source
            .read_u16::<LittleEndian>()
            .map_err(|e| Error::header(e, "schema field name length"))?;
        let mut name = vec![0u8; name_len as usize];
        source
            .read_exact(&mut name)
            .map_err(|e| Error::header(e, "schema field name"))?;
        let name = String::from_utf8(name)
            .map_err(|_| Error::MalformedHeader(format!("field {idx} name is not utf-8")))?;
        fields.push(Field::new(name, data_type, nullable));
    }
    Ok(Schema::new(fields))
}
