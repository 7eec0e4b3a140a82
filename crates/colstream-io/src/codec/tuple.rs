//! Tuple value encoding shared by all block codecs.
//!
//! Values are written in schema order. Nullable fields carry a presence
//! byte (0 = null, 1 = value) ahead of the value.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use colstream_core::schema::{DataType, Field, Schema};
use colstream_core::types::{Scalar, Tuple};

use crate::codec::payload_err;
use crate::error::{Error, Result};

pub fn write_tuple(out: &mut Vec<u8>, schema: &Schema, tuple: &Tuple) -> Result<()> {
    if tuple.len() != schema.len() {
        return Err(Error::InvalidArgument(format!(
            "tuple arity {} does not match schema arity {}",
            tuple.len(),
            schema.len()
        )));
    }
    for (field, value) in schema.fields.iter().zip(tuple) {
        write_value(out, field, value)?;
    }
    Ok(())
}

fn write_value(out: &mut Vec<u8>, field: &Field, value: &Scalar) -> Result<()> {
    if field.nullable {
        out.write_u8(u8::from(!value.is_null()))?;
        if value.is_null() {
            return Ok(());
        }
    }
    match (field.data_type, value) {
        (DataType::Boolean, Scalar::Bool(b)) => out.write_u8(u8::from(*b))?,
        (DataType::Int32, Scalar::I32(i)) => out.write_i32::<LittleEndian>(*i)?,
        (DataType::Int64 | DataType::Date64, Scalar::I64(i)) => {
            out.write_i64::<LittleEndian>(*i)?
        }
        (DataType::Float32, Scalar::F32(f)) => out.write_f32::<LittleEndian>(*f)?,
        (DataType::Float64, Scalar::F64(f)) => out.write_f64::<LittleEndian>(*f)?,
        (DataType::Utf8, Scalar::Str(s)) => write_bytes(out, s.as_bytes())?,
        (DataType::Binary, Scalar::Bin(b)) => write_bytes(out, b)?,
        (ty, v) => {
            return Err(Error::InvalidArgument(format!(
                "value {:?} does not conform to field '{}' ({})",
                v,
                field.name,
                ty.name()
            )))
        }
    }
    Ok(())
}

fn write_bytes(out: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| Error::InvalidArgument(format!("value of {} bytes exceeds u32", bytes.len())))?;
    out.write_u32::<LittleEndian>(len)?;
    out.extend_from_slice(bytes);
    Ok(())
}

/// Decode one tuple from `input`, advancing it. `position` is the start of
/// the enclosing body, used for error reporting.
pub fn read_tuple(input: &mut &[u8], schema: &Schema, position: u64) -> Result<Tuple> {
    schema
        .fields
        .iter()
        .map(|field| read_value(input, field, position))
        .collect()
}

fn read_value(input: &mut &[u8], field: &Field, position: u64) -> Result<Scalar> {
    let eof = payload_err(position);
    if field.nullable {
        match input.read_u8().map_err(&eof)? {
            0 => return Ok(Scalar::Null),
            1 => {}
            other => {
                return Err(Error::body(
                    position,
                    format!("invalid presence flag {other} for field '{}'", field.name),
                ))
            }
        }
    }
    let value = match field.data_type {
        DataType::Boolean => match input.read_u8().map_err(&eof)? {
            0 => Scalar::Bool(false),
            1 => Scalar::Bool(true),
            other => {
                return Err(Error::body(
                    position,
                    format!("invalid boolean byte {other} for field '{}'", field.name),
                ))
            }
        },
        DataType::Int32 => Scalar::I32(input.read_i32::<LittleEndian>().map_err(&eof)?),
        DataType::Int64 | DataType::Date64 => {
            Scalar::I64(input.read_i64::<LittleEndian>().map_err(&eof)?)
        }
        DataType::Float32 => Scalar::F32(input.read_f32::<LittleEndian>().map_err(&eof)?),
        DataType::Float64 => Scalar::F64(input.read_f64::<LittleEndian>().map_err(&eof)?),
        DataType::Utf8 => {
            let bytes = read_bytes(input, position)?;
            Scalar::Str(String::from_utf8(bytes).map_err(|_| {
                Error::body(position, format!("field '{}' is not valid utf-8", field.name))
            })?)
        }
        DataType::Binary => Scalar::Bin(read_bytes(input, position)?),
    };
    Ok(value)
}

fn read_bytes(input: &mut &[u8], position: u64) -> Result<Vec<u8>> {
    let len = input
        .read_u32::<LittleEndian>()
        .map_err(payload_err(position))? as usize;
    if len > input.len() {
        return Err(Error::body(
            position,
            format!("value length {} exceeds remaining {} bytes", len, input.len()),
        ));
    }
    let (head, rest) = input.split_at(len);
    *input = rest;
    Ok(head.to_vec())
}
