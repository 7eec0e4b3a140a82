//! Tuple schema descriptors. Pure data; the binary descriptor codec lives in
//! `colstream-io`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Scalar, Tuple};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    /// Milliseconds since epoch, carried as `Scalar::I64`.
    Date64,
}

impl DataType {
    /// Stable one-byte identifier used by the schema descriptor codec.
    pub fn type_id(self) -> u8 {
        match self {
            DataType::Boolean => 0,
            DataType::Int32 => 1,
            DataType::Int64 => 2,
            DataType::Float32 => 3,
            DataType::Float64 => 4,
            DataType::Utf8 => 5,
            DataType::Binary => 6,
            DataType::Date64 => 7,
        }
    }

    pub fn from_type_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => DataType::Boolean,
            1 => DataType::Int32,
            2 => DataType::Int64,
            3 => DataType::Float32,
            4 => DataType::Float64,
            5 => DataType::Utf8,
            6 => DataType::Binary,
            7 => DataType::Date64,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Boolean => "bool",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Utf8 => "utf8",
            DataType::Binary => "binary",
            DataType::Date64 => "date64",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => DataType::Boolean,
            "int32" | "i32" => DataType::Int32,
            "int64" | "i64" => DataType::Int64,
            "float32" | "f32" => DataType::Float32,
            "float64" | "f64" => DataType::Float64,
            "utf8" | "string" | "str" => DataType::Utf8,
            "binary" | "bin" => DataType::Binary,
            "date64" => DataType::Date64,
            _ => return None,
        })
    }

    /// Whether a non-null scalar is representable under this type.
    pub fn accepts(self, value: &Scalar) -> bool {
        matches!(
            (self, value),
            (DataType::Boolean, Scalar::Bool(_))
                | (DataType::Int32, Scalar::I32(_))
                | (DataType::Int64, Scalar::I64(_))
                | (DataType::Float32, Scalar::F32(_))
                | (DataType::Float64, Scalar::F64(_))
                | (DataType::Utf8, Scalar::Str(_))
                | (DataType::Binary, Scalar::Bin(_))
                | (DataType::Date64, Scalar::I64(_))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn accepts(&self, value: &Scalar) -> bool {
        match value {
            Scalar::Null => self.nullable,
            v => self.data_type.accepts(v),
        }
    }
}

/// Shape of every tuple in a block (and, once bound, in a whole stream).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Check a tuple's arity and per-field value types.
    pub fn check_tuple(&self, tuple: &Tuple) -> Result<()> {
        if tuple.len() != self.fields.len() {
            return Err(Error::Schema(format!(
                "tuple arity {} does not match schema arity {}",
                tuple.len(),
                self.fields.len()
            )));
        }
        for (field, value) in self.fields.iter().zip(tuple.iter()) {
            if !field.accepts(value) {
                return Err(Error::Schema(format!(
                    "value {:?} does not conform to field '{}' ({}{})",
                    value,
                    field.name,
                    field.data_type.name(),
                    if field.nullable { ", nullable" } else { "" }
                )));
            }
        }
        Ok(())
    }

    /// Parse a compact schema definition such as `id:int64,name:utf8?`.
    /// A trailing `?` marks the field nullable.
    pub fn parse(text: &str) -> Result<Self> {
        let mut fields = Vec::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, ty) = part
                .split_once(':')
                .ok_or_else(|| Error::Schema(format!("expected name:type, got '{part}'")))?;
            let (ty, nullable) = match ty.trim().strip_suffix('?') {
                Some(t) => (t, true),
                None => (ty.trim(), false),
            };
            let data_type = DataType::parse(ty)
                .ok_or_else(|| Error::Schema(format!("unknown data type '{ty}' for field '{name}'")))?;
            fields.push(Field::new(name.trim(), data_type, nullable));
        }
        if fields.is_empty() {
            return Err(Error::Schema("schema has no fields".into()));
        }
        Ok(Schema::new(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_schema_text() {
        let schema = Schema::parse("id:int64, name:utf8?").unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.fields[0], Field::new("id", DataType::Int64, false));
        assert_eq!(schema.fields[1], Field::new("name", DataType::Utf8, true));
        assert!(Schema::parse("id:decimal").is_err());
        assert!(Schema::parse("").is_err());
    }

    #[test]
    fn check_tuple_rejects_null_in_required_field() {
        let schema = Schema::parse("id:int64,name:utf8?").unwrap();
        assert!(schema.check_tuple(&vec![Scalar::I64(1), Scalar::Null]).is_ok());
        assert!(schema.check_tuple(&vec![Scalar::Null, Scalar::Null]).is_err());
        assert!(schema.check_tuple(&vec![Scalar::I64(1)]).is_err());
    }

    #[test]
    fn type_ids_are_stable() {
        for id in 0..8u8 {
            let ty = DataType::from_type_id(id).unwrap();
            assert_eq!(ty.type_id(), id);
        }
        assert!(DataType::from_type_id(8).is_none());
    }
}
