//! Streaming CSV reader → `ColumnBlock`s.
//!
//! Caveats:
//! - Requires a header row; columns are matched to schema fields by name.
//! - An empty cell is `Null` for nullable fields and an error otherwise
//!   (except for `utf8`, where it is the empty string).
//! - Binary cells are hex.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use csv as csv_crate;
use colstream_core::block::{ColumnBlock, EncodingKind};
use colstream_core::config::StreamConfig;
use colstream_core::schema::{DataType, Field, Schema};
use colstream_core::types::{Scalar, Tuple};

use crate::error::{Error, Result};

pub struct CsvBlockReader<R: Read> {
    rdr: csv_crate::Reader<R>,
    schema: Arc<Schema>,
    /// CSV column index for each schema field.
    columns: Vec<usize>,
    block_rows: usize,
    encoding: EncodingKind,
    record: csv_crate::StringRecord,
    line: u64,
    /// First tuple of the next run (run-length encoding only).
    pending: Option<Tuple>,
}

impl CsvBlockReader<File> {
    pub fn from_path(path: impl AsRef<Path>, schema: Schema, cfg: &StreamConfig) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, schema, cfg)
    }
}

impl<R: Read> CsvBlockReader<R> {
    pub fn from_reader(reader: R, schema: Schema, cfg: &StreamConfig) -> Result<Self> {
        cfg.validate()?;
        let mut rdr = csv_crate::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let columns = schema
            .fields
            .iter()
            .map(|f| {
                headers.iter().position(|h| h.trim() == f.name).ok_or_else(|| {
                    Error::InvalidArgument(format!("CSV has no column for field '{}'", f.name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rdr,
            schema: Arc::new(schema),
            columns,
            block_rows: cfg.block_rows,
            encoding: cfg.encoding,
            record: csv_crate::StringRecord::new(),
            line: 1,
            pending: None,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Next block of up to `block_rows` tuples, or `None` at end of input.
    /// Under run-length encoding a block also ends where the run ends.
    pub fn next_block(&mut self) -> Result<Option<ColumnBlock>> {
        let mut tuples = Vec::new();
        tuples.extend(self.pending.take());
        while tuples.len() < self.block_rows {
            let Some(tuple) = self.next_tuple()? else {
                break;
            };
            if self.encoding == EncodingKind::RunLength
                && tuples.first().is_some_and(|first| *first != tuple)
            {
                self.pending = Some(tuple);
                break;
            }
            tuples.push(tuple);
        }
        if tuples.is_empty() {
            return Ok(None);
        }
        Ok(Some(encode_block(Arc::clone(&self.schema), tuples, self.encoding)?))
    }

    fn next_tuple(&mut self) -> Result<Option<Tuple>> {
        if !self.rdr.read_record(&mut self.record)? {
            return Ok(None);
        }
        self.line += 1;
        self.parse_record().map(Some)
    }

    fn parse_record(&self) -> Result<Tuple> {
        self.schema
            .fields
            .iter()
            .zip(&self.columns)
            .map(|(field, &col)| {
                let cell = self.record.get(col).unwrap_or("");
                parse_cell(field, cell).map_err(|e| e.with_context(format!("line {}", self.line)))
            })
            .collect()
    }
}

impl<R: Read> Iterator for CsvBlockReader<R> {
    type Item = Result<ColumnBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().transpose()
    }
}

/// Build a block in the requested encoding. Run-length requires every
/// tuple to be identical.
pub fn encode_block(
    schema: Arc<Schema>,
    tuples: Vec<Tuple>,
    encoding: EncodingKind,
) -> Result<ColumnBlock> {
    let block = match encoding {
        EncodingKind::Uncompressed => ColumnBlock::uncompressed(schema, tuples)?,
        EncodingKind::RunLength => {
            let count = tuples.len() as u64;
            let mut it = tuples.into_iter();
            let first = it.next().ok_or_else(|| {
                Error::InvalidArgument("run-length block needs at least one tuple".into())
            })?;
            if it.any(|t| t != first) {
                return Err(Error::InvalidArgument(
                    "run-length block requires identical tuples".into(),
                ));
            }
            ColumnBlock::run_length(schema, first, count)?
        }
        EncodingKind::Dictionary => {
            use std::collections::HashMap;
            let mut index: HashMap<Tuple, u32> = HashMap::new();
            let mut dictionary = Vec::new();
            let mut ids = Vec::with_capacity(tuples.len());
            for t in tuples {
                let next_id = dictionary.len() as u32;
                let id = *index.entry(t.clone()).or_insert_with(|| {
                    dictionary.push(t);
                    next_id
                });
                ids.push(id);
            }
            ColumnBlock::dictionary(schema, dictionary, ids)?
        }
    };
    Ok(block)
}

fn parse_cell(field: &Field, cell: &str) -> Result<Scalar> {
    if cell.is_empty() && field.data_type != DataType::Utf8 {
        return if field.nullable {
            Ok(Scalar::Null)
        } else {
            Err(Error::InvalidArgument(format!(
                "empty value for non-nullable field '{}'",
                field.name
            )))
        };
    }
    let bad = || {
        Error::InvalidArgument(format!(
            "cannot parse '{}' as {} for field '{}'",
            cell,
            field.data_type.name(),
            field.name
        ))
    };
    let value = match field.data_type {
        DataType::Boolean => match cell.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Scalar::Bool(true),
            "false" | "f" | "0" => Scalar::Bool(false),
            _ => return Err(bad()),
        },
        DataType::Int32 => Scalar::I32(cell.trim().parse().map_err(|_| bad())?),
        DataType::Int64 | DataType::Date64 => Scalar::I64(cell.trim().parse().map_err(|_| bad())?),
        DataType::Float32 => Scalar::F32(cell.trim().parse().map_err(|_| bad())?),
        DataType::Float64 => Scalar::F64(cell.trim().parse().map_err(|_| bad())?),
        DataType::Utf8 => Scalar::Str(cell.to_string()),
        DataType::Binary => Scalar::Bin(decode_hex(cell.trim()).ok_or_else(bad)?),
    };
    Ok(value)
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| s.get(i..i + 2).and_then(|b| u8::from_str_radix(b, 16).ok()))
        .collect()
}
