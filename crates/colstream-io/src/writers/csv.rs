//! Streaming CSV writer from `ColumnBlock`s.
//!
//! Writes the schema's field names as the header on the first block; values
//! via `Display` (nulls empty, binary as hex).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv as csv_crate;
use colstream_core::block::ColumnBlock;

use crate::error::Result;

pub struct CsvBlockWriter<W: Write> {
    wtr: csv_crate::Writer<W>,
    wrote_header: bool,
    rows: u64,
}

impl CsvBlockWriter<File> {
    pub fn to_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::to_writer(file))
    }
}

impl<W: Write> CsvBlockWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            wtr: csv_crate::Writer::from_writer(writer),
            wrote_header: false,
            rows: 0,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }

    pub fn write_block(&mut self, block: &ColumnBlock) -> Result<()> {
        if !self.wrote_header {
            let headers: Vec<&str> = block.schema().fields.iter().map(|f| f.name.as_str()).collect();
            self.wtr.write_record(headers)?;
            self.wrote_header = true;
        }
        for tuple in block.tuples() {
            self.wtr.write_record(tuple.iter().map(|v| v.to_string()))?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.wtr.flush()?;
        self.wtr
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}
