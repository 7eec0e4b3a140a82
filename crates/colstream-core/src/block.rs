//! Column blocks: immutable runs of tuples sharing one schema.
//!
//! A block's runtime encoding decides which block codec serializes it. The
//! starting position is assigned by the stream reader and is not part of
//! the wire format.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::Tuple;

/// The encoding families a block can be held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingKind {
    Uncompressed,
    #[serde(rename = "rle")]
    RunLength,
    Dictionary,
}

impl EncodingKind {
    pub fn name(self) -> &'static str {
        match self {
            EncodingKind::Uncompressed => "uncompressed",
            EncodingKind::RunLength => "rle",
            EncodingKind::Dictionary => "dictionary",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uncompressed" | "raw" => Ok(EncodingKind::Uncompressed),
            "rle" | "run_length" | "runlength" => Ok(EncodingKind::RunLength),
            "dictionary" | "dict" => Ok(EncodingKind::Dictionary),
            other => Err(Error::Config(format!("unknown encoding '{other}'"))),
        }
    }
}

impl std::fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory payload of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEncoding {
    Uncompressed { tuples: Vec<Tuple> },
    /// One tuple repeated `count` times.
    RunLength { value: Tuple, count: u64 },
    /// Each id indexes `dictionary`.
    Dictionary { dictionary: Vec<Tuple>, ids: Vec<u32> },
}

impl BlockEncoding {
    pub fn kind(&self) -> EncodingKind {
        match self {
            BlockEncoding::Uncompressed { .. } => EncodingKind::Uncompressed,
            BlockEncoding::RunLength { .. } => EncodingKind::RunLength,
            BlockEncoding::Dictionary { .. } => EncodingKind::Dictionary,
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            BlockEncoding::Uncompressed { tuples } => tuples.len() as u64,
            BlockEncoding::RunLength { count, .. } => *count,
            BlockEncoding::Dictionary { ids, .. } => ids.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBlock {
    schema: Arc<Schema>,
    start_position: u64,
    encoding: BlockEncoding,
}

impl ColumnBlock {
    /// Build a block after checking every tuple (and dictionary id) against
    /// `schema`. A zero-width schema can only carry an empty block.
    pub fn new(schema: impl Into<Arc<Schema>>, encoding: BlockEncoding) -> Result<Self> {
        let schema = schema.into();
        if schema.is_empty() && encoding.count() > 0 {
            return Err(Error::Schema(format!(
                "zero-width schema cannot carry {} tuples",
                encoding.count()
            )));
        }
        match &encoding {
            BlockEncoding::Uncompressed { tuples } => {
                for t in tuples {
                    schema.check_tuple(t)?;
                }
            }
            BlockEncoding::RunLength { value, .. } => schema.check_tuple(value)?,
            BlockEncoding::Dictionary { dictionary, ids } => {
                for t in dictionary {
                    schema.check_tuple(t)?;
                }
                if let Some(bad) = ids.iter().find(|&&id| id as usize >= dictionary.len()) {
                    return Err(Error::Invariant(format!(
                        "dictionary id {} out of range for dictionary of {} entries",
                        bad,
                        dictionary.len()
                    )));
                }
            }
        }
        Ok(Self {
            schema,
            start_position: 0,
            encoding,
        })
    }

    pub fn uncompressed(schema: impl Into<Arc<Schema>>, tuples: Vec<Tuple>) -> Result<Self> {
        Self::new(schema, BlockEncoding::Uncompressed { tuples })
    }

    pub fn run_length(schema: impl Into<Arc<Schema>>, value: Tuple, count: u64) -> Result<Self> {
        Self::new(schema, BlockEncoding::RunLength { value, count })
    }

    pub fn dictionary(
        schema: impl Into<Arc<Schema>>,
        dictionary: Vec<Tuple>,
        ids: Vec<u32>,
    ) -> Result<Self> {
        Self::new(schema, BlockEncoding::Dictionary { dictionary, ids })
    }

    /// Same block, positioned at `start_position` in the global tuple space.
    pub fn with_start_position(mut self, start_position: u64) -> Self {
        self.start_position = start_position;
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_arc(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn start_position(&self) -> u64 {
        self.start_position
    }

    /// Position one past the last tuple of this block, or `None` when it
    /// does not fit in `u64`.
    pub fn end_position(&self) -> Option<u64> {
        self.start_position.checked_add(self.count())
    }

    pub fn count(&self) -> u64 {
        self.encoding.count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn encoding(&self) -> &BlockEncoding {
        &self.encoding
    }

    pub fn kind(&self) -> EncodingKind {
        self.encoding.kind()
    }

    /// Logical tuples of the block, independent of its encoding.
    pub fn tuples(&self) -> Tuples<'_> {
        match &self.encoding {
            BlockEncoding::Uncompressed { tuples } => Tuples::Slice(tuples.iter()),
            BlockEncoding::RunLength { value, count } => Tuples::Repeat {
                value,
                remaining: *count,
            },
            BlockEncoding::Dictionary { dictionary, ids } => Tuples::Dictionary {
                dictionary,
                ids: ids.iter(),
            },
        }
    }

    /// Schema, count and tuple content are equal; encoding and position are
    /// ignored.
    pub fn same_content(&self, other: &ColumnBlock) -> bool {
        self.schema == other.schema
            && self.count() == other.count()
            && self.tuples().eq(other.tuples())
    }
}

/// Iterator over a block's logical tuples.
pub enum Tuples<'a> {
    Slice(std::slice::Iter<'a, Tuple>),
    Repeat { value: &'a Tuple, remaining: u64 },
    Dictionary {
        dictionary: &'a [Tuple],
        ids: std::slice::Iter<'a, u32>,
    },
}

impl<'a> Iterator for Tuples<'a> {
    type Item = &'a Tuple;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Tuples::Slice(it) => it.next(),
            Tuples::Repeat { value, remaining } => {
                if *remaining == 0 {
                    None
                } else {
                    *remaining -= 1;
                    Some(*value)
                }
            }
            Tuples::Dictionary { dictionary, ids } => {
                ids.next().map(|&id| &dictionary[id as usize])
            }
        }
    }
}
