//! Stream configuration shared by the io adapters and the CLI.

use serde::{Deserialize, Serialize};

use crate::block::EncodingKind;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Tuples per block when chunking row input into blocks.
    pub block_rows: usize,
    /// Encoding chosen for blocks built from row input.
    pub encoding: EncodingKind,
    /// Buffer capacity for file-backed byte sources and sinks.
    pub read_buffer_bytes: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            block_rows: 1024,
            encoding: EncodingKind::Uncompressed,
            read_buffer_bytes: 64 * 1024,
        }
    }
}

impl StreamConfig {
    /// Defaults overridden by `COLSTREAM_BLOCK_ROWS`, `COLSTREAM_ENCODING`
    /// and `COLSTREAM_READ_BUFFER_BYTES`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(n) = env_usize("COLSTREAM_BLOCK_ROWS") {
            cfg.block_rows = n;
        }
        if let Ok(s) = std::env::var("COLSTREAM_ENCODING") {
            if let Ok(kind) = EncodingKind::parse(&s) {
                cfg.encoding = kind;
            }
        }
        if let Some(n) = env_usize("COLSTREAM_READ_BUFFER_BYTES") {
            cfg.read_buffer_bytes = n;
        }
        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_rows == 0 {
            return Err(Error::Config("block_rows must be greater than zero".into()));
        }
        if self.read_buffer_bytes == 0 {
            return Err(Error::Config(
                "read_buffer_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
