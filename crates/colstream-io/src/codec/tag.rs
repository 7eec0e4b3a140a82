//! One-byte codec tag written at the front of every stream.

use byteorder::{ReadBytesExt, WriteBytesExt};
use colstream_core::block::EncodingKind;

use crate::buf::{ByteSink, ByteSource};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CodecTag {
    Uncompressed = 0,
    RunLength = 1,
    Dictionary = 2,
}

impl CodecTag {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(CodecTag::Uncompressed),
            1 => Ok(CodecTag::RunLength),
            2 => Ok(CodecTag::Dictionary),
            other => Err(Error::UnknownCodecTag(other)),
        }
    }

    pub fn kind(self) -> EncodingKind {
        match self {
            CodecTag::Uncompressed => EncodingKind::Uncompressed,
            CodecTag::RunLength => EncodingKind::RunLength,
            CodecTag::Dictionary => EncodingKind::Dictionary,
        }
    }

    pub fn for_kind(kind: EncodingKind) -> Self {
        match kind {
            EncodingKind::Uncompressed => CodecTag::Uncompressed,
            EncodingKind::RunLength => CodecTag::RunLength,
            EncodingKind::Dictionary => CodecTag::Dictionary,
        }
    }
}

impl std::fmt::Display for CodecTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind().name())
    }
}

pub fn write_codec_tag(sink: &mut dyn ByteSink, tag: CodecTag) -> Result<()> {
    sink.write_u8(tag.as_byte())?;
    Ok(())
}

pub fn read_codec_tag(source: &mut dyn ByteSource) -> Result<CodecTag> {
    let b = source.read_u8().map_err(|e| Error::header(e, "codec tag"))?;
    CodecTag::from_byte(b)
}
