//! Maps a block's runtime encoding, or a decoded codec tag, to its codec.

use colstream_core::block::{ColumnBlock, EncodingKind};

use crate::codec::dictionary::DictionaryCodec;
use crate::codec::rle::RunLengthCodec;
use crate::codec::uncompressed::UncompressedCodec;
use crate::codec::{BlockCodec, CodecTag};

static UNCOMPRESSED: UncompressedCodec = UncompressedCodec;
static RUN_LENGTH: RunLengthCodec = RunLengthCodec;
static DICTIONARY: DictionaryCodec = DictionaryCodec;

pub fn codec_for_tag(tag: CodecTag) -> &'static dyn BlockCodec {
    match tag {
        CodecTag::Uncompressed => &UNCOMPRESSED,
        CodecTag::RunLength => &RUN_LENGTH,
        CodecTag::Dictionary => &DICTIONARY,
    }
}

pub fn codec_for_kind(kind: EncodingKind) -> &'static dyn BlockCodec {
    codec_for_tag(CodecTag::for_kind(kind))
}

pub fn codec_for_block(block: &ColumnBlock) -> &'static dyn BlockCodec {
    codec_for_kind(block.kind())
}
