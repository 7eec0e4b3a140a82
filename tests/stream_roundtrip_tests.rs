//! Block stream write/read tests


use std::io::Write;
use std::sync::Arc;

use colstream_core::block::{ColumnBlock, EncodingKind};
use colstream_core::schema::{DataType, Field, Schema};
use colstream_core::types::Scalar;
use colstream_io::codec::schema::write_schema;
use colstream_io::{
    create_blocks_writer, read_blocks, read_blocks_from, read_blocks_from_start, write_blocks,
    BlocksWriter, ByteSink, CodecTag, Error, PositionedReader, PositionedWriter,
};
use test_data_gen::{create_temp_dir, encode, generate_blocks, wide_schema};

fn read_all(bytes: Vec<u8>, start: u64) -> Vec<ColumnBlock> {
    read_blocks(PositionedReader::from_bytes(bytes), start)
        .expect("read header")
        .collect::<Result<Vec<_>, _>>()
        .expect("read blocks")
}

#[test]
fn test_roundtrip_preserves_blocks_in_order() {
    let schema = wide_schema();
    let blocks = generate_blocks(&[3, 5, 2], &schema);

    let decoded = read_all(encode(&blocks), 0);

    assert_eq!(decoded.len(), 3);
    for (original, read) in blocks.iter().zip(&decoded) {
        assert_eq!(read.schema(), original.schema());
        assert_eq!(read.count(), original.count());
        assert!(read.same_content(original));
    }
}

#[test]
fn test_offsets_partition_tuple_space() {
    let schema = wide_schema();
    let blocks = generate_blocks(&[3, 5, 2], &schema);

    let decoded = read_all(encode(&blocks), 0);
    let offsets: Vec<u64> = decoded.iter().map(|b| b.start_position()).collect();
    let counts: Vec<u64> = decoded.iter().map(|b| b.count()).collect();
    assert_eq!(offsets, vec![0, 3, 8]);
    assert_eq!(counts, vec![3, 5, 2]);
}

#[test]
fn test_offsets_start_at_requested_position() {
    let schema = wide_schema();
    let blocks = generate_blocks(&[4, 0, 6, 1], &schema);

    let decoded = read_all(encode(&blocks), 1_000);
    assert_eq!(decoded[0].start_position(), 1_000);
    for pair in decoded.windows(2) {
        assert_eq!(pair[1].start_position(), pair[0].start_position() + pair[0].count());
    }
    assert_eq!(decoded.last().unwrap().end_position(), Some(1_011));
}

#[test]
fn test_roundtrip_run_length_stream() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("sensor", DataType::Utf8, false),
        Field::new("reading", DataType::Float64, true),
    ]));
    let blocks = vec![
        ColumnBlock::run_length(
            Arc::clone(&schema),
            vec![Scalar::Str("a".into()), Scalar::F64(1.5)],
            10,
        )
        .unwrap(),
        ColumnBlock::run_length(Arc::clone(&schema), vec![Scalar::Str("b".into()), Scalar::Null], 3)
            .unwrap(),
    ];

    let bytes = encode(&blocks);
    assert_eq!(bytes[0], CodecTag::RunLength.as_byte());

    let decoded = read_all(bytes, 0);
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].kind(), EncodingKind::RunLength);
    assert_eq!(decoded[0].encoding(), blocks[0].encoding());
    assert_eq!(decoded[1].encoding(), blocks[1].encoding());
    assert_eq!(decoded[1].start_position(), 10);
}

#[test]
fn test_roundtrip_dictionary_stream() {
    let schema = Arc::new(Schema::new(vec![Field::new("city", DataType::Utf8, true)]));
    let dict = vec![
        vec![Scalar::Str("oslo".into())],
        vec![Scalar::Null],
        vec![Scalar::Str("lima".into())],
    ];
    let blocks = vec![
        ColumnBlock::dictionary(Arc::clone(&schema), dict.clone(), vec![0, 2, 2, 1]).unwrap(),
        ColumnBlock::dictionary(Arc::clone(&schema), dict, vec![1]).unwrap(),
    ];

    let decoded = read_all(encode(&blocks), 0);
    assert_eq!(decoded[0].encoding(), blocks[0].encoding());
    assert_eq!(decoded[1].encoding(), blocks[1].encoding());
    assert_eq!(decoded[1].start_position(), 4);
}

#[test]
fn test_header_written_once_before_first_body() {
    let schema = wide_schema();
    let blocks = generate_blocks(&[2, 2, 2], &schema);
    let bytes = encode(&blocks);

    let mut header = PositionedWriter::in_memory();
    header.write_all(&[CodecTag::Uncompressed.as_byte()]).unwrap();
    write_schema(&mut header, &schema).unwrap();
    let header = header.into_inner();

    assert!(bytes.starts_with(&header));

    // The rest is exactly the bodies the codec writes, with no second header.
    let bodies: usize = blocks
        .iter()
        .map(|b| encode(std::slice::from_ref(b)).len() - header.len())
        .sum();
    assert_eq!(bytes.len(), header.len() + bodies);
    let occurrences = bytes
        .windows(header.len())
        .filter(|w| *w == header.as_slice())
        .count();
    assert_eq!(occurrences, 1);
}

#[test]
fn test_append_is_chainable() {
    let schema = wide_schema();
    let blocks = generate_blocks(&[1, 2], &schema);

    let mut writer = create_blocks_writer(PositionedWriter::in_memory());
    assert!(!writer.is_bound());
    writer.append(&blocks[0]).unwrap().append(&blocks[1]).unwrap();
    assert_eq!(writer.codec_tag(), Some(CodecTag::Uncompressed));
    assert_eq!(writer.schema(), Some(&*schema));
    let bytes = writer.finish().unwrap().into_inner();

    assert_eq!(read_all(bytes, 0).len(), 2);
}

#[test]
fn test_finish_without_append_is_usage_error() {
    let writer = create_blocks_writer(PositionedWriter::in_memory());
    assert!(matches!(writer.finish(), Err(Error::Unbound)));

    let empty: Vec<ColumnBlock> = Vec::new();
    let err = write_blocks(PositionedWriter::in_memory(), &empty).unwrap_err();
    assert!(matches!(err, Error::Unbound));
}

#[test]
fn test_header_only_stream_reads_empty() {
    let schema = wide_schema();
    let writer =
        BlocksWriter::bound(PositionedWriter::in_memory(), CodecTag::Dictionary, Arc::clone(&schema))
            .unwrap();
    let bytes = writer.finish().unwrap().into_inner();
    assert!(!bytes.is_empty());

    let mut reader = read_blocks(PositionedReader::from_bytes(bytes), 7).unwrap();
    assert_eq!(reader.codec_tag(), CodecTag::Dictionary);
    assert_eq!(reader.schema(), &*schema);
    assert!(reader.next().is_none());
    assert_eq!(reader.position_offset(), 7);
}

#[test]
fn test_exhaustion_is_idempotent() {
    let schema = wide_schema();
    let bytes = encode(&generate_blocks(&[2], &schema));

    let mut reader = read_blocks(PositionedReader::from_bytes(bytes), 0).unwrap();
    assert!(reader.next().unwrap().is_ok());
    assert!(reader.next().is_none());
    assert!(reader.is_exhausted());
    for _ in 0..3 {
        assert!(reader.next().is_none());
    }
}

#[test]
fn test_header_read_eagerly_bodies_lazily() {
    let schema = wide_schema();
    let bytes = encode(&generate_blocks(&[5, 5], &schema));
    let total = bytes.len() as u64;

    let reader = read_blocks(PositionedReader::from_bytes(bytes), 0).unwrap();
    let mut source = reader.into_inner();
    let header_end = colstream_io::ByteSource::position(&source);
    assert!(header_end > 0 && header_end < total);
    assert!(colstream_io::ByteSource::is_readable(&mut source).unwrap());
}

#[test]
fn test_supplier_view_is_restartable() {
    let schema = wide_schema();
    let bytes = encode(&generate_blocks(&[3, 5, 2], &schema));

    let view = read_blocks_from(|| Ok(PositionedReader::from_bytes(bytes.clone())), 10);
    let first: Vec<_> = view.iter().map(|b| b.unwrap()).collect();
    let second: Vec<_> = (&view).into_iter().map(|b| b.unwrap()).collect();

    assert_eq!(first, second);
    let offsets: Vec<u64> = first.iter().map(|b| b.start_position()).collect();
    assert_eq!(offsets, vec![10, 13, 18]);
}

#[test]
fn test_supplier_view_over_file() {
    let dir = create_temp_dir("file-roundtrip");
    let path = dir.join("blocks.cols");
    let schema = wide_schema();
    let blocks = generate_blocks(&[64, 128, 7], &schema);

    let sink = PositionedWriter::create_file(&path, 4096).unwrap();
    let sink = write_blocks(sink, &blocks).unwrap();
    assert!(sink.position() > 0);
    drop(sink);

    let view = read_blocks_from_start(|| PositionedReader::open_file(&path, 512));
    for _ in 0..2 {
        let decoded: Vec<_> = view.iter().collect::<Result<_, _>>().unwrap();
        assert_eq!(decoded.len(), 3);
        assert!(decoded.iter().zip(&blocks).all(|(a, b)| a.same_content(b)));
        assert_eq!(decoded[2].start_position(), 192);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_supplier_open_error_surfaces_on_first_pull() {
    let dir = create_temp_dir("missing");
    let path = dir.join("does-not-exist.cols");

    // Building the view does no I/O.
    let view = read_blocks_from_start(|| PositionedReader::open_file(&path, 512));

    let mut iter = view.iter();
    match iter.next() {
        Some(Err(Error::Io(e))) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected io error, got {:?}", other.map(|r| r.map(|b| b.count()))),
    }
    assert!(iter.next().is_none());

    let _ = std::fs::remove_dir_all(&dir);
}
