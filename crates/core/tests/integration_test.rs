//! Integration tests for the full compress/decompress pipeline.
//!
//! These tests verify end-to-end behavior through the public API: bytes ->
//! container -> bytes, both in memory and through real files, with the
//! code tree checked along the way.

mod common;

use std::fs::File;
use std::io::{BufReader, BufWriter};

use ahf_core::{
    codec::{Decoder, Encoder},
    container,
    error::{BitIoError, Error},
    progress::NoProgress,
    tree::{Symbol, MAX_WEIGHT},
};
use common::{generate_sample_data, generate_skewed_data};

/// Encode `data` symbol by symbol, validating the tree after every update.
fn encode_checked(data: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder::new(Vec::new());
    for &byte in data {
        encoder.push(byte).expect("push failed");
        encoder.tree().validate().expect("sibling property broken");
        assert!(encoder.tree().root_weight() < MAX_WEIGHT);
    }
    let (bytes, _) = encoder.finish().expect("finish failed");
    bytes
}

fn decode_all(bytes: &[u8]) -> Vec<u8> {
    let mut decoder = Decoder::new(bytes);
    let mut out = Vec::new();
    while let Some(byte) = decoder.next_byte().expect("decode failed") {
        out.push(byte);
    }
    out
}

#[test]
fn test_mixed_corpus_round_trip() {
    for seed in [1, 42, 12345] {
        let data = generate_sample_data(seed, 64 * 1024);
        let packed = container::encode_bytes("bin", &data).expect("compression failed");
        let (ext, unpacked) = container::decode_bytes(&packed).expect("decompression failed");

        assert_eq!(ext, "bin");
        assert_eq!(unpacked, data, "output doesn't match input for seed {seed}");
    }
}

#[test]
fn test_sibling_property_through_rebuilds() {
    let data = generate_skewed_data(7, 120_000, 40);
    let bytes = encode_checked(&data);
    assert_eq!(decode_all(&bytes), data);
}

#[test]
fn test_all_symbols() {
    let input_data: Vec<u8> = (0..=255).collect();

    let bytes = encode_checked(&input_data);
    // Every byte is new: each costs at least its 8-bit literal.
    assert!(bytes.len() >= input_data.len());
    assert_eq!(decode_all(&bytes), input_data);
}

#[test]
fn test_all_symbols_then_repeats() {
    let mut input_data: Vec<u8> = (0..=255).rev().collect();
    for _ in 0..50 {
        input_data.extend(0..=255u8);
    }

    let packed = container::encode_bytes("dat", &input_data).unwrap();
    let (_, unpacked) = container::decode_bytes(&packed).unwrap();
    assert_eq!(unpacked, input_data);
}

#[test]
fn test_large_single_symbol() {
    let input_data = vec![b'X'; 256 * 1024];

    let mut encoder = Encoder::new(Vec::new());
    for &byte in &input_data {
        encoder.push(byte).unwrap();
    }
    let stats = encoder.stats();
    let (bytes, summary) = encoder.finish().unwrap();

    assert_eq!(stats.escapes, 1);
    assert!(stats.rebuilds > 0);
    assert_eq!(summary.stats.rebuilds, stats.rebuilds);
    // One bit per symbol once 'X' dominates the tree.
    assert!(bytes.len() < input_data.len() / 7);
    assert_eq!(decode_all(&bytes), input_data);
}

#[test]
fn test_scenario_single_byte() {
    let mut encoder = Encoder::new(Vec::new());
    let escape = encoder.tree().leaf(Symbol::Escape).unwrap();
    let escape_code = encoder.tree().path(escape).unwrap();
    assert_eq!((escape_code.bits, escape_code.len), (0b1, 1));

    encoder.push(0x41).unwrap();
    let (bytes, summary) = encoder.finish().unwrap();

    assert_eq!(bytes, vec![0b1010_0000, 0b1100_0000]);
    assert_eq!(summary.stats.code_bits, 10);

    // A second, independent run reproduces the exact bits.
    let mut again = Vec::new();
    ahf_core::encode(&[0x41u8][..], &mut again, 1, &mut NoProgress).unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn test_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("sample.txt");
    let packed_path = dir.path().join("sample.ahf");
    let restored_path = dir.path().join("restored.txt");

    let data = generate_sample_data(99, 200 * 1024);
    std::fs::write(&source_path, &data).unwrap();

    let source = File::open(&source_path).unwrap();
    let sink = BufWriter::new(File::create(&packed_path).unwrap());
    let summary = container::compress("txt", source, sink, data.len() as u64, &mut NoProgress).unwrap();
    assert_eq!(summary.bytes_read, data.len() as u64);
    assert_eq!(
        summary.bytes_written,
        std::fs::metadata(&packed_path).unwrap().len()
    );

    let archive = container::open(BufReader::new(File::open(&packed_path).unwrap())).unwrap();
    assert_eq!(archive.extension(), "txt");
    let sink = File::create(&restored_path).unwrap();
    archive.decode_into(sink, summary.bytes_written, &mut NoProgress).unwrap();

    assert_eq!(std::fs::read(&restored_path).unwrap(), data);
}

#[test]
fn test_truncation_detected() {
    let data = generate_sample_data(5, 4096);
    let packed = container::encode_bytes("txt", &data).unwrap();

    for cut in [4, packed.len() / 3, packed.len() - 2] {
        let result = container::decode_bytes(&packed[..cut]);
        assert!(
            matches!(result, Err(Error::BitIo(BitIoError::UnexpectedEof { .. }))),
            "cut at {cut} was not reported as truncation"
        );
    }
}

#[test]
fn test_trailing_bytes_ignored() {
    let data = b"self-terminating streams stop at END_OF_STREAM";
    let mut packed = container::encode_bytes("txt", data).unwrap();
    packed.extend_from_slice(&[0xFF; 16]);

    let (_, unpacked) = container::decode_bytes(&packed).unwrap();
    assert_eq!(unpacked, data);
}

#[test]
fn test_compresses_skewed_data() {
    let data = generate_skewed_data(3, 100_000, 8);
    let packed = container::encode_bytes("bin", &data).unwrap();
    // 8 symbols fit in 3 bits; skew should do better still.
    assert!(packed.len() < data.len() / 2);
}
