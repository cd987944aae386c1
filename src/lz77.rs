//! LZ77 token stream: drives the suffix-array match finder and
//! interleaves literal and reference tokens into a `BitCarry`.
//!
//! Bit grammar (MSB-first within each field), after a single leading
//! compression-flag bit:
//!
//! ```text
//! literal_hi0 := "0"    <byte:8>                     # byte top bit = 0
//! literal_hi1 := "1" "1" <byte:8>                    # byte top bit = 1
//! reference   := "1" "0" <m_L:1> <ref_len:4|8> <m_D:1> <offset:10|16>
//! ```
//!
//! A reference's `ref_len` is `length - MIN_LEN`, encoded in 4 bits if it
//! fits (`length < 20`) or 8 bits otherwise. Its `offset` is
//! `distance - MIN_DIST`, encoded in 10 bits if it fits (`distance < 1024`)
//! or 16 bits otherwise.

use std::collections::BTreeMap;
use crate::bit_carry::BitCarry;
use crate::huffman;
use crate::suffix_array::{SuffixArrayMatcher, LOOK_AHEAD, MIN_LEN};
use crate::Error;

/// Smallest representable back-reference distance.
pub const MIN_DIST: usize = 1;
/// Bit width of a small (`< 16`) reference length field.
const REF_SMALL_LEN: u8 = 4;
/// Bit width of a wide reference length field.
const REF_WIDE_LEN: u8 = 8;
/// Bit width of a small (`< 1024`) reference distance field.
const REF_SMALL_DIST: u8 = 10;
/// Bit width of a wide reference distance field.
const REF_WIDE_DIST: u8 = 16;

/// Compress `input` into this crate's self-defined bit format. See the
/// module docs for the bit grammar. Returns an empty buffer unchanged for
/// empty input.
pub fn compress(input: &[u8]) -> Result<Vec<u8>, Error> {
    compress_with_observer(input, None)
}

/// As [`compress`], but invokes `observer` synchronously with a
/// monotonically non-decreasing progress value in `[0, 100]` as tokens are
/// emitted. Pass `None` for no progress reporting.
pub fn compress_with_observer(input: &[u8], mut observer: Option<&mut dyn FnMut(u8)>) -> Result<Vec<u8>, Error> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let n = input.len();
    log::debug!("compressing {} bytes", n);
    let matcher = SuffixArrayMatcher::build(input);

    let mut bc = BitCarry::new();
    bc.push_bits(1, 1); // tentative compression flag
    let mut length_histogram: BTreeMap<u32, u64> = BTreeMap::new();
    let mut pos = 0usize;
    while pos < n {
        let (length, distance) = matcher.longest_match(pos);
        if length >= MIN_LEN {
            log::trace!("reference at {}: length={} distance={}", pos, length, distance);
            emit_reference(&mut bc, length, distance);
            *length_histogram.entry(length as u32).or_insert(0) += 1;
            pos += length;
        } else {
            emit_literal(&mut bc, input[pos]);
            pos += 1;
        }
        if let Some(obs) = observer.as_deref_mut() {
            obs(((pos * 100) / n).min(100) as u8);
        }
    }

    if length_histogram.is_empty() {
        log::debug!("no references emitted, skipping length-alphabet huffman diagnostics");
    } else {
        match huffman::length_alphabet_tree(&length_histogram) {
            Ok(tree) => log::debug!(
                "length-alphabet huffman tree built from {} distinct lengths, root={}",
                tree.frequencies().len(),
                tree.root()
            ),
            Err(e) => log::warn!("failed to build length-alphabet diagnostics tree: {}", e),
        }
    }

    if bc.len() > 8 * n {
        log::debug!("compressed form ({} bits) would inflate {} bytes, falling back to raw storage", bc.len(), n);
        let mut raw = Vec::with_capacity(n + 1);
        raw.push(0u8); // flag=0, padded with zero bits to a full byte
        raw.extend_from_slice(input);
        return Ok(raw);
    }
    Ok(bc.get_bytes(true))
}

/// Decompress a buffer produced by [`compress`]. Returns an empty buffer
/// unchanged for empty input.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, Error> {
    decompress_with_observer(input, None)
}

/// As [`decompress`], but invokes `observer` synchronously with a
/// monotonically non-decreasing progress value in `[0, 100]`, scaled by
/// bits consumed (there is no length header in the canonical layout).
pub fn decompress_with_observer(input: &[u8], mut observer: Option<&mut dyn FnMut(u8)>) -> Result<Vec<u8>, Error> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let total_bits = input.len() * 8;
    let mut bc = BitCarry::from_bytes(input);
    let flag = bc.consume_bits(1)?;
    if flag == 0 {
        log::debug!("raw-storage fallback, returning {} bytes unchanged", input.len() - 1);
        return Ok(input[1..].to_vec());
    }

    let mut output: Vec<u8> = Vec::new();
    loop {
        if bc.available_bits() == 0 {
            break;
        }
        let first = bc.peek_bits(1).expect("checked available_bits above");
        if first == 0 {
            if bc.available_bits() < 9 {
                log::trace!("{} trailing padding bits, stopping", bc.available_bits());
                break;
            }
            bc.consume_bits(1).map_err(|_| Error::CorruptStreamError)?;
            let b = bc.consume_bits(8).map_err(|_| Error::CorruptStreamError)? as u8;
            output.push(b);
        } else {
            bc.consume_bits(1).map_err(|_| Error::CorruptStreamError)?;
            if bc.available_bits() == 0 {
                return Err(Error::CorruptStreamError);
            }
            let second = bc.consume_bits(1).map_err(|_| Error::CorruptStreamError)?;
            if second == 1 {
                let b = bc.consume_bits(8).map_err(|_| Error::CorruptStreamError)? as u8;
                output.push(b);
            } else {
                decode_reference(&mut bc, &mut output)?;
            }
        }
        if let Some(obs) = observer.as_deref_mut() {
            let consumed = total_bits - bc.available_bits();
            obs(((consumed * 100) / total_bits).min(100) as u8);
        }
    }
    log::debug!("decompressed {} bytes", output.len());
    Ok(output)
}

fn emit_literal(bc: &mut BitCarry, b: u8) {
    if b & 0x80 == 0 {
        bc.push_bits(0, 1);
        bc.push_byte(b);
    } else {
        bc.push_bits(0b11, 2);
        bc.push_byte(b);
    }
}

fn emit_reference(bc: &mut BitCarry, length: usize, distance: usize) {
    debug_assert!((MIN_LEN..=MIN_LEN + 255).contains(&length));
    debug_assert!((MIN_DIST..=MIN_DIST + 65535).contains(&distance));
    bc.push_bits(0b10, 2);
    let ref_len = (length - MIN_LEN) as u64;
    if ref_len < 16 {
        bc.push_bits(0, 1);
        bc.push_bits(ref_len, REF_SMALL_LEN);
    } else {
        bc.push_bits(1, 1);
        bc.push_bits(ref_len, REF_WIDE_LEN);
    }
    let offset = (distance - MIN_DIST) as u64;
    if offset < 1024 {
        bc.push_bits(0, 1);
        bc.push_bits(offset, REF_SMALL_DIST);
    } else {
        bc.push_bits(1, 1);
        bc.push_bits(offset, REF_WIDE_DIST);
    }
}

fn decode_reference(bc: &mut BitCarry, output: &mut Vec<u8>) -> Result<(), Error> {
    let m_l = bc.consume_bits(1).map_err(|_| Error::CorruptStreamError)?;
    let ref_len = bc
        .consume_bits(if m_l == 0 { REF_SMALL_LEN } else { REF_WIDE_LEN })
        .map_err(|_| Error::CorruptStreamError)?;
    let length = ref_len as usize + MIN_LEN;
    let m_d = bc.consume_bits(1).map_err(|_| Error::CorruptStreamError)?;
    let offset = bc
        .consume_bits(if m_d == 0 { REF_SMALL_DIST } else { REF_WIDE_DIST })
        .map_err(|_| Error::CorruptStreamError)?;
    let distance = offset as usize + MIN_DIST;
    if distance == 0 || distance > output.len() {
        log::error!("back-reference distance {} exceeds decoded length {}", distance, output.len());
        return Err(Error::CorruptStreamError);
    }
    if length > LOOK_AHEAD {
        return Err(Error::CorruptStreamError);
    }
    for _ in 0..length {
        let idx = output.len() - distance;
        output.push(output[idx]);
    }
    Ok(())
}
