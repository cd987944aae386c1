//! # sacodec
//!
//! A lossless byte-stream compression codec combining a sliding-window
//! LZ77-family dictionary coder with a canonical Huffman coder over an
//! integer alphabet.
//!
//! * `bit_carry` is the bit-granular read/write substrate everything else is built on.
//! * `suffix_array` is the sliding-window match finder.
//! * `huffman` builds canonical prefix codes from a frequency map.
//! * `lz77` drives the match finder and emits/consumes the token stream.
//!
//! The compression/expansion entry points operate directly on in-memory
//! buffers; there is no file I/O or CLI surface in this crate.
//!
//! ## Buffer Example
//!
//! ```rs
//! use sacodec::lz77;
//! let test_data = "This is the chaunt of the priests.  The chaunt of the priests of Mung.".as_bytes();
//! let compressed = lz77::compress(test_data).expect("compression failed");
//! let expanded = lz77::decompress(&compressed).expect("decompression failed");
//! assert_eq!(expanded,test_data);
//! ```

pub mod bit_carry;
pub mod huffman;
pub mod suffix_array;
pub mod lz77;

/// Codec errors
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("read past end of bit stream")]
    UnderflowError,
    #[error("bit width out of range [0,64]")]
    WidthError,
    #[error("malformed token stream")]
    CorruptStreamError,
    #[error("huffman tree built from an empty frequency map")]
    EmptyAlphabetError,
}
