//! # Static Huffman stream compression
//!
//! *Lossless compression of byte and UTF-8 text streams with a self-describing container.*
//!
//! ## Intuition First
//!
//! Some symbols show up far more often than others. If the common ones get
//! short bit patterns and the rare ones get long ones, the total shrinks.
//! The only catch is that the decoder must always know where one pattern
//! ends and the next begins. A *prefix-free* code guarantees that: no
//! pattern is the start of another, so reading bits left to right and
//! stopping at the first match is never ambiguous.
//!
//! ## The Problem
//!
//! Given symbol counts, which prefix-free code minimizes the total encoded
//! length? Huffman's answer is greedy: repeatedly join the two lightest
//! subtrees. The resulting tree is optimal among all codes that spend a
//! whole number of bits per symbol.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon     Entropy as the fundamental limit
//! 1949  Fano        Shannon-Fano coding: top-down, not always optimal
//! 1952  Huffman     Bottom-up merging, provably optimal prefix codes
//! 1976  Rissanen    Arithmetic coding: fractional bits per symbol
//! 1993  Katz        DEFLATE (PKZIP 2) pairs LZ77 with Huffman coding
//! ```
//!
//! ## Mathematical Formulation
//!
//! For symbols $s$ with counts $f_s$ and code lengths $\ell_s$, Huffman
//! minimizes the payload length
//!
//! ```text
//! L = Σ f_s · ℓ_s
//! ```
//!
//! subject to the Kraft inequality $\sum_s 2^{-\ell_s} \le 1$.
//!
//! ## Complexity Analysis
//!
//! - **Time**: $O(n)$ to count, $O(k \log k)$ to build the tree for $k$
//!   distinct symbols, $O(n)$ to encode and decode.
//! - **Space**: $O(k)$ for the tree and tables; payloads stream in fixed chunks.
//!
//! ## Failure Modes
//!
//! 1. **Two passes**: the source is read twice. If it changes in between,
//!    compression fails rather than emit an undecodable container.
//! 2. **Code length**: the container stores codes in 32 bits. Extremely
//!    skewed (Fibonacci-like) counts over many symbols can exceed that.
//! 3. **Granularity**: the container does not record whether symbols are
//!    bytes or chars. Both sides must be configured alike.
//!
//! ## Implementation Notes
//!
//! This crate provides:
//! - [`FrequencyTable`] and [`HuffmanTree`]: deterministic tree construction
//!   with ties broken by node creation order.
//! - [`BitPacker`] and [`StreamDecoder`]: MSB-first packing and bit-by-bit
//!   decoding that finds the padded byte by end of stream, not read size.
//! - [`container`]: the framing `[u32 header_len][header][u8 padding][payload]`.
//! - [`HuffmanCodec`]: the two-pass compressor and the decompressor.
//!
//! ```rust
//! use huffstream::{CodecConfig, HuffmanCodec};
//!
//! let codec = HuffmanCodec::new(CodecConfig::chars())?;
//! let packed = codec.compress_bytes("abacabadabacaba".as_bytes())?;
//! assert_eq!(codec.decompress_bytes(&packed)?, b"abacabadabacaba");
//! # Ok::<(), huffstream::Error>(())
//! ```
//!
//! ## References
//!
//! - Huffman, D. A. (1952). "A Method for the Construction of Minimum-Redundancy Codes."
//! - Cover, T. M., & Thomas, J. A. (2006). *Elements of Information Theory*, ch. 5.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitpack;
pub mod codec;
pub mod config;
pub mod container;
pub mod decoder;
pub mod error;
pub mod frequency;
pub mod huffman;
pub mod symbol;

pub use bitpack::BitPacker;
pub use codec::{CompressStats, DecompressStats, HuffmanCodec};
pub use config::CodecConfig;
pub use decoder::StreamDecoder;
pub use error::{Error, Result};
pub use frequency::FrequencyTable;
pub use huffman::{code_table, Code, CodeTable, DecodeTable, HuffmanTree};
pub use symbol::{Granularity, Symbol};
