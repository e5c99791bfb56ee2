//! Huffman tree construction and code tables.
//!
//! Builds the optimal prefix tree for a [`FrequencyTable`] and derives the
//! symbol to code mapping from it.
//!
//! # Determinism
//!
//! Every node carries an id assigned at creation: leaves get `0..n` in
//! ascending symbol order, and each merge gets the next id. The priority
//! queue orders by `(weight, id)`, so equal weights are resolved by creation
//! order and a given table always yields the same tree and the same
//! container bytes.
//!
//! # Historical Context
//!
//! David Huffman (1952) developed this algorithm as a term paper at MIT.
//! It was the first practical algorithm for constructing optimal prefix codes.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::symbol::Symbol;

/// A prefix code of 1 to 32 bits.
///
/// Bits are right-aligned in `bits`; the most significant of the `len` low
/// bits is sent first. The zero-length value is only used as an empty
/// accumulator while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Code {
    bits: u32,
    len: u8,
}

impl Code {
    /// Longest code the container can store.
    pub const MAX_LEN: u8 = 32;

    /// Create a code from its low `len` bits.
    ///
    /// Returns `None` if `len` is 0 or above 32, or `bits` does not fit in `len` bits.
    pub fn new(bits: u32, len: u8) -> Option<Self> {
        if len == 0 || len > Self::MAX_LEN {
            return None;
        }
        if len < 32 && bits >> len != 0 {
            return None;
        }
        Some(Self { bits, len })
    }

    /// The code bits, right-aligned.
    pub fn bits(self) -> u32 {
        self.bits
    }

    /// Number of bits.
    pub fn len(self) -> u8 {
        self.len
    }

    /// True for the empty accumulator.
    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Append one bit. Returns `None` once the code is 32 bits long.
    pub fn push(self, bit: bool) -> Option<Self> {
        if self.len >= Self::MAX_LEN {
            return None;
        }
        Some(Self {
            bits: (self.bits << 1) | bit as u32,
            len: self.len + 1,
        })
    }

    /// Bit `i`, counted from the first bit sent.
    pub fn bit(self, i: u8) -> bool {
        debug_assert!(i < self.len);
        (self.bits >> (self.len - 1 - i)) & 1 == 1
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(self, other: Code) -> bool {
        self.len <= other.len
            && other.bits.checked_shr((other.len - self.len) as u32).unwrap_or(0) == self.bits
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Code {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut code = Code::default();
        for c in s.chars() {
            let bit = match c {
                '0' => false,
                '1' => true,
                _ => return Err(Error::format(format!("'{c}' is not a bit"))),
            };
            code = code
                .push(bit)
                .ok_or_else(|| Error::format("code longer than 32 bits"))?;
        }
        if code.is_empty() {
            return Err(Error::format("empty code"));
        }
        Ok(code)
    }
}

/// Huffman tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Leaf {
        symbol: Symbol,
        weight: u64,
        id: u32,
    },
    Internal {
        left: Box<Node>,
        right: Box<Node>,
        weight: u64,
        id: u32,
    },
}

impl Node {
    fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } => *weight,
            Node::Internal { weight, .. } => *weight,
        }
    }

    fn id(&self) -> u32 {
        match self {
            Node::Leaf { id, .. } => *id,
            Node::Internal { id, .. } => *id,
        }
    }

    fn first_symbol(&self) -> Symbol {
        match self {
            Node::Leaf { symbol, .. } => *symbol,
            Node::Internal { left, .. } => left.first_symbol(),
        }
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-priority queue: lowest weight, then lowest id, pops first.
        (other.weight(), other.id()).cmp(&(self.weight(), self.id()))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An immutable Huffman tree.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    root: Node,
    leaves: usize,
}

impl HuffmanTree {
    /// Build the tree for a frequency table.
    ///
    /// Returns `None` for an empty table. A single-symbol table yields a
    /// lone leaf.
    pub fn build(freq: &FrequencyTable) -> Option<Self> {
        let mut pq = BinaryHeap::with_capacity(freq.len());
        let mut next_id = 0u32;
        for (symbol, weight) in freq.iter() {
            pq.push(Node::Leaf {
                symbol,
                weight,
                id: next_id,
            });
            next_id += 1;
        }
        let leaves = pq.len();

        while pq.len() > 1 {
            let (Some(left), Some(right)) = (pq.pop(), pq.pop()) else {
                break;
            };
            let weight = left.weight() + right.weight();
            pq.push(Node::Internal {
                left: Box::new(left),
                right: Box::new(right),
                weight,
                id: next_id,
            });
            next_id += 1;
        }

        let root = pq.pop()?;
        debug!(leaves, weight = root.weight(), "huffman tree built");
        Some(Self { root, leaves })
    }

    /// Number of distinct symbols in the tree.
    pub fn leaf_count(&self) -> usize {
        self.leaves
    }

    /// Total weight (the number of symbols the tree was built from).
    pub fn weight(&self) -> u64 {
        self.root.weight()
    }

    /// Derive the code table: left edges are `0`, right edges `1`.
    ///
    /// A tree that is a single leaf gets the code `0`.
    ///
    /// # Errors
    /// Returns `Error::CodeTooLong` if a leaf is deeper than 32.
    pub fn code_table(&self) -> Result<CodeTable> {
        let mut codes = BTreeMap::new();
        match &self.root {
            Node::Leaf { symbol, .. } => {
                codes.insert(*symbol, Code { bits: 0, len: 1 });
            }
            root => Self::build_codes(root, Code::default(), &mut codes)?,
        }
        Ok(CodeTable { codes })
    }

    fn build_codes(node: &Node, prefix: Code, codes: &mut BTreeMap<Symbol, Code>) -> Result<()> {
        match node {
            Node::Leaf { symbol, .. } => {
                codes.insert(*symbol, prefix);
            }
            Node::Internal { left, right, .. } => {
                let too_long = || Error::CodeTooLong {
                    symbol: node.first_symbol().value(),
                    max: Code::MAX_LEN,
                };
                Self::build_codes(left, prefix.push(false).ok_or_else(too_long)?, codes)?;
                Self::build_codes(right, prefix.push(true).ok_or_else(too_long)?, codes)?;
            }
        }
        Ok(())
    }
}

/// Derive the code table for a frequency table.
///
/// An empty table yields an empty code table.
///
/// # Errors
/// Returns `Error::CodeTooLong` if a code would exceed 32 bits.
pub fn code_table(freq: &FrequencyTable) -> Result<CodeTable> {
    match HuffmanTree::build(freq) {
        Some(tree) => tree.code_table(),
        None => Ok(CodeTable::default()),
    }
}

/// Symbol to code mapping, iterated in ascending symbol order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<Symbol, Code>,
}

impl CodeTable {
    /// Code for a symbol.
    pub fn get(&self, symbol: Symbol) -> Option<Code> {
        self.codes.get(&symbol).copied()
    }

    /// Number of codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// True if there are no codes.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// `(symbol, code)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, Code)> + '_ {
        self.codes.iter().map(|(&s, &c)| (s, c))
    }

    /// The inverse mapping.
    pub fn decode_table(&self) -> DecodeTable {
        let mut table = DecodeTable::default();
        for (symbol, code) in self.iter() {
            table.insert(code, symbol);
        }
        table
    }

    /// Payload length in bits for the symbols counted in `freq`.
    pub fn encoded_bit_len(&self, freq: &FrequencyTable) -> u64 {
        freq.iter()
            .filter_map(|(symbol, count)| self.get(symbol).map(|c| count * c.len() as u64))
            .sum()
    }
}

/// Code to symbol mapping used while decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeTable {
    symbols: HashMap<Code, Symbol>,
    max_len: u8,
}

impl DecodeTable {
    /// Symbol for an exact code match.
    pub fn get(&self, code: Code) -> Option<Symbol> {
        self.symbols.get(&code).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Length of the longest code, 0 if empty.
    pub fn max_code_len(&self) -> u8 {
        self.max_len
    }

    /// Insert an entry. Returns the symbol previously bound to `code`.
    pub(crate) fn insert(&mut self, code: Code, symbol: Symbol) -> Option<Symbol> {
        self.max_len = self.max_len.max(code.len());
        self.symbols.insert(code, symbol)
    }
}
