//! Symbol frequency counting.
//!
//! The first of the two compression passes. The table must be complete
//! before any code is assigned, and it is not modified afterwards.

use std::collections::BTreeMap;
use std::io::Read;

use tracing::debug;

use crate::config::CodecConfig;
use crate::error::Result;
use crate::symbol::{Symbol, SymbolReader};

/// Occurrence count per symbol, iterated in ascending symbol order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: BTreeMap<Symbol, u64>,
    total: u64,
}

impl FrequencyTable {
    /// Count every symbol of a byte source.
    ///
    /// Empty input yields an empty table.
    ///
    /// # Errors
    /// Returns `Error::Io` if a read fails and `Error::InvalidEncoding` if
    /// char-mode input is not valid UTF-8.
    pub fn from_reader<R: Read>(reader: R, config: &CodecConfig) -> Result<Self> {
        let mut symbols = SymbolReader::new(reader, config.granularity, config.chunk_size);
        let mut table = Self::default();
        while let Some(symbol) = symbols.next_symbol()? {
            table.add(symbol);
        }
        debug!(
            bytes = symbols.bytes_read(),
            symbols = table.total,
            distinct = table.len(),
            "frequency pass complete"
        );
        Ok(table)
    }

    /// Count an in-memory symbol sequence.
    pub fn from_symbols<I: IntoIterator<Item = Symbol>>(symbols: I) -> Self {
        let mut table = Self::default();
        for symbol in symbols {
            table.add(symbol);
        }
        table
    }

    /// Build a table from precomputed counts. Zero counts are dropped.
    pub fn from_counts(counts: BTreeMap<Symbol, u64>) -> Self {
        let counts: BTreeMap<Symbol, u64> = counts.into_iter().filter(|&(_, c)| c > 0).collect();
        let total = counts.values().sum();
        Self { counts, total }
    }

    fn add(&mut self, symbol: Symbol) {
        *self.counts.entry(symbol).or_insert(0) += 1;
        self.total += 1;
    }

    /// Count for a symbol (0 if never seen).
    pub fn get(&self, symbol: Symbol) -> u64 {
        self.counts.get(&symbol).copied().unwrap_or(0)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True if no symbol was counted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total number of symbols counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// `(symbol, count)` pairs in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts.iter().map(|(&s, &c)| (s, c))
    }
}
