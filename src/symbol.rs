//! Symbols and the chunked reader that produces them.
//!
//! A codec instance commits to one [`Granularity`] and applies it to
//! frequency counting, encoding and decoding alike.

use std::fmt;
use std::io::{ErrorKind, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unit of coding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One raw byte per symbol.
    Byte,
    /// One Unicode scalar value per symbol, read as UTF-8.
    #[default]
    Char,
}

impl Granularity {
    /// Validate a symbol value read from a container header.
    ///
    /// # Errors
    /// Returns `Error::Format` if the value cannot be a symbol at this granularity.
    pub fn symbol_from_wire(self, raw: i32) -> Result<Symbol> {
        let valid = match self {
            Granularity::Byte => (0..=0xFF).contains(&raw),
            Granularity::Char => u32::try_from(raw)
                .ok()
                .and_then(char::from_u32)
                .is_some(),
        };
        if !valid {
            return Err(Error::format(format!(
                "symbol {raw} is not a valid {self} symbol"
            )));
        }
        Ok(Symbol(raw as u32))
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Byte => f.write_str("byte"),
            Granularity::Char => f.write_str("char"),
        }
    }
}

/// A byte value or a Unicode scalar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    /// Raw symbol value.
    pub fn value(self) -> u32 {
        self.0
    }

    /// Header representation (sign-extended `int32`).
    pub fn to_wire(self) -> i32 {
        self.0 as i32
    }
}

impl From<u8> for Symbol {
    fn from(b: u8) -> Self {
        Symbol(b as u32)
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        Symbol(c as u32)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match char::from_u32(self.0) {
            Some(c) if !c.is_control() => write!(f, "{c:?}"),
            _ => write!(f, "{:#x}", self.0),
        }
    }
}

/// Write one symbol to a sink in its granularity's byte form.
///
/// # Errors
/// Returns `Error::Format` if the symbol is out of range for the granularity,
/// or `Error::Io` if the sink fails.
pub fn write_symbol<W: Write>(sink: &mut W, symbol: Symbol, granularity: Granularity) -> Result<()> {
    match granularity {
        Granularity::Byte => {
            let byte = u8::try_from(symbol.0)
                .map_err(|_| Error::format(format!("symbol {symbol} is not a byte")))?;
            sink.write_all(&[byte])?;
        }
        Granularity::Char => {
            let c = char::from_u32(symbol.0)
                .ok_or_else(|| Error::format(format!("symbol {symbol} is not a scalar value")))?;
            let mut buf = [0u8; 4];
            sink.write_all(c.encode_utf8(&mut buf).as_bytes())?;
        }
    }
    Ok(())
}

/// Length of a UTF-8 sequence from its lead byte, or `None` for a byte that
/// cannot start one.
fn utf8_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Pulls fixed-size chunks from a byte source and yields symbols.
///
/// In char mode a sequence split across two reads is carried over and
/// reassembled before it is yielded.
pub struct SymbolReader<R> {
    inner: R,
    granularity: Granularity,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    /// Absolute offset of `buf[start]`.
    offset: u64,
    eof: bool,
}

impl<R: Read> SymbolReader<R> {
    /// Create a reader requesting `chunk_size` bytes per read.
    ///
    /// `chunk_size` is raised to 4 if smaller so any UTF-8 sequence fits.
    pub fn new(inner: R, granularity: Granularity, chunk_size: usize) -> Self {
        Self {
            inner,
            granularity,
            buf: vec![0; chunk_size.max(4)],
            start: 0,
            end: 0,
            offset: 0,
            eof: false,
        }
    }

    /// Bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.offset
    }

    /// Read the next symbol, or `None` at end of stream.
    ///
    /// # Errors
    /// Returns `Error::Io` on a failed read and `Error::InvalidEncoding` on a
    /// malformed UTF-8 sequence in char mode.
    pub fn next_symbol(&mut self) -> Result<Option<Symbol>> {
        if !self.fill_to(1)? {
            return Ok(None);
        }
        let lead = self.buf[self.start];
        let len = match self.granularity {
            Granularity::Byte => 1,
            Granularity::Char => utf8_len(lead).ok_or(Error::InvalidEncoding {
                offset: self.offset,
            })?,
        };
        if len == 1 {
            self.consume(1);
            return Ok(Some(Symbol(lead as u32)));
        }
        if !self.fill_to(len)? {
            return Err(Error::InvalidEncoding {
                offset: self.offset,
            });
        }
        let seq = &self.buf[self.start..self.start + len];
        let c = std::str::from_utf8(seq)
            .ok()
            .and_then(|s| s.chars().next())
            .ok_or(Error::InvalidEncoding {
                offset: self.offset,
            })?;
        self.consume(len);
        Ok(Some(Symbol::from(c)))
    }

    fn consume(&mut self, n: usize) {
        self.start += n;
        self.offset += n as u64;
    }

    /// Make at least `want` unread bytes available. Returns `false` if the
    /// source ended first.
    fn fill_to(&mut self, want: usize) -> Result<bool> {
        while self.end - self.start < want {
            if self.eof {
                return Ok(false);
            }
            if self.start > 0 {
                self.buf.copy_within(self.start..self.end, 0);
                self.end -= self.start;
                self.start = 0;
            }
            match self.inner.read(&mut self.buf[self.end..]) {
                Ok(0) => self.eof = true,
                Ok(n) => self.end += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for SymbolReader<R> {
    type Item = Result<Symbol>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_symbol().transpose()
    }
}
