//! Streaming payload decoder.
//!
//! Reads the payload byte by byte, most significant bit first, growing a
//! code accumulator until it matches an entry of the [`DecodeTable`].
//!
//! Only the very last payload byte may carry padding. The decoder always
//! holds back the most recent byte and only treats it as final once the
//! source reports end of stream (`read` returning `Ok(0)`); the size of
//! the read that delivered it plays no part.

use std::io::{BufWriter, ErrorKind, Read, Write};

use tracing::debug;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::{Error, Result};
use crate::huffman::{Code, DecodeTable};
use crate::symbol::{write_symbol, Granularity};

/// Bit-level decoder for one payload.
pub struct StreamDecoder {
    table: DecodeTable,
    padding: u8,
    granularity: Granularity,
    chunk_size: usize,
    current: Code,
    symbols: u64,
    bytes: u64,
}

impl StreamDecoder {
    /// Create a decoder for a payload whose last byte ends in `padding` zero bits.
    ///
    /// # Errors
    /// Returns `Error::Format` if `padding` is greater than 7.
    pub fn new(table: DecodeTable, padding: u8, granularity: Granularity) -> Result<Self> {
        if padding > 7 {
            return Err(Error::format(format!("padding {padding} out of range 0..=7")));
        }
        Ok(Self {
            table,
            padding,
            granularity,
            chunk_size: DEFAULT_CHUNK_SIZE,
            current: Code::default(),
            symbols: 0,
            bytes: 0,
        })
    }

    /// Set the read size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Payload bytes consumed so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes
    }

    /// Decode the whole payload from `source` into `sink`.
    ///
    /// Returns the number of symbols written.
    ///
    /// # Errors
    /// Returns `Error::Format` if the payload ends inside a code, contains a
    /// bit sequence that matches no code, is non-empty while the table is
    /// empty, or is empty while padding is declared. Returns `Error::Io` if
    /// the source or sink fails.
    pub fn decode<R: Read, W: Write>(&mut self, mut source: R, sink: W) -> Result<u64> {
        let mut sink = BufWriter::new(sink);
        let mut buf = vec![0u8; self.chunk_size];
        let mut held: Option<u8> = None;

        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if let Some(byte) = held {
                self.feed(byte, 8, &mut sink)?;
            }
            for &byte in &buf[..n - 1] {
                self.feed(byte, 8, &mut sink)?;
            }
            held = Some(buf[n - 1]);
        }

        match held {
            Some(byte) => self.feed(byte, 8 - self.padding, &mut sink)?,
            None if self.padding > 0 => {
                return Err(Error::format(format!(
                    "{} padding bits declared for an empty payload",
                    self.padding
                )));
            }
            None => {}
        }

        if !self.current.is_empty() {
            return Err(Error::format(format!(
                "payload ended inside a code (pending bits {})",
                self.current
            )));
        }
        sink.flush()?;
        debug!(
            symbols = self.symbols,
            payload_bytes = self.bytes,
            "payload decoded"
        );
        Ok(self.symbols)
    }

    /// Consume the top `nbits` bits of `byte`.
    fn feed<W: Write>(&mut self, byte: u8, nbits: u8, sink: &mut W) -> Result<()> {
        if self.table.is_empty() {
            return Err(Error::format("payload present but the code table is empty"));
        }
        for i in 0..nbits {
            let bit = (byte >> (7 - i)) & 1 == 1;
            self.current = self
                .current
                .push(bit)
                .filter(|c| c.len() <= self.table.max_code_len())
                .ok_or_else(|| {
                    Error::format(format!(
                        "no code matches the bits ending at payload byte {} bit {i}",
                        self.bytes
                    ))
                })?;
            if let Some(symbol) = self.table.get(self.current) {
                write_symbol(sink, symbol, self.granularity)?;
                self.symbols += 1;
                self.current = Code::default();
            }
        }
        self.bytes += 1;
        Ok(())
    }
}
