//! Container framing.
//!
//! ```text
//! u32  header_len            big-endian
//! [header_len bytes]         code table
//! u8   padding_bits          0..=7
//! [..]                       payload, MSB-first
//! ```
//!
//! The code table is `u32 entry_count` followed by `entry_count` entries of
//! `i32 symbol, u8 code_len, u32 code_bits`, all big-endian. `code_bits`
//! holds the code in its low `code_len` bits, first bit most significant.
//!
//! The padding count sits in front of the payload. [`ContainerWriter::begin`]
//! takes it up front (it is known from the frequency table before encoding
//! starts), so the sink never needs to seek. [`ContainerWriter::begin_seekable`]
//! instead writes a placeholder and patches it once the payload is done.

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::huffman::{Code, CodeTable, DecodeTable};
use crate::symbol::Granularity;

/// Size of one serialized code table entry.
const ENTRY_LEN: usize = 4 + 1 + 4;

/// Serialize a code table.
pub fn write_header(table: &CodeTable) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 + table.len() * ENTRY_LEN);
    bytes.extend_from_slice(&(table.len() as u32).to_be_bytes());
    for (symbol, code) in table.iter() {
        bytes.extend_from_slice(&symbol.to_wire().to_be_bytes());
        bytes.push(code.len());
        bytes.extend_from_slice(&code.bits().to_be_bytes());
    }
    bytes
}

/// Parse a serialized code table into its inverse.
///
/// # Errors
/// Returns `Error::Format` if the header is truncated or has trailing bytes,
/// a code length is 0 or above 32, code bits overflow their length, a symbol
/// is invalid for `granularity`, or two symbols share a code.
pub fn parse_header(bytes: &[u8], granularity: Granularity) -> Result<DecodeTable> {
    let mut rest = bytes;
    let count = u32::from_be_bytes(take(&mut rest, "entry count")?);
    let mut table = DecodeTable::default();

    for i in 0..count {
        let what = || format!("entry {i} of {count}");
        let raw = i32::from_be_bytes(take(&mut rest, &what())?);
        let [len] = take::<1>(&mut rest, &what())?;
        let bits = u32::from_be_bytes(take(&mut rest, &what())?);

        if len == 0 || len > Code::MAX_LEN {
            return Err(Error::format(format!(
                "{}: code length {len} outside 1..=32",
                what()
            )));
        }
        let code = Code::new(bits, len).ok_or_else(|| {
            Error::format(format!("{}: code bits {bits:#x} exceed {len} bits", what()))
        })?;
        let symbol = granularity.symbol_from_wire(raw)?;
        if let Some(prev) = table.insert(code, symbol) {
            return Err(Error::format(format!(
                "code {code} assigned to both {prev} and {symbol}"
            )));
        }
    }

    if !rest.is_empty() {
        return Err(Error::format(format!(
            "header has {} bytes after its {count} entries",
            rest.len()
        )));
    }
    debug!(entries = count, bytes = bytes.len(), "header parsed");
    Ok(table)
}

fn take<const N: usize>(rest: &mut &[u8], what: &str) -> Result<[u8; N]> {
    if rest.len() < N {
        return Err(Error::format(format!("header ends inside {what}")));
    }
    let (head, tail) = rest.split_at(N);
    *rest = tail;
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok(out)
}

/// Writes a container to a byte sink.
pub struct ContainerWriter<W> {
    sink: W,
    padding: u8,
    /// Absolute sink position of the padding byte, for seek patching.
    padding_pos: Option<u64>,
    written: u64,
}

impl<W: Write> ContainerWriter<W> {
    /// Write the header with a known padding count.
    ///
    /// # Errors
    /// Returns `Error::Io` if the sink fails.
    pub fn begin(sink: W, table: &CodeTable, padding: u8) -> Result<Self> {
        let mut writer = Self {
            sink,
            padding,
            padding_pos: None,
            written: 0,
        };
        writer.write_preamble(table)?;
        Ok(writer)
    }

    fn write_preamble(&mut self, table: &CodeTable) -> Result<()> {
        let header = write_header(table);
        let header_len = u32::try_from(header.len())
            .map_err(|_| Error::format("code table does not fit in a u32 length"))?;
        self.sink.write_all(&header_len.to_be_bytes())?;
        self.sink.write_all(&header)?;
        self.sink.write_all(&[self.padding])?;
        self.written += 4 + header.len() as u64 + 1;
        debug!(
            entries = table.len(),
            header_len,
            padding = self.padding,
            "header written"
        );
        Ok(())
    }

    /// Append payload bytes.
    ///
    /// # Errors
    /// Returns `Error::Io` if the sink fails.
    pub fn write_payload(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.sink.write_all(bytes)?;
        self.written += bytes.len() as u64;
        trace!(len = bytes.len(), "payload chunk written");
        Ok(())
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Finish a container begun with [`ContainerWriter::begin`].
    ///
    /// `padding` is the packer's actual padding; it must match the value
    /// declared up front.
    ///
    /// # Errors
    /// Returns `Error::Format` on a mismatch (the input changed between the
    /// two passes) and `Error::Io` if the flush fails.
    pub fn finish(mut self, padding: u8) -> Result<W> {
        if padding != self.padding {
            return Err(Error::format(format!(
                "declared {} padding bits but payload needed {padding}; input changed between passes",
                self.padding
            )));
        }
        self.sink.flush()?;
        Ok(self.sink)
    }
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Write the header with a placeholder padding count, to be patched by
    /// [`ContainerWriter::finish_patched`].
    ///
    /// # Errors
    /// Returns `Error::Io` if the sink fails or cannot report its position.
    pub fn begin_seekable(mut sink: W, table: &CodeTable) -> Result<Self> {
        let start = sink.stream_position()?;
        let header_len = 4 + (4 + table.len() * ENTRY_LEN) as u64;
        let mut writer = Self {
            sink,
            padding: 0,
            padding_pos: Some(start + header_len),
            written: 0,
        };
        writer.write_preamble(table)?;
        Ok(writer)
    }

    /// Patch the padding byte in place and finish.
    ///
    /// # Errors
    /// Returns `Error::Io` if seeking or writing fails.
    pub fn finish_patched(mut self, padding: u8) -> Result<W> {
        let Some(pos) = self.padding_pos else {
            return self.finish(padding);
        };
        let end = self.sink.stream_position()?;
        self.sink.seek(SeekFrom::Start(pos))?;
        self.sink.write_all(&[padding])?;
        self.sink.seek(SeekFrom::Start(end))?;
        self.sink.flush()?;
        debug!(pos, padding, "padding patched");
        Ok(self.sink)
    }
}

/// Everything in front of the payload.
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    /// The inverse code table.
    pub decode_table: DecodeTable,
    /// Zero bits at the low end of the final payload byte.
    pub padding: u8,
    /// Serialized code table length.
    pub header_len: u32,
}

impl ContainerHeader {
    /// Read the framing up to the first payload byte.
    ///
    /// # Errors
    /// Returns `Error::Format` if the stream ends early, the header length
    /// exceeds `max_header_len`, the code table is malformed, or the padding
    /// count is above 7. Returns `Error::Io` if the source fails.
    pub fn read<R: Read>(
        source: &mut R,
        granularity: Granularity,
        max_header_len: u32,
    ) -> Result<Self> {
        let mut len_bytes = [0u8; 4];
        read_field(source, &mut len_bytes, "header length")?;
        let header_len = u32::from_be_bytes(len_bytes);
        if header_len > max_header_len {
            return Err(Error::format(format!(
                "header length {header_len} exceeds limit {max_header_len}"
            )));
        }

        // Grow with the bytes actually delivered, not the declared length.
        let mut header = Vec::new();
        source
            .by_ref()
            .take(u64::from(header_len))
            .read_to_end(&mut header)?;
        if header.len() < header_len as usize {
            return Err(Error::format(format!(
                "stream ended before end of header ({} of {header_len} bytes)",
                header.len()
            )));
        }
        let decode_table = parse_header(&header, granularity)?;

        let mut padding = [0u8; 1];
        read_field(source, &mut padding, "padding count")?;
        let padding = padding[0];
        if padding > 7 {
            return Err(Error::format(format!("padding count {padding} above 7")));
        }

        Ok(Self {
            decode_table,
            padding,
            header_len,
        })
    }

    /// Bytes occupied by the framing in front of the payload.
    pub fn framing_len(&self) -> u64 {
        4 + self.header_len as u64 + 1
    }
}

fn read_field<R: Read>(source: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    source.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            Error::format(format!("stream ended before {what}"))
        } else {
            Error::Io(e)
        }
    })
}
