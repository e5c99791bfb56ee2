//! Compression and decompression entry points.
//!
//! Compression makes two passes over the source: one to count symbol
//! frequencies, one to encode. Seekable sources are rewound between the
//! passes; anything else is buffered in memory first.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use tracing::{debug, info};

use crate::bitpack::{padding_for, BitPacker};
use crate::config::CodecConfig;
use crate::container::{ContainerHeader, ContainerWriter};
use crate::decoder::StreamDecoder;
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;
use crate::huffman::{code_table, CodeTable};
use crate::symbol::SymbolReader;

/// Figures from one compression run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressStats {
    /// Bytes read from the source in the encoding pass.
    pub input_bytes: u64,
    /// Symbols encoded.
    pub symbols: u64,
    /// Distinct symbols (code table entries).
    pub distinct_symbols: usize,
    /// Payload length in bits, excluding padding.
    pub payload_bits: u64,
    /// Zero bits appended to the final payload byte.
    pub padding_bits: u8,
    /// Bytes written to the sink, framing included.
    pub output_bytes: u64,
}

impl CompressStats {
    /// Output size over input size, or `None` for empty input.
    pub fn ratio(&self) -> Option<f64> {
        (self.input_bytes > 0).then(|| self.output_bytes as f64 / self.input_bytes as f64)
    }
}

/// Figures from one decompression run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecompressStats {
    /// Container bytes read, framing included.
    pub input_bytes: u64,
    /// Symbols decoded.
    pub symbols: u64,
    /// Bytes written to the sink.
    pub output_bytes: u64,
}

/// Result of the encoding pass.
struct Encoded {
    input_bytes: u64,
    symbols: u64,
    bits: u64,
    padding: u8,
}

/// Static Huffman compressor and decompressor.
#[derive(Debug, Clone, Default)]
pub struct HuffmanCodec {
    config: CodecConfig,
}

impl HuffmanCodec {
    /// Create a codec.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the configuration does not validate.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Compress a seekable source without seeking the sink.
    ///
    /// The padding count is derived from the frequency table before the
    /// payload is written.
    ///
    /// # Errors
    /// Returns `Error::Io` on source or sink failure, `Error::InvalidEncoding`
    /// for malformed char-mode input, `Error::CodeTooLong` if the tree is too
    /// deep for the container, and `Error::UnknownSymbol` or `Error::Format`
    /// if the source changed between the two passes.
    pub fn compress<R: Read + Seek, W: Write>(&self, mut source: R, sink: W) -> Result<CompressStats> {
        let (freq, codes) = self.first_pass(&mut source)?;
        let predicted_bits = codes.encoded_bit_len(&freq);
        let mut writer = ContainerWriter::begin(sink, &codes, padding_for(predicted_bits))?;

        let encoded = self.encode_pass(source, &codes, &mut writer)?;
        if encoded.symbols != freq.total() || encoded.bits != predicted_bits {
            return Err(Error::format(format!(
                "input changed between passes: counted {} symbols / {predicted_bits} bits, encoded {} / {}",
                freq.total(),
                encoded.symbols,
                encoded.bits
            )));
        }
        let output_bytes = writer.bytes_written();
        writer.finish(encoded.padding)?;
        Ok(self.report(&codes, &encoded, output_bytes))
    }

    /// Compress a seekable source into a seekable sink, patching the padding
    /// count in place after the payload.
    ///
    /// # Errors
    /// As [`HuffmanCodec::compress`]; additionally `Error::Io` if the sink
    /// cannot seek.
    pub fn compress_seekable<R: Read + Seek, W: Write + Seek>(
        &self,
        mut source: R,
        sink: W,
    ) -> Result<CompressStats> {
        let (_, codes) = self.first_pass(&mut source)?;
        let mut writer = ContainerWriter::begin_seekable(sink, &codes)?;
        let encoded = self.encode_pass(source, &codes, &mut writer)?;
        let output_bytes = writer.bytes_written();
        writer.finish_patched(encoded.padding)?;
        Ok(self.report(&codes, &encoded, output_bytes))
    }

    /// Compress a source that cannot be rewound by buffering it in memory.
    ///
    /// # Errors
    /// As [`HuffmanCodec::compress`].
    pub fn compress_unseekable<R: Read, W: Write>(&self, mut source: R, sink: W) -> Result<CompressStats> {
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;
        debug!(bytes = data.len(), "buffered unseekable source");
        self.compress(Cursor::new(data), sink)
    }

    /// Compress an in-memory buffer.
    ///
    /// # Errors
    /// As [`HuffmanCodec::compress`].
    pub fn compress_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.compress(Cursor::new(data), &mut out)?;
        Ok(out)
    }

    /// Decompress a container.
    ///
    /// # Errors
    /// Returns `Error::Format` for a corrupt or truncated container and
    /// `Error::Io` on source or sink failure.
    pub fn decompress<R: Read, W: Write>(&self, mut source: R, sink: W) -> Result<DecompressStats> {
        let header = ContainerHeader::read(
            &mut source,
            self.config.granularity,
            self.config.max_header_len,
        )?;
        let framing_len = header.framing_len();
        let mut decoder = StreamDecoder::new(header.decode_table, header.padding, self.config.granularity)?
            .with_chunk_size(self.config.chunk_size);

        let mut sink = CountingWriter::new(sink);
        let symbols = decoder.decode(source, &mut sink)?;
        let stats = DecompressStats {
            input_bytes: framing_len + decoder.bytes_consumed(),
            symbols,
            output_bytes: sink.count(),
        };
        info!(
            input_bytes = stats.input_bytes,
            output_bytes = stats.output_bytes,
            symbols,
            "decompression complete"
        );
        Ok(stats)
    }

    /// Decompress an in-memory container.
    ///
    /// # Errors
    /// As [`HuffmanCodec::decompress`].
    pub fn decompress_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.decompress(data, &mut out)?;
        Ok(out)
    }

    /// Count frequencies, derive codes, and rewind the source.
    fn first_pass<R: Read + Seek>(&self, source: &mut R) -> Result<(FrequencyTable, CodeTable)> {
        let start = source.stream_position()?;
        let freq = FrequencyTable::from_reader(&mut *source, &self.config)?;
        source.seek(SeekFrom::Start(start))?;
        let codes = code_table(&freq)?;
        Ok((freq, codes))
    }

    fn encode_pass<R: Read, W: Write>(
        &self,
        source: R,
        codes: &CodeTable,
        writer: &mut ContainerWriter<W>,
    ) -> Result<Encoded> {
        let mut symbols = SymbolReader::new(source, self.config.granularity, self.config.chunk_size);
        let mut packer = BitPacker::new();
        let mut index = 0u64;

        while let Some(symbol) = symbols.next_symbol()? {
            let code = codes.get(symbol).ok_or(Error::UnknownSymbol {
                symbol: symbol.value(),
                index,
            })?;
            packer.write_code(code);
            index += 1;
            if packer.buffered_bytes() >= self.config.chunk_size {
                writer.write_payload(&packer.flush_complete_bytes())?;
            }
        }

        let bits = packer.bit_count();
        let (tail, padding) = packer.finish();
        writer.write_payload(&tail)?;
        debug!(symbols = index, bits, padding, "encoding pass complete");
        Ok(Encoded {
            input_bytes: symbols.bytes_read(),
            symbols: index,
            bits,
            padding,
        })
    }

    fn report(&self, codes: &CodeTable, encoded: &Encoded, output_bytes: u64) -> CompressStats {
        let stats = CompressStats {
            input_bytes: encoded.input_bytes,
            symbols: encoded.symbols,
            distinct_symbols: codes.len(),
            payload_bits: encoded.bits,
            padding_bits: encoded.padding,
            output_bytes,
        };
        info!(
            input_bytes = stats.input_bytes,
            output_bytes = stats.output_bytes,
            distinct = stats.distinct_symbols,
            "compression complete"
        );
        stats
    }
}

/// Sink wrapper that counts bytes written.
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::write_header;
    use crate::symbol::Granularity;
    use std::io;

    fn chars() -> HuffmanCodec {
        HuffmanCodec::new(CodecConfig::chars()).unwrap()
    }

    fn bytes() -> HuffmanCodec {
        HuffmanCodec::new(CodecConfig::bytes()).unwrap()
    }

    /// Serves `first` until rewound, then `second`.
    struct ShiftingSource {
        first: Vec<u8>,
        second: Vec<u8>,
        rewound: bool,
        pos: usize,
    }

    impl ShiftingSource {
        fn new(first: &[u8], second: &[u8]) -> Self {
            Self {
                first: first.to_vec(),
                second: second.to_vec(),
                rewound: false,
                pos: 0,
            }
        }
    }

    impl Read for ShiftingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let data = if self.rewound { &self.second } else { &self.first };
            let n = buf.len().min(data.len() - self.pos);
            buf[..n].copy_from_slice(&data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl Seek for ShiftingSource {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            match pos {
                SeekFrom::Start(0) if self.pos > 0 => {
                    self.rewound = true;
                    self.pos = 0;
                }
                SeekFrom::Start(p) => self.pos = p as usize,
                _ => {}
            }
            Ok(self.pos as u64)
        }
    }

    /// Writer that refuses to seek.
    struct NoSeek(Vec<u8>);

    impl Write for NoSeek {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for NoSeek {
        fn seek(&mut self, _: SeekFrom) -> io::Result<u64> {
            Err(io::Error::new(io::ErrorKind::Unsupported, "pipe"))
        }
    }

    #[test]
    fn test_known_fixture_container() {
        let out = chars().compress_bytes(b"abacabadabacaba").unwrap();
        let freq = FrequencyTable::from_symbols(
            "abacabadabacaba".chars().map(crate::symbol::Symbol::from),
        );
        let header = write_header(&code_table(&freq).unwrap());

        let mut expected = (header.len() as u32).to_be_bytes().to_vec();
        expected.extend_from_slice(&header);
        expected.push(7);
        expected.extend_from_slice(&[0xB3, 0x62, 0xCD, 0x80]);
        assert_eq!(out, expected);
        assert_eq!(chars().decompress_bytes(&out).unwrap(), b"abacabadabacaba");
    }

    #[test]
    fn test_container_bytes_are_reproducible() {
        let a = chars().compress_bytes(b"abc").unwrap();
        let b = chars().compress_bytes(b"abc").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        let out = bytes().compress_bytes(b"").unwrap();
        assert_eq!(out, vec![0, 0, 0, 4, 0, 0, 0, 0, 0]);
        assert!(bytes().decompress_bytes(&out).unwrap().is_empty());
    }

    #[test]
    fn test_single_symbol_input() {
        let mut out = Vec::new();
        let stats = bytes().compress(Cursor::new(b"aa"), &mut out).unwrap();
        assert_eq!(stats.payload_bits, 2);
        assert_eq!(stats.padding_bits, 6);
        assert_eq!(stats.distinct_symbols, 1);
        assert_eq!(out.last(), Some(&0x00));
        assert_eq!(bytes().decompress_bytes(&out).unwrap(), b"aa");
    }

    #[test]
    fn test_unicode_roundtrip() {
        let text = "Grüße, 世界! 😀 naïve café → ünïcödé";
        let codec = HuffmanCodec::new(CodecConfig::chars().with_chunk_size(5)).unwrap();
        let out = codec.compress_bytes(text.as_bytes()).unwrap();
        assert_eq!(codec.decompress_bytes(&out).unwrap(), text.as_bytes());
    }

    #[test]
    fn test_binary_roundtrip() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * i % 251) as u8).collect();
        let codec = HuffmanCodec::new(CodecConfig::bytes().with_chunk_size(64)).unwrap();
        let out = codec.compress_bytes(&data).unwrap();
        assert_eq!(codec.decompress_bytes(&out).unwrap(), data);
    }

    #[test]
    fn test_invalid_utf8_in_char_mode() {
        let err = chars().compress_bytes(b"abc\xC3").unwrap_err();
        assert!(matches!(err, Error::InvalidEncoding { offset: 3 }));
    }

    #[test]
    fn test_granularity_mismatch_detected() {
        let out = chars().compress_bytes("€uro".as_bytes()).unwrap();
        let err = bytes().decompress_bytes(&out).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn test_stats() {
        let mut out = Vec::new();
        let stats = chars()
            .compress(Cursor::new("abacabadabacaba"), &mut out)
            .unwrap();
        assert_eq!(stats.input_bytes, 15);
        assert_eq!(stats.symbols, 15);
        assert_eq!(stats.payload_bits, 25);
        assert_eq!(stats.padding_bits, 7);
        assert_eq!(stats.output_bytes, out.len() as u64);
        assert!(stats.ratio().unwrap() > 1.0);

        let mut restored = Vec::new();
        let back = chars().decompress(out.as_slice(), &mut restored).unwrap();
        assert_eq!(back.input_bytes, out.len() as u64);
        assert_eq!(back.symbols, 15);
        assert_eq!(back.output_bytes, 15);
    }

    #[test]
    fn test_unknown_symbol_when_source_changes() {
        let source = ShiftingSource::new(b"aab", b"aac");
        let err = bytes().compress(source, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownSymbol { symbol, index: 2 } if symbol == b'c' as u32
        ));
    }

    #[test]
    fn test_length_change_between_passes() {
        let source = ShiftingSource::new(b"aab", b"aa");
        let err = bytes().compress(source, Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Format { reason } if reason.contains("changed between passes")));
    }

    #[test]
    fn test_seekable_sink_matches_default() {
        let input = b"mississippi river";
        let mut patched = Cursor::new(Vec::new());
        bytes().compress_seekable(Cursor::new(input), &mut patched).unwrap();
        assert_eq!(patched.into_inner(), bytes().compress_bytes(input).unwrap());
    }

    #[test]
    fn test_seek_patch_requires_seekable_sink() {
        let err = bytes()
            .compress_seekable(Cursor::new(b"abc"), NoSeek(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_unseekable_source() {
        let input: &[u8] = b"streamed from a pipe";
        let mut out = Vec::new();
        bytes().compress_unseekable(input, &mut out).unwrap();
        assert_eq!(bytes().decompress_bytes(&out).unwrap(), input);
    }

    #[test]
    fn test_source_position_is_respected() {
        let mut source = Cursor::new(b"skip:payload".to_vec());
        source.seek(SeekFrom::Start(5)).unwrap();
        let mut out = Vec::new();
        bytes().compress(&mut source, &mut out).unwrap();
        assert_eq!(bytes().decompress_bytes(&out).unwrap(), b"payload");
    }

    #[test]
    fn test_truncated_container() {
        let out = chars().compress_bytes(b"abacabadabacaba").unwrap();
        for cut in [0, 3, 10, out.len() - 2] {
            let err = chars().decompress_bytes(&out[..cut]).unwrap_err();
            assert!(matches!(err, Error::Format { .. }), "cut at {cut}");
        }
    }

    #[test]
    fn test_invalid_config() {
        let err = HuffmanCodec::new(CodecConfig::bytes().with_chunk_size(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(HuffmanCodec::default().config().granularity, Granularity::Char);
    }
}
