//! Error types for Huffman compression and decompression.

use thiserror::Error;

/// Error variants for codec operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The byte source or sink failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not valid UTF-8 where a Unicode scalar value was expected.
    #[error("invalid utf-8 sequence at byte offset {offset}")]
    InvalidEncoding {
        /// Absolute offset of the first byte of the offending sequence.
        offset: u64,
    },

    /// The container is corrupt or truncated.
    #[error("malformed container: {reason}")]
    Format {
        /// What was wrong with the container.
        reason: String,
    },

    /// A symbol seen while encoding has no code.
    ///
    /// The frequency pass and the encoding pass saw different data.
    #[error("symbol {symbol:#x} at symbol index {index} has no code")]
    UnknownSymbol {
        /// The raw symbol value.
        symbol: u32,
        /// Position of the symbol in the input, counted in symbols.
        index: u64,
    },

    /// A derived code does not fit in the 32-bit header field.
    #[error("code for symbol {symbol:#x} would need more than {max} bits")]
    CodeTooLong {
        /// The raw symbol value.
        symbol: u32,
        /// Longest representable code.
        max: u8,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Error::Format {
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
