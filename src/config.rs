//! Codec configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::symbol::Granularity;

/// Default bytes per read.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Largest header accepted when opening a container (64 MiB).
pub const DEFAULT_MAX_HEADER_LEN: u32 = 64 << 20;

/// Smallest chunk that can hold any complete UTF-8 sequence.
const MIN_CHUNK_SIZE: usize = 4;

/// Tunables shared by compression and decompression.
///
/// The granularity is not recorded in the container, so both sides of a
/// round trip must agree on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Unit of coding: raw bytes or Unicode scalar values (default: chars).
    pub granularity: Granularity,

    /// Bytes requested from the source per read (default: 8 KiB).
    pub chunk_size: usize,

    /// Upper bound on the declared header length when decoding (default: 64 MiB).
    ///
    /// Checked before the header buffer is allocated.
    pub max_header_len: u32,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_header_len: DEFAULT_MAX_HEADER_LEN,
        }
    }
}

impl CodecConfig {
    /// Configuration for raw byte symbols.
    pub fn bytes() -> Self {
        Self {
            granularity: Granularity::Byte,
            ..Self::default()
        }
    }

    /// Configuration for Unicode scalar value symbols.
    pub fn chars() -> Self {
        Self {
            granularity: Granularity::Char,
            ..Self::default()
        }
    }

    /// Set the read chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the header size limit.
    pub fn with_max_header_len(mut self, max_header_len: u32) -> Self {
        self.max_header_len = max_header_len;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE {
            return Err(Error::InvalidConfig(format!(
                "chunk_size must be at least {MIN_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if self.max_header_len == 0 {
            return Err(Error::InvalidConfig(
                "max_header_len must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
