//! MSB-first bit packing.
//!
//! Codes are appended most significant bit first. Complete bytes can be
//! drained at any time so the payload streams out while input is still
//! being encoded; the last partial byte is zero-filled on the low end
//! by [`BitPacker::finish`].

use crate::huffman::Code;

/// Number of zero bits needed to round `total_bits` up to a whole byte.
pub fn padding_for(total_bits: u64) -> u8 {
    ((8 - total_bits % 8) % 8) as u8
}

/// Accumulates variable-length codes into bytes.
#[derive(Debug, Default)]
pub struct BitPacker {
    acc: u8,
    pending: u8,
    out: Vec<u8>,
    total_bits: u64,
}

impl BitPacker {
    /// Create an empty packer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a code.
    pub fn write_code(&mut self, code: Code) {
        for i in 0..code.len() {
            self.acc = (self.acc << 1) | code.bit(i) as u8;
            self.pending += 1;
            if self.pending == 8 {
                self.out.push(self.acc);
                self.acc = 0;
                self.pending = 0;
            }
        }
        self.total_bits += code.len() as u64;
    }

    /// Drain the bytes completed so far.
    pub fn flush_complete_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }

    /// Completed bytes waiting to be drained.
    pub fn buffered_bytes(&self) -> usize {
        self.out.len()
    }

    /// Bits written so far.
    pub fn bit_count(&self) -> u64 {
        self.total_bits
    }

    /// Flush the final partial byte.
    ///
    /// Returns the remaining undrained bytes and the number of zero bits
    /// added to complete the last one (0 if nothing was pending).
    pub fn finish(mut self) -> (Vec<u8>, u8) {
        let padding = if self.pending > 0 {
            let pad = 8 - self.pending;
            self.out.push(self.acc << pad);
            pad
        } else {
            0
        };
        debug_assert_eq!(padding, padding_for(self.total_bits));
        (self.out, padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bit_string(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:08b}")).collect()
    }

    fn pack(codes: &[&str]) -> (Vec<u8>, u8) {
        let mut packer = BitPacker::new();
        let mut bytes = Vec::new();
        for c in codes {
            packer.write_code(c.parse().unwrap());
            bytes.extend(packer.flush_complete_bytes());
        }
        let (tail, padding) = packer.finish();
        bytes.extend(tail);
        (bytes, padding)
    }

    #[test]
    fn test_known_fixture_bitstream() {
        // "abacabadabacaba" with {a:1, b:01, c:001, d:000}
        let codes: Vec<&str> = "abacabadabacaba"
            .chars()
            .map(|c| match c {
                'a' => "1",
                'b' => "01",
                'c' => "001",
                _ => "000",
            })
            .collect();
        let (bytes, padding) = pack(&codes);
        assert_eq!(bytes, vec![0xB3, 0x62, 0xCD, 0x80]);
        assert_eq!(padding, 7);
        let bits = bit_string(&bytes);
        assert_eq!(&bits[..bits.len() - padding as usize], "1011001101100010110011011");
    }

    #[test]
    fn test_single_symbol_run() {
        let (bytes, padding) = pack(&["0", "0"]);
        assert_eq!(bytes, vec![0x00]);
        assert_eq!(padding, 6);
    }

    #[test]
    fn test_exact_byte_needs_no_padding() {
        let (bytes, padding) = pack(&["1010", "0101"]);
        assert_eq!(bytes, vec![0b1010_0101]);
        assert_eq!(padding, 0);
    }

    #[test]
    fn test_empty_packer() {
        let (bytes, padding) = BitPacker::new().finish();
        assert!(bytes.is_empty());
        assert_eq!(padding, 0);
    }

    #[test]
    fn test_code_spanning_bytes() {
        let mut packer = BitPacker::new();
        packer.write_code("111".parse().unwrap());
        assert!(packer.flush_complete_bytes().is_empty());
        packer.write_code("0".repeat(20).parse().unwrap());
        assert_eq!(packer.buffered_bytes(), 2);
        assert_eq!(packer.flush_complete_bytes(), vec![0xE0, 0x00]);
        assert_eq!(packer.bit_count(), 23);
        let (tail, padding) = packer.finish();
        assert_eq!(tail, vec![0x00]);
        assert_eq!(padding, 1);
    }

    #[test]
    fn test_padding_for() {
        assert_eq!(padding_for(0), 0);
        assert_eq!(padding_for(1), 7);
        assert_eq!(padding_for(8), 0);
        assert_eq!(padding_for(25), 7);
        assert_eq!(padding_for(31), 1);
    }
}
