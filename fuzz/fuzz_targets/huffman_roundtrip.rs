#![no_main]
use huffstream::{CodecConfig, HuffmanCodec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (Vec<u8>, u8, bool)| {
    let (input, chunk, text) = data;
    let chunk_size = (chunk as usize % 64) + 4;
    let config = if text {
        CodecConfig::chars()
    } else {
        CodecConfig::bytes()
    };
    let codec = match HuffmanCodec::new(config.with_chunk_size(chunk_size)) {
        Ok(codec) => codec,
        Err(_) => return,
    };

    // Invalid UTF-8 in char mode is an expected rejection.
    let packed = match codec.compress_bytes(&input) {
        Ok(packed) => packed,
        Err(_) => {
            assert!(text);
            return;
        }
    };
    assert_eq!(codec.decompress_bytes(&packed).unwrap(), input);

    // Arbitrary bytes fed to the decoder must fail cleanly, never panic.
    let _ = codec.decompress_bytes(&input);
});
