use huffstream::{CodecConfig, HuffmanCodec};

fn main() -> huffstream::Result<()> {
    let input: Vec<u8> = (0..100_000u64)
        .map(|i| b"etaoin shrdlu"[(i * i % 13) as usize])
        .collect();
    let codec = HuffmanCodec::new(CodecConfig::bytes())?;

    for _ in 0..200 {
        let packed = codec.compress_bytes(&input)?;
        let restored = codec.decompress_bytes(&packed)?;
        assert_eq!(restored.len(), input.len());
    }
    Ok(())
}
