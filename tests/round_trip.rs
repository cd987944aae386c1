use sacodec::lz77;

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn round_trips_prose() -> Result<(), Box<dyn std::error::Error>> {
    init_log();
    let test_data = "This is the chaunt of the priests.  The chaunt of the priests of Mung.".as_bytes();
    let compressed = lz77::compress(test_data)?;
    let expanded = lz77::decompress(&compressed)?;
    assert_eq!(expanded, test_data);
    Ok(())
}

#[test]
fn round_trips_repeated_phrase() -> Result<(), Box<dyn std::error::Error>> {
    init_log();
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = lz77::compress(test_data)?;
    let expanded = lz77::decompress(&compressed)?;
    assert_eq!(expanded, test_data);
    assert!(compressed.len() <= test_data.len() + 2);
    Ok(())
}

#[test]
fn round_trips_binary_with_high_bit_bytes() -> Result<(), Box<dyn std::error::Error>> {
    init_log();
    let test_data: Vec<u8> = (0u8..=255).chain(0u8..=255).chain(200u8..=255).collect();
    let compressed = lz77::compress(&test_data)?;
    let expanded = lz77::decompress(&compressed)?;
    assert_eq!(expanded, test_data);
    Ok(())
}

#[test]
fn decompress_of_compress_is_identity_for_empty_and_tiny_inputs() -> Result<(), Box<dyn std::error::Error>> {
    init_log();
    for data in [&b""[..], b"x", b"xy", b"xyz"] {
        let compressed = lz77::compress(data)?;
        assert_eq!(lz77::decompress(&compressed)?, data);
    }
    Ok(())
}
