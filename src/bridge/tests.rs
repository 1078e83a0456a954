use super::*;
use crate::kernels::base64;
use crate::types::Payload;

fn telemetry_message() -> Payload {
    let mut message = String::new();
    for i in 0..50 {
        message.push_str(&format!(
            "{{\"sensor\":\"temp\",\"seq\":{},\"value\":21.5,\"unit\":\"C\"}}\n",
            i
        ));
    }
    Payload::from(message)
}

#[test]
fn test_stateless_roundtrip() {
    let original = Payload::from("the quick brown fox the quick brown fox");
    let compressed = compress(&original);

    assert!(!compressed.is_empty());
    assert_eq!(decompress(&compressed), original);
}

#[test]
fn test_compressed_output_is_text_safe() {
    let compressed = compress(&telemetry_message());
    let text = compressed.as_str().unwrap();

    assert!(text
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='));
}

#[test]
fn test_telemetry_shrinks_in_transit() {
    let original = telemetry_message();
    let compressed = compress(&original);

    assert!(compressed.len() < original.len());
    assert!(compressed.len() < base64::encode(original.as_bytes(), false).len());
    assert_eq!(decompress(&compressed), original);
}

#[test]
fn test_empty_message_roundtrip() {
    let compressed = compress(&Payload::empty());
    assert!(!compressed.is_empty());
    assert!(decompress(&compressed).is_empty());
}

#[test]
fn test_failures_collapse_to_empty_payload() {
    // Not Base64 at all.
    assert!(decompress(&Payload::from("{\"plain\": \"json\"}")).is_empty());

    // Valid Base64, but a Brotli stream cut short.
    let binary = base64::decode(compress(&telemetry_message()).as_bytes(), false).unwrap();
    let truncated = base64::encode(&binary[..binary.len() / 2], false);
    assert!(decompress(&Payload::from(truncated)).is_empty());

    // Larger than the decompression buffer.
    let oversized = compress(&Payload::from(vec![b'#'; format::DECODER_BUFFER_SIZE + 1]));
    assert!(!oversized.is_empty());
    assert!(decompress(&oversized).is_empty());
}

#[test]
fn test_inputs_are_not_mutated() {
    let original = telemetry_message();
    let snapshot = original.clone();

    let compressed = compress(&original);
    let compressed_snapshot = compressed.clone();
    let _ = decompress(&compressed);

    assert_eq!(original, snapshot);
    assert_eq!(compressed, compressed_snapshot);
}
