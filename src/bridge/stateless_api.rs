// In: src/bridge/stateless_api.rs

use std::sync::OnceLock;

use crate::bridge::format::CompressionStats;
use crate::error::TextpackError;
use crate::kernels::base64;
use crate::memory::DefaultPolicy;
use crate::pipeline::Codec;
use crate::types::Payload;

static DEFAULT_CODEC: OnceLock<Codec<DefaultPolicy>> = OnceLock::new();

/// The process-wide codec behind the free functions, built on first use.
pub fn default_codec() -> &'static Codec<DefaultPolicy> {
    DEFAULT_CODEC.get_or_init(Codec::with_defaults)
}

/// Compresses `message` and returns it as Base64 text.
///
/// Returns an empty payload if compression fails.
pub fn compress(message: &Payload) -> Payload {
    default_codec().compress(message)
}

/// Decompresses a payload produced by `compress`.
///
/// Returns an empty payload if the text is malformed, the stream is corrupt, or
/// the result does not fit the decompression buffer.
pub fn decompress(message: &Payload) -> Payload {
    default_codec().decompress(message)
}

/// Reports the sizes involved in a compressed payload by fully decoding it.
pub fn analyze_payload(message: &Payload) -> Result<CompressionStats, TextpackError> {
    let codec = default_codec();

    // 1. Size of the binary stream carried by the text.
    let binary = base64::decode(message.as_bytes(), codec.config().remove_linebreaks)?;

    // 2. Size of what it expands to.
    let decompressed = codec.try_decompress(message)?;

    let ratio = if message.is_empty() {
        0.0
    } else {
        decompressed.len() as f64 / message.len() as f64
    };

    Ok(CompressionStats {
        encoded_size: message.len(),
        compressed_size: binary.len(),
        decompressed_size: decompressed.len(),
        ratio,
    })
}
