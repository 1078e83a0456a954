// In: src/bridge/format.rs

//! Defines the constants that shape the pipeline's buffers and the statistics
//! structure returned by `analyze_payload`.

/// Initial (and by default, only) size of the decompression working buffer.
pub const DECODER_BUFFER_SIZE: usize = 16_384;

/// Bytes reserved beyond the input length for the compressed output.
pub const COMPRESS_SAFETY_MARGIN: usize = 150;

/// Brotli's maximum quality.
pub const DEFAULT_QUALITY: u32 = 11;

/// log2 of the default Brotli sliding window (4 MiB).
pub const DEFAULT_WINDOW: u32 = 22;

/// The public-facing struct for payload analysis results, returned by `analyze_payload`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionStats {
    /// Length of the text-safe payload.
    pub encoded_size: usize,
    /// Length of the Brotli stream inside it.
    pub compressed_size: usize,
    pub decompressed_size: usize,
    /// `decompressed_size / encoded_size`; below 1.0 the payload grew in transit.
    pub ratio: f64,
}
