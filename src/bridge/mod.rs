// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing, stateless API of the textpack library. It binds
// the pipeline engine to one process-wide `Codec` so callers need nothing but a
// `Payload`.
//
// Data Flow (Compression):
//
//   1. [Stateless API (compress)]        -> Receives `&Payload`
//         |
//         `-> calls the shared `Codec<DefaultPolicy>` ->
//
//   2. [Pipeline Engine (Codec::compress)] -> Brotli into a working buffer, then Base64
//         |
//         `-> Returns a text-safe `Payload`, or `Payload::empty()` on failure
//
// Data Flow (Decompression):
//
//   1. [Stateless API (decompress)]      -> Receives a text-safe `&Payload`
//         |
//         `-> [Pipeline Engine (Codec::decompress)] -> Base64, then Brotli into a
//             working buffer
//         |
//         `-> Returns the original `Payload`, or `Payload::empty()` on failure
//
// ====================================================================================
pub mod format;
pub mod stateless_api;

pub use format::CompressionStats;
pub use stateless_api::{analyze_payload, compress, decompress, default_codec};

#[cfg(test)]
mod tests;
