//! This file is the root of the `textpack` Rust crate.
//!
//! `textpack` compresses text payloads with Brotli and carries the result as
//! Base64, for devices that must move data over transports that only take text.
//! Every working buffer, and every table the codec builds, is drawn from an
//! injectable `MemoryPolicy`, so boards with external RAM can keep the codec out of
//! their scarce internal heap.
//!
//! ```
//! use textpack::{compress, decompress, Payload};
//!
//! let message = Payload::from("the quick brown fox the quick brown fox");
//! let packed = compress(&message);
//! assert_eq!(decompress(&packed), message);
//! ```

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod config;
pub mod kernels;
pub mod memory;
pub mod pipeline;

mod error;
mod types;

#[doc(hidden)]
pub use log as __log;

//==================================================================================
// 2. Public Surface
//==================================================================================
pub use bridge::{analyze_payload, compress, decompress, CompressionStats};
pub use config::{CodecConfig, CompressionMode, OutputBufferPolicy};
pub use error::{ErrorKind, TextpackError};
pub use memory::{
    CapsPolicy, DefaultPolicy, HeapPolicy, MemoryPolicy, MemoryRegion, TrackingPolicy,
};
pub use observability::enable_verbose_logging;
pub use pipeline::{Codec, PipelineReport};
pub use types::Payload;
