// In: src/error.rs

//! This module defines the single, unified error type for the entire textpack library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Callers of the compatibility API never see these values: every failure there is
//! collapsed into the canonical empty `Payload`. The `try_*` entry points on `Codec`
//! return them unchanged.

use thiserror::Error;

use crate::kernels::brotli::DecodeStatus;
use crate::memory::MemoryRegion;

#[derive(Error, Debug)]
pub enum TextpackError {
    // =========================================================================
    // === Pipeline Stage Errors
    // =========================================================================
    /// The input was not valid text-safe (Base64) encoding.
    #[error("Text-safe decoding failed: {0}")]
    TextDecode(String),

    /// The compression transform did not report success while decoding.
    #[error("Decompression failed: codec reported {0:?}")]
    Decompress(DecodeStatus),

    /// The compression transform could not produce output within the working buffer.
    #[error("Compression failed: {0}")]
    Encode(String),

    /// The allocator policy refused a working buffer or part of the codec's state.
    #[error("Allocation of {requested} bytes from {region} failed")]
    Allocation {
        requested: usize,
        region: MemoryRegion,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error from the Serde JSON library, typically while loading a `CodecConfig`.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The coarse failure taxonomy. Every `TextpackError` maps onto exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DecodeError,
    EncodeError,
    AllocationError,
    ConfigError,
}

impl TextpackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TextpackError::TextDecode(_) | TextpackError::Decompress(_) => ErrorKind::DecodeError,
            TextpackError::Encode(_) => ErrorKind::EncodeError,
            TextpackError::Allocation { .. } => ErrorKind::AllocationError,
            TextpackError::Config(_) | TextpackError::SerdeJson(_) | TextpackError::Io(_) => {
                ErrorKind::ConfigError
            }
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<base64::DecodeError> for TextpackError {
    fn from(err: base64::DecodeError) -> Self {
        TextpackError::TextDecode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_maps_to_spec_taxonomy() {
        assert_eq!(
            TextpackError::TextDecode("bad".into()).kind(),
            ErrorKind::DecodeError
        );
        assert_eq!(
            TextpackError::Decompress(DecodeStatus::NeedsMoreOutput).kind(),
            ErrorKind::DecodeError
        );
        assert_eq!(TextpackError::Encode("full".into()).kind(), ErrorKind::EncodeError);
        assert_eq!(
            TextpackError::Allocation {
                requested: 16,
                region: MemoryRegion::ExternalRam
            }
            .kind(),
            ErrorKind::AllocationError
        );
        assert_eq!(TextpackError::Config("q".into()).kind(), ErrorKind::ConfigError);
    }

    #[test]
    fn test_allocation_error_message_names_region() {
        let err = TextpackError::Allocation {
            requested: 4096,
            region: MemoryRegion::ExternalRam,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("external RAM"));
    }
}
