//! This module collects the two black-box transforms the pipeline is built from.
//!
//! Both are pure and stateless: they never allocate the buffers they write into
//! and never log. Memory comes from the caller's `MemoryPolicy`, diagnostics from
//! the orchestrator.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Stage 1: Entropy Coding
pub mod brotli;

/// Stage 2: Text-Safe Transport Encoding
pub mod base64;

pub use self::brotli::{BrotliTransform, DecodeStatus};
