//! This module defines the core, strongly-typed data representations used
//! throughout the textpack pipeline.
//!
//! It currently includes the owned `Payload` byte container passed into and
//! returned from every pipeline call.

pub mod payload;

// Re-export the main type(s) for easier access.
pub use payload::Payload;
