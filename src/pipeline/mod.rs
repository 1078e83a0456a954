//! The compress/decompress pipeline and its per-stage profiler.

pub mod orchestrator;
pub mod profiler;

pub use orchestrator::Codec;
pub use profiler::{Direction, PipelineReport, Stage};
