//! Per-stage timing for a single pipeline call.
//!
//! A `StageTimer` wraps each stage of `compress`/`decompress` and accumulates a
//! `PipelineReport`: how long each stage took, how many working-buffer attempts
//! were made, and the resulting size ratio.

use std::fmt;
use std::time::{Duration, Instant};

/// Which pipeline produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Decompress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    TextDecode,
    Allocate,
    Transform,
    TextEncode,
    Finish,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub direction: Direction,
    pub stages: Vec<(Stage, Duration)>,
    /// Working buffers acquired; more than one only under a grow policy.
    pub attempts: usize,
    pub input_len: usize,
    pub output_len: usize,
}

impl PipelineReport {
    fn new(direction: Direction, input_len: usize) -> Self {
        Self {
            direction,
            stages: Vec::new(),
            attempts: 0,
            input_len,
            output_len: 0,
        }
    }

    pub fn total(&self) -> Duration {
        self.stages.iter().map(|(_, d)| *d).sum()
    }

    /// Time spent in `stage`, summed over retries.
    pub fn stage_time(&self, stage: Stage) -> Duration {
        self.stages
            .iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, d)| *d)
            .sum()
    }

    /// Input size over output size. Zero when nothing was produced.
    pub fn ratio(&self) -> f64 {
        if self.output_len == 0 {
            0.0
        } else {
            self.input_len as f64 / self.output_len as f64
        }
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self.direction {
            Direction::Compress => "Compression",
            Direction::Decompress => "Decompression",
        };
        writeln!(f, "==== {} Details ====", title)?;
        for (stage, duration) in &self.stages {
            writeln!(f, "- {:?}: {:.2?}", stage, duration)?;
        }
        writeln!(f, "- Total Time: {:.2?}", self.total())?;
        writeln!(f, "- Buffer Attempts: {}", self.attempts)?;
        write!(
            f,
            "- Size: {} -> {} bytes (ratio {:.3})",
            self.input_len,
            self.output_len,
            self.ratio()
        )
    }
}

pub(crate) struct StageTimer {
    report: PipelineReport,
}

impl StageTimer {
    pub(crate) fn new(direction: Direction, input_len: usize) -> Self {
        Self {
            report: PipelineReport::new(direction, input_len),
        }
    }

    pub(crate) fn time<T>(&mut self, stage: Stage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.report.stages.push((stage, start.elapsed()));
        out
    }

    pub(crate) fn attempt(&mut self) {
        self.report.attempts += 1;
    }

    pub(crate) fn finish(mut self, output_len: usize) -> PipelineReport {
        self.report.output_len = output_len;
        self.report
    }
}
