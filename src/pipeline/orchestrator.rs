// In: src/pipeline/orchestrator.rs

//! The two-stage pipeline: Brotli then Base64 on the way out, Base64 then Brotli on
//! the way back.
//!
//! Every transform writes into a `WorkingBuffer` drawn from the `Codec`'s
//! `MemoryPolicy`, and the codec's own state is allocated from the same policy. All
//! of it is dropped, and so released, on every path out of a call. Two entry points
//! exist per direction:
//!
//! * `try_compress` / `try_decompress` return `Result<Payload, TextpackError>`.
//! * `compress` / `decompress` collapse every failure into `Payload::empty()` and
//!   leave a single `error` line in the log.

use std::sync::Arc;

use crate::config::{CodecConfig, OutputBufferPolicy};
use crate::error::TextpackError;
use crate::kernels::base64;
use crate::kernels::{BrotliTransform, DecodeStatus};
use crate::memory::{default_policy, DefaultPolicy, MemoryPolicy, WorkingBuffer};
use crate::pipeline::profiler::{Direction, PipelineReport, Stage, StageTimer};
use crate::types::Payload;

/// A configured pipeline bound to one allocator policy.
#[derive(Debug)]
pub struct Codec<P: MemoryPolicy = DefaultPolicy> {
    config: Arc<CodecConfig>,
    transform: BrotliTransform,
    policy: P,
}

impl Codec<DefaultPolicy> {
    /// Default configuration on the build's default policy.
    pub fn with_defaults() -> Self {
        let config = Arc::new(CodecConfig::default());
        Self {
            transform: BrotliTransform::from_config(&config),
            config,
            policy: default_policy(),
        }
    }
}

impl<P: MemoryPolicy> Codec<P> {
    pub fn new(config: CodecConfig, policy: P) -> Result<Self, TextpackError> {
        Self::from_shared(Arc::new(config), policy)
    }

    /// Builds a codec around a configuration shared with other components.
    pub fn from_shared(config: Arc<CodecConfig>, policy: P) -> Result<Self, TextpackError> {
        config.validate()?;
        Ok(Self {
            transform: BrotliTransform::from_config(&config),
            config,
            policy,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    //==============================================================================
    // 1. Compatibility API (failure is the empty payload)
    //==============================================================================

    /// Compresses and text-encodes `input`, or returns the empty payload on failure.
    pub fn compress(&self, input: &Payload) -> Payload {
        self.try_compress(input)
            .unwrap_or_else(|e| collapse("textpack::compress", &e))
    }

    /// Decodes and decompresses `input`, or returns the empty payload on failure.
    pub fn decompress(&self, input: &Payload) -> Payload {
        self.try_decompress(input)
            .unwrap_or_else(|e| collapse("textpack::decompress", &e))
    }

    //==============================================================================
    // 2. Rich API
    //==============================================================================

    pub fn try_compress(&self, input: &Payload) -> Result<Payload, TextpackError> {
        self.profile_compress(input).map(|(payload, _)| payload)
    }

    pub fn try_decompress(&self, input: &Payload) -> Result<Payload, TextpackError> {
        self.profile_decompress(input).map(|(payload, _)| payload)
    }

    /// `try_compress`, also returning the per-stage timing report.
    pub fn profile_compress(
        &self,
        input: &Payload,
    ) -> Result<(Payload, PipelineReport), TextpackError> {
        let mut timer = StageTimer::new(Direction::Compress, input.len());
        let payload = self.run_compress(input, &mut timer)?;
        let report = timer.finish(payload.len());
        self.log_report(&report);
        Ok((payload, report))
    }

    /// `try_decompress`, also returning the per-stage timing report.
    pub fn profile_decompress(
        &self,
        input: &Payload,
    ) -> Result<(Payload, PipelineReport), TextpackError> {
        let mut timer = StageTimer::new(Direction::Decompress, input.len());
        let payload = self.run_decompress(input, &mut timer)?;
        let report = timer.finish(payload.len());
        self.log_report(&report);
        Ok((payload, report))
    }

    //==============================================================================
    // 3. Pipeline Stages
    //==============================================================================

    fn run_compress(
        &self,
        input: &Payload,
        timer: &mut StageTimer,
    ) -> Result<Payload, TextpackError> {
        // 1. Bound the output: input plus a fixed margin for incompressible data.
        let bound = input
            .len()
            .checked_add(self.config.safety_margin)
            .ok_or(TextpackError::Allocation {
                requested: usize::MAX,
                region: self.policy.region(),
            })?;

        // 2. Working buffer from the policy.
        timer.attempt();
        let mut working = timer.time(Stage::Allocate, || {
            WorkingBuffer::acquire(&self.policy, bound)
        })?;

        // 3. Compress with the system-wide parameters; the encoder's own tables come
        //    from the same policy.
        let written = timer.time(Stage::Transform, || {
            self.transform
                .encode_into(&self.policy, input.as_bytes(), &mut working)
        })?;
        log_metric!("event"="compress", "input"=&input.len(), "compressed"=&written, "bound"=&bound);

        // 4. Text-encode exactly the produced range.
        let text = timer.time(Stage::TextEncode, || {
            base64::encode(&working[..written], self.config.url_safe)
        });

        Ok(Payload::from(text))
    }

    fn run_decompress(
        &self,
        input: &Payload,
        timer: &mut StageTimer,
    ) -> Result<Payload, TextpackError> {
        // 1. Text-decode. Malformed text stops the pipeline here.
        let binary = timer.time(Stage::TextDecode, || {
            base64::decode(input.as_bytes(), self.config.remove_linebreaks)
        })?;

        let mut capacity = self.config.decoder_buffer_size;
        loop {
            // 2. Working buffer at the current size estimate.
            timer.attempt();
            let mut working = timer.time(Stage::Allocate, || {
                WorkingBuffer::acquire(&self.policy, capacity)
            })?;

            // 3. Decompress; anything but success is final unless the policy grows.
            let status = timer.time(Stage::Transform, || {
                self.transform.decode_into(&self.policy, &binary, &mut working)
            })?;

            match status {
                DecodeStatus::Success(len) => {
                    // 4. Copy out exactly the produced bytes.
                    let bytes = timer.time(Stage::Finish, || working[..len].to_vec());
                    return Ok(Payload::from(bytes));
                }
                DecodeStatus::NeedsMoreOutput => match self.next_capacity(capacity) {
                    Some(next) => {
                        log_metric!("event"="decompress_grow", "from"=&capacity, "to"=&next);
                        capacity = next;
                    }
                    None => return Err(TextpackError::Decompress(status)),
                },
                other => return Err(TextpackError::Decompress(other)),
            }
        }
    }

    fn next_capacity(&self, current: usize) -> Option<usize> {
        match self.config.output_buffer {
            OutputBufferPolicy::Fixed => None,
            OutputBufferPolicy::Grow { max_size } if current < max_size => {
                Some(current.saturating_mul(2).min(max_size))
            }
            OutputBufferPolicy::Grow { .. } => None,
        }
    }

    fn log_report(&self, report: &PipelineReport) {
        if self.config.log_details {
            log::debug!("\n{}", report);
        }
    }
}

/// The single log line a compat call leaves behind; the error already names its stage.
fn collapse(target: &str, error: &TextpackError) -> Payload {
    log::error!(target: target, "{}", error);
    Payload::empty()
}
