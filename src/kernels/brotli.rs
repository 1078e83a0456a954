//! This module contains the kernels for Brotli compression and decompression into
//! caller-supplied, fixed-size working buffers.
//!
//! It is a safe, panic-free wrapper around the `brotli` crate. The output is a
//! bounded slice: the encoder fails when its output does not fit, and the decoder
//! reports exactly why it stopped. Every table the codec builds is allocated
//! through the caller's `MemoryPolicy`.

use ::brotli::enc::backward_references::BrotliEncoderMode;
use ::brotli::enc::encode::BrotliEncoderCompress;
use ::brotli::enc::interface::PredictionModeContextMap;
use ::brotli::enc::{InputPair, InputReferenceMut, StaticCommand};
use ::brotli::{BrotliDecompressStream, BrotliResult, BrotliState};

use crate::config::{CodecConfig, CompressionMode};
use crate::error::TextpackError;
use crate::memory::{AllocationLatch, MemoryPolicy, PolicyAllocator};

/// Smallest sliding window Brotli supports, as a power of two.
const MIN_WINDOW_BITS: u32 = 10;
/// Bytes at the top of a window the encoder cannot reference.
const WINDOW_GAP: usize = 16;

/// The outcome of a single decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// The stream decoded completely into the first `n` bytes of the output.
    Success(usize),
    /// The input ended before the stream did.
    NeedsMoreInput,
    /// The stream holds more data than the output can take.
    NeedsMoreOutput,
    /// The input is not a valid Brotli stream.
    Error,
}

impl DecodeStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeStatus::Success(_))
    }
}

impl From<BrotliResult> for DecodeStatus {
    /// `Success` carries no length here; `decode_into` fills it in.
    fn from(result: BrotliResult) -> Self {
        match result {
            BrotliResult::ResultSuccess => DecodeStatus::Success(0),
            BrotliResult::NeedsMoreInput => DecodeStatus::NeedsMoreInput,
            BrotliResult::NeedsMoreOutput => DecodeStatus::NeedsMoreOutput,
            BrotliResult::ResultFailure => DecodeStatus::Error,
        }
    }
}

//==================================================================================
// 1. The Transform
//==================================================================================

/// Brotli with quality, window and mode fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrotliTransform {
    quality: u32,
    window: u32,
    mode: CompressionMode,
}

impl BrotliTransform {
    pub fn new(quality: u32, window: u32, mode: CompressionMode) -> Self {
        Self {
            quality,
            window,
            mode,
        }
    }

    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new(config.quality, config.window, config.mode)
    }

    fn encoder_mode(&self) -> BrotliEncoderMode {
        match self.mode {
            CompressionMode::Generic => BrotliEncoderMode::BROTLI_MODE_GENERIC,
            CompressionMode::Text => BrotliEncoderMode::BROTLI_MODE_TEXT,
            CompressionMode::Font => BrotliEncoderMode::BROTLI_MODE_FONT,
        }
    }

    /// The smallest window that still spans all of `input_len`, capped at the
    /// configured one.
    ///
    /// The encoder sizes its match-finder tables from the window, so this keeps a
    /// short payload from reserving tables for megabytes it will never see. The
    /// stream is identical in every other respect.
    pub fn window_for(&self, input_len: usize) -> u32 {
        let mut bits = MIN_WINDOW_BITS.min(self.window);
        while bits < self.window && (1usize << bits) - WINDOW_GAP < input_len {
            bits += 1;
        }
        bits
    }

    /// Compresses `input` into `output`, returning the number of bytes written.
    ///
    /// # Errors
    /// Returns `TextpackError::Encode` if the compressed stream does not fit, and
    /// `TextpackError::Allocation` if `policy` refused the encoder any of its state.
    pub fn encode_into<P: MemoryPolicy>(
        &self,
        policy: &P,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, TextpackError> {
        let capacity = output.len();
        let latch = AllocationLatch::default();
        let mut alloc = PolicyAllocator::new(policy, &latch);
        let spare = alloc;
        let mut no_callback = |_: &mut PredictionModeContextMap<InputReferenceMut>,
                               _: &mut [StaticCommand],
                               _: InputPair,
                               _: &mut PolicyAllocator<'_, P>| ();

        let mut written = capacity;
        let ok = BrotliEncoderCompress(
            spare,
            &mut alloc,
            self.quality as i32,
            self.window_for(input.len()) as i32,
            self.encoder_mode(),
            input.len(),
            input,
            &mut written,
            output,
            &mut no_callback,
        );

        latch.check(policy.region())?;
        if ok == 0 {
            return Err(TextpackError::Encode(format!(
                "compressed stream does not fit ({} input bytes, {} byte working buffer)",
                input.len(),
                capacity
            )));
        }
        Ok(written)
    }

    /// Decompresses `input` into `output`. Never writes past `output`, never grows it.
    ///
    /// # Errors
    /// Returns `TextpackError::Allocation` if `policy` refused the decoder any of its
    /// tables. Every other outcome is a `DecodeStatus`.
    pub fn decode_into<P: MemoryPolicy>(
        &self,
        policy: &P,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<DecodeStatus, TextpackError> {
        if input.is_empty() {
            return Ok(DecodeStatus::NeedsMoreInput);
        }

        let latch = AllocationLatch::default();
        let status = {
            let alloc = PolicyAllocator::new(policy, &latch);
            let mut state = BrotliState::new(alloc, alloc, alloc);
            let mut available_in = input.len();
            let mut input_offset = 0;
            let mut available_out = output.len();
            let mut output_offset = 0;
            let mut total_out = 0;

            let result = BrotliDecompressStream(
                &mut available_in,
                &mut input_offset,
                input,
                &mut available_out,
                &mut output_offset,
                output,
                &mut total_out,
                &mut state,
            );
            match DecodeStatus::from(result) {
                DecodeStatus::Success(_) => DecodeStatus::Success(output_offset),
                other => other,
            }
            // `state` drops here and hands its tables back to the policy.
        };

        latch.check(policy.region())?;
        Ok(status)
    }
}

//==================================================================================
// 2. Unit Tests
//==================================================================================
