// In: src/config.rs

//! The single source of truth for all textpack codec configuration.
//!
//! `CodecConfig` is created once at the application boundary (e.g. from a JSON
//! blob in the device's settings partition) and then shared, read-only, as an
//! `Arc<CodecConfig>` by the `Codec`. Compression parameters are fixed for the
//! whole system; there is no per-call override.

use serde::{Deserialize, Serialize};

use crate::bridge::format::{
    COMPRESS_SAFETY_MARGIN, DECODER_BUFFER_SIZE, DEFAULT_QUALITY, DEFAULT_WINDOW,
};
use crate::error::TextpackError;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// The content hint handed to the Brotli encoder.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMode {
    Generic,
    /// **Default:** UTF-8 text payloads.
    #[default]
    Text,
    Font,
}

/// How the decompression stage reacts when the decoded output does not fit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum OutputBufferPolicy {
    /// **Default:** one working buffer of `decoder_buffer_size`. Payloads that
    /// decompress to more than that fail.
    #[default]
    Fixed,

    /// Double the working buffer on "needs more output" and retry, up to `max_size`.
    Grow {
        #[serde(default = "default_grow_max_size")]
        max_size: usize,
    },
}

fn default_grow_max_size() -> usize {
    DECODER_BUFFER_SIZE * 16
}

//==================================================================================
// II. The Unified CodecConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// Brotli quality, 0 (fastest) to 11 (smallest).
    #[serde(default = "default_quality")]
    pub quality: u32,

    /// Brotli window size as log2 of the window, 10 to 24.
    #[serde(default = "default_window")]
    pub window: u32,

    #[serde(default)]
    pub mode: CompressionMode,

    /// Extra bytes reserved beyond the input length for the compression output.
    #[serde(default = "default_safety_margin")]
    pub safety_margin: usize,

    /// Initial (and, under `Fixed`, only) decompression working buffer size.
    #[serde(default = "default_decoder_buffer_size")]
    pub decoder_buffer_size: usize,

    #[serde(default)]
    pub output_buffer: OutputBufferPolicy,

    /// Emit the URL and filename safe alphabet instead of the standard one.
    #[serde(default)]
    pub url_safe: bool,

    /// Strip CR/LF from text before decoding it.
    #[serde(default)]
    pub remove_linebreaks: bool,

    /// Log a per-stage timing report at `debug` level after each call.
    #[serde(default)]
    pub log_details: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            window: default_window(),
            mode: CompressionMode::default(),
            safety_margin: default_safety_margin(),
            decoder_buffer_size: default_decoder_buffer_size(),
            output_buffer: OutputBufferPolicy::default(),
            url_safe: false,
            remove_linebreaks: false,
            log_details: false,
        }
    }
}

impl CodecConfig {
    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, TextpackError> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TextpackError> {
        if self.quality > 11 {
            return Err(TextpackError::Config(format!(
                "quality must be in 0..=11, got {}",
                self.quality
            )));
        }
        if !(10..=24).contains(&self.window) {
            return Err(TextpackError::Config(format!(
                "window must be in 10..=24, got {}",
                self.window
            )));
        }
        if self.decoder_buffer_size == 0 {
            return Err(TextpackError::Config(
                "decoder_buffer_size must be non-zero".to_string(),
            ));
        }
        if let OutputBufferPolicy::Grow { max_size } = self.output_buffer {
            if max_size < self.decoder_buffer_size {
                return Err(TextpackError::Config(format!(
                    "grow max_size ({}) is smaller than decoder_buffer_size ({})",
                    max_size, self.decoder_buffer_size
                )));
            }
        }
        Ok(())
    }
}

fn default_quality() -> u32 {
    DEFAULT_QUALITY
}

fn default_window() -> u32 {
    DEFAULT_WINDOW
}

fn default_safety_margin() -> usize {
    COMPRESS_SAFETY_MARGIN
}

fn default_decoder_buffer_size() -> usize {
    DECODER_BUFFER_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_yields_defaults() {
        let config = CodecConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.quality, 11);
        assert_eq!(config.window, 22);
        assert_eq!(config.safety_margin, 150);
        assert_eq!(config.decoder_buffer_size, 16_384);
        assert_eq!(config.mode, CompressionMode::Text);
        assert_eq!(config.output_buffer, OutputBufferPolicy::Fixed);
    }

    #[test]
    fn test_grow_policy_parses_with_and_without_cap() {
        let config = CodecConfig::from_json_str(
            r#"{"output_buffer": {"strategy": "grow", "max_size": 65536}, "url_safe": true}"#,
        )
        .unwrap();
        assert_eq!(
            config.output_buffer,
            OutputBufferPolicy::Grow { max_size: 65_536 }
        );
        assert!(config.url_safe);

        let config =
            CodecConfig::from_json_str(r#"{"output_buffer": {"strategy": "grow"}}"#).unwrap();
        assert_eq!(
            config.output_buffer,
            OutputBufferPolicy::Grow {
                max_size: DECODER_BUFFER_SIZE * 16
            }
        );
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let err = CodecConfig::from_json_str(r#"{"quality": 12}"#).unwrap_err();
        assert!(matches!(err, TextpackError::Config(_)));

        let err = CodecConfig::from_json_str(r#"{"window": 9}"#).unwrap_err();
        assert!(matches!(err, TextpackError::Config(_)));

        let err = CodecConfig::from_json_str(
            r#"{"decoder_buffer_size": 4096, "output_buffer": {"strategy": "grow", "max_size": 1024}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("max_size"));
    }

    #[test]
    fn test_malformed_json_is_a_serde_error() {
        let err = CodecConfig::from_json_str("{quality").unwrap_err();
        assert!(matches!(err, TextpackError::SerdeJson(_)));
    }
}
