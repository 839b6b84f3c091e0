use serde::{Deserialize, Serialize};

use crate::decode::ResizeFilter;
use crate::encode::{EncodeError, QualityRange};
use crate::search::{FallbackPolicy, SearchOptions, DEFAULT_GIF_MIN_QUALITY};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Quality search configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Accepted deviation from the target, in KiB.
    #[serde(default = "default_tolerance_kb")]
    pub tolerance_kb: u64,
    #[serde(default = "default_min_quality")]
    pub min_quality: u8,
    #[serde(default = "default_max_quality")]
    pub max_quality: u8,
    /// GIF qualities below this are skipped.
    #[serde(default = "default_gif_min_quality")]
    pub gif_min_quality: u8,
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

impl SearchConfig {
    pub fn quality_range(&self) -> Result<QualityRange, EncodeError> {
        QualityRange::new(self.min_quality, self.max_quality)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            gif_min_quality: self.gif_min_quality,
            fallback: self.fallback,
        }
    }

    pub fn tolerance_bytes(&self) -> u64 {
        self.tolerance_kb.saturating_mul(1024)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tolerance_kb: default_tolerance_kb(),
            min_quality: default_min_quality(),
            max_quality: default_max_quality(),
            gif_min_quality: default_gif_min_quality(),
            fallback: FallbackPolicy::default(),
        }
    }
}

fn default_tolerance_kb() -> u64 {
    5
}

fn default_min_quality() -> u8 {
    QualityRange::DEFAULT_MIN
}

fn default_max_quality() -> u8 {
    QualityRange::DEFAULT_MAX
}

fn default_gif_min_quality() -> u8 {
    DEFAULT_GIF_MIN_QUALITY
}

/// Output processing configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Filter used when `--width` or `--max-edge` shrinks the source.
    #[serde(default)]
    pub resize_filter: ResizeFilter,
}
