//! Types shared by the quality search.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encode::{EncodeError, EncodeResult, OutputFormat};

/// GIF qualities below this are skipped without encoding.
pub const DEFAULT_GIF_MIN_QUALITY: u8 = 50;

/// Errors that end a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// An encode attempt failed; the search stops immediately.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Every attempt overshot the target (or none could be made).
    #[error(
        "No quality produced an output at or under {target_bytes} bytes after {attempts} attempts{}",
        smallest_suffix(.smallest_overshoot)
    )]
    Exhausted {
        target_bytes: u64,
        /// Smallest output observed, if any attempt was made.
        smallest_overshoot: Option<Attempt>,
        attempts: u32,
    },
}

fn smallest_suffix(smallest: &Option<Attempt>) -> String {
    match smallest {
        Some(attempt) => format!(
            "; smallest was {} bytes at quality={}",
            attempt.byte_size, attempt.quality
        ),
        None => String::new(),
    }
}

/// Size observed for one encode attempt. Buffers are not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub quality: u8,
    pub byte_size: u64,
}

/// How a returned candidate relates to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// `|size - target| <= tolerance`.
    WithinTolerance,
    /// Nothing landed in the band; this is the largest result under target.
    ClosestUndershoot,
}

/// Result of a successful search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub quality: u8,
    pub result: EncodeResult,
    pub kind: MatchKind,
    /// Number of encodes performed, including any fallback scan.
    pub attempts: u32,
}

/// When to fall back to an exhaustive scan after a non-monotonic binary search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Only for PNG, whose compression levels are not size-monotonic.
    #[default]
    Auto,
    Always,
    Never,
}

impl FallbackPolicy {
    pub fn applies_to(self, format: OutputFormat) -> bool {
        match self {
            FallbackPolicy::Auto => format == OutputFormat::Png,
            FallbackPolicy::Always => true,
            FallbackPolicy::Never => false,
        }
    }
}

/// Tunables that do not change per call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub gif_min_quality: u8,
    pub fallback: FallbackPolicy,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            gif_min_quality: DEFAULT_GIF_MIN_QUALITY,
            fallback: FallbackPolicy::default(),
        }
    }
}
