//! Quality search controller for sizefit.
//!
//! Drives repeated encode attempts through a [`QualityEncoder`] until an
//! output lands within the tolerance band around a byte target, or the
//! quality range is exhausted.
//!
//! # Strategy
//!
//! A binary search over quality assumes output size grows with quality. That
//! holds for JPEG and WebP. PNG compression levels can break it, so when the
//! attempt history is not monotonic an exhaustive scan over the distinct
//! settings takes over (see [`FallbackPolicy`]).
//!
//! The search never returns an overshoot: results are either inside the band
//! or the closest undershoot found.
//!
//! [`QualityEncoder`]: crate::encode::QualityEncoder

mod controller;
mod scan;
mod state;
mod types;

pub use controller::{encode_at_fixed_quality, find_quality_for_target_size};
pub use types::{
    Attempt, FallbackPolicy, MatchKind, SearchError, SearchOptions, SearchOutcome,
    DEFAULT_GIF_MIN_QUALITY,
};
