//! Per-search bookkeeping.

use crate::encode::{EncodeResult, QualityRange};

use super::types::{Attempt, MatchKind, SearchOutcome};

/// The retained candidate and how it matched.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub quality: u8,
    pub result: EncodeResult,
    pub kind: MatchKind,
}

/// Mutable state owned by exactly one search.
///
/// Bounds are signed so `high = mid - 1` can drop below the lowest quality.
#[derive(Debug)]
pub(crate) struct SearchState {
    pub low: i32,
    pub high: i32,
    pub target_bytes: u64,
    pub tolerance_bytes: u64,
    pub best: Option<Candidate>,
    pub history: Vec<Attempt>,
    pub smallest_overshoot: Option<Attempt>,
    pub attempts: u32,
}

impl SearchState {
    pub fn new(range: QualityRange, target_bytes: u64, tolerance_bytes: u64) -> Self {
        Self {
            low: range.min() as i32,
            high: range.max() as i32,
            target_bytes,
            tolerance_bytes,
            best: None,
            history: Vec::new(),
            smallest_overshoot: None,
            attempts: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.low <= self.high
    }

    pub fn midpoint(&self) -> u8 {
        ((self.low + self.high) / 2) as u8
    }

    pub fn within_tolerance(&self, byte_size: u64) -> bool {
        byte_size.abs_diff(self.target_bytes) <= self.tolerance_bytes
    }

    pub fn classify(&self, byte_size: u64) -> Option<MatchKind> {
        if self.within_tolerance(byte_size) {
            Some(MatchKind::WithinTolerance)
        } else if byte_size < self.target_bytes {
            Some(MatchKind::ClosestUndershoot)
        } else {
            None
        }
    }

    /// Log one encode. Overshoots only leave their size behind.
    pub fn record(&mut self, quality: u8, byte_size: u64) {
        self.attempts += 1;
        let attempt = Attempt { quality, byte_size };
        self.history.push(attempt);

        if byte_size > self.target_bytes && !self.within_tolerance(byte_size) {
            let smaller = self
                .smallest_overshoot
                .map_or(true, |current| byte_size < current.byte_size);
            if smaller {
                self.smallest_overshoot = Some(attempt);
            }
        }
    }

    /// Whether a candidate of this size would replace the retained one.
    pub fn improves_on_best(&self, byte_size: u64) -> bool {
        let Some(kind) = self.classify(byte_size) else {
            return false;
        };
        let Some(best) = &self.best else {
            return true;
        };

        match (kind, best.kind) {
            (MatchKind::WithinTolerance, MatchKind::ClosestUndershoot) => true,
            (MatchKind::ClosestUndershoot, MatchKind::WithinTolerance) => false,
            (MatchKind::WithinTolerance, MatchKind::WithinTolerance) => {
                byte_size.abs_diff(self.target_bytes)
                    < best.result.byte_size.abs_diff(self.target_bytes)
            }
            (MatchKind::ClosestUndershoot, MatchKind::ClosestUndershoot) => {
                byte_size > best.result.byte_size
            }
        }
    }

    /// Whether recorded sizes never shrink as quality grows.
    pub fn is_monotonic(&self) -> bool {
        let mut sorted = self.history.clone();
        sorted.sort_by_key(|attempt| attempt.quality);
        sorted
            .windows(2)
            .all(|pair| pair[0].byte_size <= pair[1].byte_size)
    }

    pub fn into_outcome(self) -> Option<SearchOutcome> {
        let attempts = self.attempts;
        self.best.map(|candidate| SearchOutcome {
            quality: candidate.quality,
            result: candidate.result,
            kind: candidate.kind,
            attempts,
        })
    }
}
