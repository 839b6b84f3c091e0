//! Binary search over the quality parameter.

use tracing::{debug, info, warn};

use crate::encode::{EncodeError, EncodeResult, OutputFormat, QualityEncoder, QualityRange};

use super::scan::exhaustive_scan;
use super::state::{Candidate, SearchState};
use super::types::{MatchKind, SearchError, SearchOptions, SearchOutcome};

/// Find a quality whose encoded size lands within `tolerance_bytes` of `target_bytes`.
///
/// Binary search assuming size grows with quality:
/// - an in-tolerance result ends the search immediately
/// - an overshoot lowers the upper bound and is discarded
/// - an undershoot is kept as the best candidate and raises the lower bound
///
/// When the range is exhausted the last undershoot is returned, which is the
/// largest one whenever size really is monotonic in quality. If every
/// attempt overshot, the search fails with [`SearchError::Exhausted`], which
/// reports the smallest size seen. GIF qualities below
/// `options.gif_min_quality` are skipped without encoding.
///
/// Without a fallback scan this performs at most `ceil(log2(n + 1))` encodes
/// for a range of `n` values. A quality whose effective setting was already
/// encoded reuses that size instead of encoding again; if it shares the best
/// candidate's setting, the candidate takes the higher quality.
pub fn find_quality_for_target_size<E>(
    encoder: &E,
    target_bytes: u64,
    tolerance_bytes: u64,
    range: QualityRange,
    options: &SearchOptions,
) -> Result<SearchOutcome, SearchError>
where
    E: QualityEncoder + ?Sized,
{
    let format = encoder.format();
    let mut state = SearchState::new(range, target_bytes, tolerance_bytes);

    while state.is_active() {
        let mid = state.midpoint();

        if format == OutputFormat::Gif && mid < options.gif_min_quality {
            state.low = mid as i32 + 1;
            continue;
        }

        let setting = encoder.effective_setting(mid);
        if let Some(size) = known_size(encoder, &state, setting) {
            debug!(%format, quality = mid, size, "Setting already encoded, reusing its size");
            if size > target_bytes {
                state.high = mid as i32 - 1;
            } else {
                if let Some(best) = state.best.as_mut() {
                    if encoder.effective_setting(best.quality) == setting {
                        best.quality = mid;
                    }
                }
                state.low = mid as i32 + 1;
            }
            continue;
        }

        let result = encoder.encode_at(mid)?;
        let size = result.byte_size;
        state.record(mid, size);
        debug!(%format, quality = mid, size, target_bytes, "Encode attempt");

        if state.within_tolerance(size) {
            state.best = Some(Candidate {
                quality: mid,
                result,
                kind: MatchKind::WithinTolerance,
            });
            break;
        } else if size > target_bytes {
            state.high = mid as i32 - 1;
        } else {
            state.best = Some(Candidate {
                quality: mid,
                result,
                kind: MatchKind::ClosestUndershoot,
            });
            state.low = mid as i32 + 1;
        }
    }

    let converged = matches!(
        state.best,
        Some(Candidate {
            kind: MatchKind::WithinTolerance,
            ..
        })
    );
    if !converged && options.fallback.applies_to(format) && !state.is_monotonic() {
        warn!(
            %format,
            attempts = state.attempts,
            "Encoded size is not monotonic in quality, scanning every setting"
        );
        exhaustive_scan(encoder, &mut state, range, options)?;
    }

    let attempts = state.attempts;
    let smallest_overshoot = state.smallest_overshoot;
    match state.into_outcome() {
        Some(outcome) => {
            info!(
                %format,
                quality = outcome.quality,
                size = outcome.result.byte_size,
                target_bytes,
                kind = ?outcome.kind,
                attempts,
                "Search finished"
            );
            Ok(outcome)
        }
        None => Err(SearchError::Exhausted {
            target_bytes,
            smallest_overshoot,
            attempts,
        }),
    }
}

/// Size already recorded for a quality sharing `setting`. A recorded size is
/// never within tolerance, since that ends the search.
fn known_size<E>(encoder: &E, state: &SearchState, setting: u8) -> Option<u64>
where
    E: QualityEncoder + ?Sized,
{
    state
        .history
        .iter()
        .find(|attempt| encoder.effective_setting(attempt.quality) == setting)
        .map(|attempt| attempt.byte_size)
}

/// Encode once at a caller-chosen quality, with no size check.
pub fn encode_at_fixed_quality<E>(encoder: &E, quality: u8) -> Result<EncodeResult, EncodeError>
where
    E: QualityEncoder + ?Sized,
{
    let result = encoder.encode_at(quality)?;
    info!(
        format = %encoder.format(),
        quality,
        size = result.byte_size,
        "Fixed-quality encode"
    );
    Ok(result)
}



#[cfg(test)]
mod proptests {
    use super::testing::CurveEncoder;
    use super::*;
    use crate::search::FallbackPolicy;
    use proptest::prelude::*;

    fn binary_bound(span: u32) -> u32 {
        // ceil(log2(span + 1))
        32 - span.leading_zeros()
    }

    fn monotonic_options() -> SearchOptions {
        SearchOptions {
            fallback: FallbackPolicy::Never,
            ..SearchOptions::default()
        }
    }

    proptest! {
        /// The binary phase never needs more than ceil(log2(n + 1)) encodes.
        #[test]
        fn prop_convergence_bound(
            (min, max) in (1u8..=100).prop_flat_map(|min| (Just(min), min..=100)),
            slope in 1u64..5_000,
            target in 0u64..600_000,
            tolerance in 0u64..20_000,
        ) {
            let encoder = CurveEncoder::new(OutputFormat::Jpeg, move |q| q as u64 * slope);
            let range = QualityRange::new(min, max).unwrap();
            let _ = find_quality_for_target_size(&encoder, target, tolerance, range, &monotonic_options());

            prop_assert!(encoder.calls.get() <= binary_bound(range.span()));
        }

        /// In-tolerance results satisfy the band; other results never overshoot.
        #[test]
        fn prop_tolerance_and_undershoot_bias(
            slope in 1u64..5_000,
            offset in 0u64..50_000,
            target in 0u64..600_000,
            tolerance in 0u64..20_000,
        ) {
            let encoder = CurveEncoder::new(OutputFormat::Webp, move |q| offset + q as u64 * slope);
            let result = find_quality_for_target_size(
                &encoder,
                target,
                tolerance,
                QualityRange::default(),
                &SearchOptions::default(),
            );

            match result {
                Ok(outcome) => {
                    let size = outcome.result.byte_size;
                    prop_assert!(QualityRange::default().contains(outcome.quality));
                    match outcome.kind {
                        MatchKind::WithinTolerance => prop_assert!(size.abs_diff(target) <= tolerance),
                        MatchKind::ClosestUndershoot => prop_assert!(size <= target),
                    }
                }
                Err(SearchError::Exhausted { smallest_overshoot, .. }) => {
                    // Only possible when even the minimum quality overshoots
                    let floor = offset + 5 * slope;
                    prop_assert!(floor > target + tolerance);
                    prop_assert_eq!(smallest_overshoot.map(|a| a.byte_size), Some(floor));
                }
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }

        /// Non-monotonic curves still never return an overshoot.
        #[test]
        fn prop_never_returns_overshoot(
            sizes in prop::collection::vec(1_000u64..200_000, 91),
            target in 1_000u64..200_000,
            tolerance in 0u64..5_000,
            policy in prop_oneof![
                Just(FallbackPolicy::Auto),
                Just(FallbackPolicy::Always),
                Just(FallbackPolicy::Never),
            ],
        ) {
            let lookup = sizes.clone();
            let encoder = CurveEncoder::new(OutputFormat::Png, move |q| lookup[(q - 5) as usize]);
            let options = SearchOptions { fallback: policy, ..SearchOptions::default() };

            if let Ok(outcome) = find_quality_for_target_size(
                &encoder, target, tolerance, QualityRange::default(), &options,
            ) {
                prop_assert!(outcome.result.byte_size <= target + tolerance);
            }
        }
    }
}
