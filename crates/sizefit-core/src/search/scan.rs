//! Exhaustive fallback scan.
//!
//! Runs after a binary search whose attempts show size shrinking as quality
//! grows. Every distinct codec setting in the range is evaluated once and the
//! best candidate replaces the binary search's guess.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::encode::{EncodeError, OutputFormat, QualityEncoder, QualityRange};

use super::state::{Candidate, SearchState};
use super::types::SearchOptions;

/// Scan one representative quality per effective setting.
///
/// Sizes already in the history are reused; a known size is only encoded
/// again when it would replace the retained candidate, since the buffer was
/// dropped the first time. Preference order: the in-tolerance result closest
/// to the target, then the largest undershoot.
pub(crate) fn exhaustive_scan<E>(
    encoder: &E,
    state: &mut SearchState,
    range: QualityRange,
    options: &SearchOptions,
) -> Result<(), EncodeError>
where
    E: QualityEncoder + ?Sized,
{
    let format = encoder.format();
    let known: HashMap<u8, u64> = state
        .history
        .iter()
        .map(|attempt| (attempt.quality, attempt.byte_size))
        .collect();

    for quality in representatives(encoder, state, range, options.gif_min_quality, format) {
        if state
            .best
            .as_ref()
            .is_some_and(|best| best.quality == quality)
        {
            continue;
        }

        let result = match known.get(&quality) {
            Some(&size) if !state.improves_on_best(size) => continue,
            Some(_) => {
                state.attempts += 1;
                encoder.encode_at(quality)?
            }
            None => {
                let result = encoder.encode_at(quality)?;
                state.record(quality, result.byte_size);
                debug!(%format, quality, size = result.byte_size, "Scan attempt");
                result
            }
        };

        if state.improves_on_best(result.byte_size) {
            if let Some(kind) = state.classify(result.byte_size) {
                state.best = Some(Candidate {
                    quality,
                    result,
                    kind,
                });
            }
        }
    }

    Ok(())
}

/// One quality per distinct setting, ascending by quality. Qualities already
/// tried are preferred as representatives so their sizes can be reused.
fn representatives<E>(
    encoder: &E,
    state: &SearchState,
    range: QualityRange,
    gif_min_quality: u8,
    format: OutputFormat,
) -> Vec<u8>
where
    E: QualityEncoder + ?Sized,
{
    let usable = |quality: u8| format != OutputFormat::Gif || quality >= gif_min_quality;

    let mut by_setting: BTreeMap<u8, u8> = BTreeMap::new();
    for attempt in &state.history {
        by_setting
            .entry(encoder.effective_setting(attempt.quality))
            .or_insert(attempt.quality);
    }
    for quality in range.iter().filter(|&q| usable(q)) {
        by_setting
            .entry(encoder.effective_setting(quality))
            .or_insert(quality);
    }

    let mut qualities: Vec<u8> = by_setting.into_values().collect();
    qualities.sort_unstable();
    qualities
}
