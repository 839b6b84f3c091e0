//! One compression job: source file in, one encoded file out.
//!
//! The output format is resolved from the output path before anything is
//! decoded, so an unsupported extension costs no decode and no encode. The
//! winning buffer is written exactly once, after the search has finished.

use std::fmt;
use std::fs::Permissions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::decode::{
    load_image, resize_to_fit, resize_to_width, DecodeError, DecodedImage, ResizeFilter,
};
use crate::encode::{EncodeError, EncodeResult, ImageQualityEncoder, OutputFormat};
use crate::search::{
    encode_at_fixed_quality, find_quality_for_target_size, Attempt, MatchKind, SearchError,
};

/// Bytes per kilobyte for target and tolerance options.
pub const KIB: u64 = 1024;

/// Errors from a compression job.
#[derive(Debug, Error)]
pub enum CompressError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Failed to load source image: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompressError {
    /// True when the search ran out of qualities without a usable result.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, CompressError::Search(SearchError::Exhausted { .. }))
    }

    /// Smallest output seen by an exhausted search.
    pub fn smallest_overshoot(&self) -> Option<Attempt> {
        match self {
            CompressError::Search(SearchError::Exhausted {
                smallest_overshoot, ..
            }) => *smallest_overshoot,
            _ => None,
        }
    }
}

/// How the quality is chosen. Exactly one per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressMode {
    /// Search for a quality whose output is near this many KiB.
    TargetSize { target_kb: u64 },
    /// Encode once at this quality.
    FixedQuality(u8),
}

/// Optional shrink applied to the source before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    Width(u32),
    MaxEdge(u32),
}

impl Resize {
    pub fn apply(self, image: &DecodedImage, filter: ResizeFilter) -> Result<DecodedImage, DecodeError> {
        match self {
            Resize::Width(width) => resize_to_width(image, width, filter),
            Resize::MaxEdge(max_edge) => resize_to_fit(image, max_edge, filter),
        }
    }
}

/// Everything a job needs besides configuration.
#[derive(Debug, Clone)]
pub struct CompressRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: CompressMode,
    pub resize: Option<Resize>,
    /// Write the smallest overshoot instead of failing on exhaustion.
    pub allow_overshoot: bool,
}

/// How the written file relates to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressStatus {
    WithinTolerance,
    ClosestUndershoot,
    FixedQuality,
    /// Nothing fit; the smallest overshoot was written on request.
    Overshoot,
}

impl From<MatchKind> for CompressStatus {
    fn from(kind: MatchKind) -> Self {
        match kind {
            MatchKind::WithinTolerance => CompressStatus::WithinTolerance,
            MatchKind::ClosestUndershoot => CompressStatus::ClosestUndershoot,
        }
    }
}

/// The chosen encode, before it is written anywhere.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub quality: u8,
    pub result: EncodeResult,
    pub status: CompressStatus,
    pub attempts: u32,
}

/// Summary of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressReport {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub quality: u8,
    pub byte_size: u64,
    pub target_bytes: Option<u64>,
    pub attempts: u32,
    pub status: CompressStatus,
}

impl CompressReport {
    /// Human-readable one-line outcome.
    pub fn status_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CompressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size_kb = self.byte_size as f64 / KIB as f64;
        write!(
            f,
            "Compressed to {} at quality={} ({:.2} KB)",
            self.output.display(),
            self.quality,
            size_kb
        )?;

        if let (CompressStatus::Overshoot, Some(target)) = (self.status, self.target_bytes) {
            write!(
                f,
                ", which is larger than the {:.2} KB target",
                target as f64 / KIB as f64
            )?;
        }
        Ok(())
    }
}

/// Choose and perform the encode for `mode` without touching the filesystem.
pub fn encode_for_mode(
    image: &DecodedImage,
    format: OutputFormat,
    mode: CompressMode,
    search: &SearchConfig,
    allow_overshoot: bool,
) -> Result<Encoded, CompressError> {
    let range = search.quality_range()?;
    let encoder = ImageQualityEncoder::new(image, format, range);

    let target_kb = match mode {
        CompressMode::FixedQuality(quality) => {
            if !format.has_quality_knob() {
                debug!(%format, quality, "Quality has no effect on this format");
            }
            let result = encode_at_fixed_quality(&encoder, quality)?;
            return Ok(Encoded {
                quality,
                result,
                status: CompressStatus::FixedQuality,
                attempts: 1,
            });
        }
        CompressMode::TargetSize { target_kb } => target_kb,
    };

    let target_bytes = target_kb.saturating_mul(KIB);
    let searched = find_quality_for_target_size(
        &encoder,
        target_bytes,
        search.tolerance_bytes(),
        range,
        &search.search_options(),
    );

    match searched {
        Ok(outcome) => Ok(Encoded {
            quality: outcome.quality,
            result: outcome.result,
            status: outcome.kind.into(),
            attempts: outcome.attempts,
        }),
        Err(SearchError::Exhausted {
            smallest_overshoot: Some(smallest),
            attempts,
            ..
        }) if allow_overshoot => {
            warn!(
                %format,
                quality = smallest.quality,
                size = smallest.byte_size,
                target_bytes,
                "No quality fits the target, keeping the smallest output"
            );
            let result = encode_at_fixed_quality(&encoder, smallest.quality)?;
            Ok(Encoded {
                quality: smallest.quality,
                result,
                status: CompressStatus::Overshoot,
                attempts: attempts + 1,
            })
        }
        Err(err) => Err(err.into()),
    }
}

/// Run one job end to end: resolve format, load, optionally resize, encode, write.
pub fn compress_file(
    request: &CompressRequest,
    search: &SearchConfig,
    resize_filter: ResizeFilter,
) -> Result<CompressReport, CompressError> {
    let format = OutputFormat::from_path(&request.output)?;
    // Reject bad bounds before paying for a decode.
    search.quality_range()?;

    let mut image = load_image(&request.input)?;
    if let Some(resize) = request.resize {
        image = resize.apply(&image, resize_filter)?;
        info!(
            width = image.width,
            height = image.height,
            "Resized source before encoding"
        );
    }

    let encoded = encode_for_mode(&image, format, request.mode, search, request.allow_overshoot)?;
    write_output(&request.output, &encoded.result.bytes)?;

    let target_bytes = match request.mode {
        CompressMode::TargetSize { target_kb } => Some(target_kb.saturating_mul(KIB)),
        CompressMode::FixedQuality(_) => None,
    };

    let report = CompressReport {
        output: request.output.clone(),
        format,
        quality: encoded.quality,
        byte_size: encoded.result.byte_size,
        target_bytes,
        attempts: encoded.attempts,
        status: encoded.status,
    };
    info!(
        output = %report.output.display(),
        %format,
        quality = report.quality,
        size = report.byte_size,
        attempts = report.attempts,
        status = ?report.status,
        "Compression finished"
    );
    Ok(report)
}

/// Stage `bytes` beside `path`, then rename over it, so a failed write never
/// leaves a truncated file at the destination.
fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CompressError> {
    let write_error = |source: std::io::Error| CompressError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;
    staged.write_all(bytes).map_err(write_error)?;
    if let Some(permissions) = output_permissions(path) {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(write_error)?;
    }
    staged.as_file().sync_all().map_err(write_error)?;

    // On failure the staged file is dropped and removed.
    staged.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

/// Keep an existing file's mode; new files get the usual 0644 rather than
/// the staging file's 0600.
#[cfg(unix)]
fn output_permissions(path: &Path) -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(
        std::fs::metadata(path)
            .map(|meta| meta.permissions())
            .unwrap_or_else(|_| Permissions::from_mode(0o644)),
    )
}

#[cfg(not(unix))]
fn output_permissions(path: &Path) -> Option<Permissions> {
    std::fs::metadata(path).ok().map(|meta| meta.permissions())
}
