use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgGroup, Parser};
use sizefit_core::{CompressMode, Config, Resize};

/// Re-encode an image so the output lands near a target size.
#[derive(Parser, Debug)]
#[command(name = "sizefit", version)]
#[command(about = "Re-encode an image as JPEG, WebP, PNG or GIF near a target file size")]
#[command(group(ArgGroup::new("mode").required(true).args(["target_kb", "quality"])))]
pub struct Args {
    /// Source image
    pub input: PathBuf,

    /// Destination; the extension selects the format (.jpg, .jpeg, .webp, .png, .gif)
    pub output: PathBuf,

    /// Target output size in KiB
    #[arg(short, long)]
    pub target_kb: Option<u64>,

    /// Encode once at this quality instead of searching
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Accepted deviation from the target in KiB
    #[arg(long)]
    pub tolerance_kb: Option<u64>,

    /// Lowest quality the search may try
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub min_quality: Option<u8>,

    /// Highest quality the search may try
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub max_quality: Option<u8>,

    /// Shrink to this width before encoding, keeping aspect ratio
    #[arg(long, conflicts_with = "max_edge")]
    pub width: Option<u32>,

    /// Shrink to fit a square of this size before encoding
    #[arg(long)]
    pub max_edge: Option<u32>,

    /// Write the smallest result even if it is over the target
    #[arg(long)]
    pub allow_overshoot: bool,

    /// TOML config file (defaults to $SIZEFIT_CONFIG when set)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log every encode attempt
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// The `mode` group makes exactly one of the two flags present.
    pub fn mode(&self) -> Result<CompressMode> {
        match (self.quality, self.target_kb) {
            (Some(quality), None) => Ok(CompressMode::FixedQuality(quality)),
            (None, Some(target_kb)) => Ok(CompressMode::TargetSize { target_kb }),
            (Some(_), Some(_)) => bail!("--target-kb and --quality cannot be combined"),
            (None, None) => bail!("one of --target-kb or --quality is required"),
        }
    }

    pub fn resize(&self) -> Option<Resize> {
        self.width
            .map(Resize::Width)
            .or(self.max_edge.map(Resize::MaxEdge))
    }

    /// Flags win over file and environment settings.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(tolerance_kb) = self.tolerance_kb {
            config.search.tolerance_kb = tolerance_kb;
        }
        if let Some(min_quality) = self.min_quality {
            config.search.min_quality = min_quality;
        }
        if let Some(max_quality) = self.max_quality {
            config.search.max_quality = max_quality;
        }
    }
}
