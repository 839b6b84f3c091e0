mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sizefit_core::{
    compress::KIB, compress_file, config::validate_config, load_config, CompressError,
    CompressReport, CompressRequest,
};

use cli::Args;

/// Environment variable naming a config file when `--config` is absent.
const CONFIG_ENV: &str = "SIZEFIT_CONFIG";

const EXHAUSTED_MESSAGE: &str = "Couldn't compress to the desired size.";

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(report) => {
            println!("{}", report.status_line());
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Some(message) = exhaustion_message(&e) {
                println!("{}", message);
            }
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: &Args) -> Result<CompressReport> {
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    if let Some(path) = &config_path {
        info!("Loading configuration from {:?}", path);
    }
    let mut config = load_config(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    args.apply_overrides(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    debug!(?config, "Effective configuration");

    let request = CompressRequest {
        input: args.input.clone(),
        output: args.output.clone(),
        mode: args.mode()?,
        resize: args.resize(),
        allow_overshoot: args.allow_overshoot,
    };

    compress_file(&request, &config.search, config.output.resize_filter)
        .with_context(|| format!("Failed to compress {:?}", args.input))
}

fn is_exhausted(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CompressError>()
        .is_some_and(CompressError::is_exhausted)
}

/// Stdout text for an exhausted search, with the smallest size it reached.
fn exhaustion_message(err: &anyhow::Error) -> Option<String> {
    if !is_exhausted(err) {
        return None;
    }

    let smallest = err
        .downcast_ref::<CompressError>()
        .and_then(CompressError::smallest_overshoot);
    Some(match smallest {
        Some(attempt) => format!(
            "{}\nSmallest achievable size: {:.2} KB at quality={}",
            EXHAUSTED_MESSAGE,
            attempt.byte_size as f64 / KIB as f64,
            attempt.quality
        ),
        None => EXHAUSTED_MESSAGE.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};
    use sizefit_core::CompressStatus;
    use std::path::Path;

    fn write_gradient_png(path: &Path, width: u32, height: u32) {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x * 255 / width) as u8);
                pixels.push((y * 255 / height) as u8);
                pixels.push(((x ^ y) & 0xFF) as u8);
            }
        }
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(&pixels, width, height, ExtendedColorType::Rgb8)
            .unwrap();
        std::fs::write(path, buffer).unwrap();
    }

    fn args(extra: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("sizefit").chain(extra.iter().copied())).unwrap()
    }

    #[test]
    fn test_run_fixed_quality() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.jpg");
        write_gradient_png(&input, 64, 64);

        let report = run(&args(&[
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--quality",
            "60",
        ]))
        .unwrap();

        assert_eq!(report.status, CompressStatus::FixedQuality);
        assert!(report
            .status_line()
            .starts_with(&format!("Compressed to {} at quality=60", output.display())));
        assert!(output.exists());
    }

    #[test]
    fn test_run_unsupported_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.bmp");
        write_gradient_png(&input, 16, 16);

        let err = run(&args(&[
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--target-kb",
            "10",
        ]))
        .unwrap_err();

        assert!(!is_exhausted(&err));
        assert!(format!("{:#}", err).contains("Unsupported output format"));
        assert!(!output.exists());
    }

    #[test]
    fn test_run_exhaustion_detected_through_context() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.png");
        write_gradient_png(&input, 256, 256);

        let err = run(&args(&[
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--target-kb",
            "0",
            "--tolerance-kb",
            "0",
        ]))
        .unwrap_err();

        assert!(is_exhausted(&err));
        let message = exhaustion_message(&err).unwrap();
        let mut lines = message.lines();
        assert_eq!(lines.next(), Some(EXHAUSTED_MESSAGE));
        assert!(lines
            .next()
            .is_some_and(|line| line.starts_with("Smallest achievable size: ")));
        assert!(!output.exists());
    }

    #[test]
    fn test_exhaustion_message_only_for_exhausted_search() {
        let err = anyhow::Error::from(CompressError::from(
            sizefit_core::EncodeError::UnsupportedFormat {
                extension: "bmp".to_string(),
            },
        ));
        assert_eq!(exhaustion_message(&err), None);

        let err = anyhow::Error::from(CompressError::from(sizefit_core::SearchError::Exhausted {
            target_bytes: 1024,
            smallest_overshoot: Some(sizefit_core::search::Attempt {
                quality: 5,
                byte_size: 5120,
            }),
            attempts: 6,
        }))
        .context("Failed to compress \"in.png\"");
        assert_eq!(
            exhaustion_message(&err).unwrap(),
            "Couldn't compress to the desired size.\nSmallest achievable size: 5.00 KB at quality=5"
        );
    }

    #[test]
    fn test_run_rejects_crossed_quality_flags() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(&args(&[
            dir.path().join("in.png").to_str().unwrap(),
            dir.path().join("out.jpg").to_str().unwrap(),
            "-t",
            "10",
            "--min-quality",
            "90",
            "--max-quality",
            "10",
        ]))
        .unwrap_err();

        assert!(format!("{:#}", err).contains("Configuration validation failed"));
    }

    #[test]
    fn test_run_with_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out.webp");
        let config = dir.path().join("sizefit.toml");
        write_gradient_png(&input, 64, 64);
        std::fs::write(&config, "[search]\nmin_quality = 40\nmax_quality = 60\n").unwrap();

        let report = run(&args(&[
            input.to_str().unwrap(),
            output.to_str().unwrap(),
            "--target-kb",
            "1000",
            "--config",
            config.to_str().unwrap(),
        ]))
        .unwrap();

        assert!((40..=60).contains(&report.quality));
        assert_eq!(std::fs::metadata(&output).unwrap().len(), report.byte_size);
    }
}
