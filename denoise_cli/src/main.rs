//! Denoises slices of a TIFF stack with Non-Local Means.
//!
//! ```bash
//! denoise --input cells.tif --range 1-3 --h 1.5
//! denoise --input cells.tif --job job.yaml --output-dir out --backend cpu
//! ```

mod args;
mod job;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use denoising::{
    DenoiseEngine, DenoiseProgress, ImageHandle, ImageHost, NonLocalMeansDenoiser,
    ProgressCallback, RuntimeBridge, TiffHost,
};

use crate::args::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("denoise_logs"));
    common::log_setup::setup_logging(&cli.log_level, &log_dir)?;

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let settings = cli.settings()?;

    let runtime = RuntimeBridge::global();
    let context = runtime
        .start(&settings.runtime)
        .context("failed to start the compute runtime")?;
    tracing::info!(
        "Runtime '{}' ready ({})",
        context.backend(),
        context.adapter_name().unwrap_or("cpu")
    );

    let host = TiffHost::new(&cli.output_dir);
    let image = host
        .open_image(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    let range = settings.range.resolve(&image)?;

    let denoiser = NonLocalMeansDenoiser::new(settings.nlm)?;
    let engine = DenoiseEngine::new(denoiser)
        .with_runtime(runtime)
        .with_slice_policy(settings.slice_policy)
        .with_progress(ProgressCallback::new(Arc::new(|progress: DenoiseProgress| {
            tracing::info!("Denoising slice {}: {:.0}%", progress.slice, progress.percent());
        })));

    let title = settings
        .title
        .unwrap_or_else(|| format!("{} [NLM h={}]", image.title(), settings.nlm.h));
    let output = engine.denoise(&image, &range, &title)?;

    host.show(&ImageHandle::from(output))?;
    tracing::info!("Wrote {}", host.output_path(&title).display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use denoising::{ImageStack, PixelBuffer, StackInfo};

    #[test]
    fn denoises_a_tiff_on_the_cpu() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("cells.tif");
        let output_dir = dir.path().join("out");
        std::fs::create_dir(&output_dir).unwrap();

        let slices = (0..3u16)
            .map(|i| {
                let data = (0..16 * 12u16).map(|p| (p * 97 + i * 31) % 4096).collect();
                PixelBuffer::new_u16(16, 12, data).unwrap()
            })
            .collect();
        ImageStack::new("cells", slices).unwrap().save_tiff(&input).unwrap();

        let staging = dir.path().join("staging");
        let cli = Cli::try_parse_from([
            "denoise",
            "--input",
            input.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
            "--staging-dir",
            staging.to_str().unwrap(),
            "--backend",
            "cpu",
            "--range",
            "1-2",
            "--h",
            "1.5",
            "--title",
            "cells denoised",
        ])
        .unwrap();
        run(&cli).unwrap();

        let output = ImageStack::read_tiff(output_dir.join("cells denoised.tif")).unwrap();
        assert_eq!(output.slice_count(), 2);
        assert_eq!(output.dimensions(), (16, 12));
        assert_eq!(output.bit_depth(), 16);
        assert_eq!(output.property("denoise.algorithm"), Some("nonlocalmeans"));
        assert_eq!(output.property("denoise.range.first"), Some("1"));
        assert_eq!(output.property("denoise.range.last"), Some("2"));
    }
}
