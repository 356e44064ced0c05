//! Per-slice denoising transforms.

mod nlm;
mod noise;

pub use nlm::{GpuNonLocalMeansPipeline, NonLocalMeansDenoiser, NonLocalMeansParams};
pub use noise::estimate_noise;

use std::fmt;

use crate::common::Result;
use crate::image::PixelBuffer;
use crate::processing_context::ProcessingContext;

/// Prefix of every property a denoiser records on its output image.
pub const PARAM_PREFIX: &str = "denoise.";

/// Parameters bound to a denoiser instance.
pub trait DenoiseParams: fmt::Debug + fmt::Display + Send + Sync {
    /// Lowercase algorithm id, used in property keys.
    fn algorithm(&self) -> &'static str;

    /// `(name, value)` pairs, without prefix.
    fn parameter_list(&self) -> Vec<(String, String)>;

    fn validate(&self) -> Result<()>;
}

/// A pure transform of one slice buffer.
///
/// Implementations know nothing about stacks, ranges or the runtime; the
/// engine hands them one buffer at a time. The same input and parameters
/// must give the same output.
pub trait Denoiser: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn params(&self) -> &dyn DenoiseParams;

    /// Largest tile edge the engine should hand to [`denoise`](Self::denoise).
    fn tile_size(&self) -> u32 {
        512
    }

    /// Context pixels the transform reads around each output pixel.
    fn margin(&self) -> u32 {
        0
    }

    /// Denoises `input`; the result has the same dimensions and bit depth.
    fn denoise(&self, ctx: &ProcessingContext, input: &PixelBuffer) -> Result<PixelBuffer>;

    /// Whole-slice statistics the tiles of `slice` are denoised with.
    fn slice_stats(&self, _slice: &PixelBuffer) -> Result<SliceStats> {
        Ok(SliceStats::default())
    }

    /// Denoises one tile of a slice using the slice's `stats`.
    ///
    /// Tiling a slice and denoising its tiles with margins must give the
    /// same pixels as [`denoise`](Self::denoise) on the whole slice.
    fn denoise_tile(
        &self,
        ctx: &ProcessingContext,
        tile: &PixelBuffer,
        _stats: &SliceStats,
    ) -> Result<PixelBuffer> {
        self.denoise(ctx, tile)
    }

    /// Parameters as `denoise.`-prefixed properties for the output image.
    fn properties(&self) -> Vec<(String, String)> {
        let params = self.params();
        let algorithm = params.algorithm();

        let mut properties = vec![(format!("{}algorithm", PARAM_PREFIX), algorithm.to_string())];
        properties.extend(
            params
                .parameter_list()
                .into_iter()
                .map(|(name, value)| (format!("{}{}.{}", PARAM_PREFIX, algorithm, name), value)),
        );
        properties
    }
}

/// Statistics of a whole slice, computed once before it is split into tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SliceStats {
    /// Noise standard deviation on normalised intensities.
    pub noise_sigma: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpParams;

impl fmt::Display for NoOpParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no parameters")
    }
}

impl DenoiseParams for NoOpParams {
    fn algorithm(&self) -> &'static str {
        "noop"
    }

    fn parameter_list(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Returns its input unchanged. Useful to validate the pipeline around a denoiser.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDenoiser {
    params: NoOpParams,
}

impl NoOpDenoiser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Denoiser for NoOpDenoiser {
    fn name(&self) -> &str {
        "No-op"
    }

    fn params(&self) -> &dyn DenoiseParams {
        &self.params
    }

    fn denoise(&self, _ctx: &ProcessingContext, input: &PixelBuffer) -> Result<PixelBuffer> {
        Ok(input.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_returns_input() {
        let input = PixelBuffer::new_u16(2, 2, vec![1, 2, 3, 4]).unwrap();
        let output = NoOpDenoiser::new()
            .denoise(&ProcessingContext::cpu_only(), &input)
            .unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn properties_are_prefixed() {
        let denoiser = NonLocalMeansDenoiser::new(NonLocalMeansParams::new(1.5)).unwrap();
        let properties = denoiser.properties();

        assert_eq!(
            properties[0],
            ("denoise.algorithm".to_string(), "nonlocalmeans".to_string())
        );
        assert!(properties.contains(&("denoise.nonlocalmeans.h".to_string(), "1.5".to_string())));
        assert!(properties.iter().all(|(key, _)| key.starts_with(PARAM_PREFIX)));

        let noop = NoOpDenoiser::new().properties();
        assert_eq!(noop, vec![("denoise.algorithm".to_string(), "noop".to_string())]);
    }
}
