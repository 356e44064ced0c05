//! Non-Local Means denoising.
//!
//! Each output pixel is the weighted mean of the pixels in a search window
//! around it. A candidate's weight decays with the mean squared difference
//! between the patch around it and the patch around the output pixel:
//!
//! ```text
//! w = exp(-max(d² - 2σ², 0) / (h²σ²))
//! ```
//!
//! `σ` is estimated from the input, so `h` is relative to the noise level:
//! larger `h` smooths harder and loses more fine detail.

mod cpu;
mod gpu;
mod pipeline;

pub use pipeline::GpuNonLocalMeansPipeline;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::denoiser::{estimate_noise, DenoiseParams, Denoiser, SliceStats};
use crate::image::PixelBuffer;
use crate::processing_context::ProcessingContext;

const MAX_HALF_SEARCH_SIZE: u32 = 20;
const MAX_HALF_BLOCK_SIZE: u32 = 10;

/// Non-Local Means settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonLocalMeansParams {
    /// Filtering strength relative to the estimated noise. Must be > 0.
    pub h: f64,
    /// Search window radius in pixels.
    pub half_search_size: u32,
    /// Patch radius in pixels.
    pub half_block_size: u32,
}

impl Default for NonLocalMeansParams {
    fn default() -> Self {
        Self {
            h: 2.0,
            half_search_size: 5,
            half_block_size: 4,
        }
    }
}

impl NonLocalMeansParams {
    pub fn new(h: f64) -> Self {
        Self {
            h,
            ..Default::default()
        }
    }

    pub fn with_half_search_size(mut self, half_search_size: u32) -> Self {
        self.half_search_size = half_search_size;
        self
    }

    pub fn with_half_block_size(mut self, half_block_size: u32) -> Self {
        self.half_block_size = half_block_size;
        self
    }
}

impl fmt::Display for NonLocalMeansParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "h={}, half_search_size={}, half_block_size={}",
            self.h, self.half_search_size, self.half_block_size
        )
    }
}

impl DenoiseParams for NonLocalMeansParams {
    fn algorithm(&self) -> &'static str {
        "nonlocalmeans"
    }

    fn parameter_list(&self) -> Vec<(String, String)> {
        vec![
            ("h".to_string(), self.h.to_string()),
            ("half_search_size".to_string(), self.half_search_size.to_string()),
            ("half_block_size".to_string(), self.half_block_size.to_string()),
        ]
    }

    fn validate(&self) -> Result<()> {
        if !self.h.is_finite() || self.h <= 0.0 {
            return Err(Error::invalid_param("h", self.h, "must be a finite value > 0"));
        }
        if !(1..=MAX_HALF_SEARCH_SIZE).contains(&self.half_search_size) {
            return Err(Error::invalid_param(
                "half_search_size",
                self.half_search_size,
                format!("must be in 1..={}", MAX_HALF_SEARCH_SIZE),
            ));
        }
        if !(1..=MAX_HALF_BLOCK_SIZE).contains(&self.half_block_size) {
            return Err(Error::invalid_param(
                "half_block_size",
                self.half_block_size,
                format!("must be in 1..={}", MAX_HALF_BLOCK_SIZE),
            ));
        }
        Ok(())
    }
}

/// Values shared by the CPU and GPU kernels.
#[derive(Debug, Clone, Copy)]
struct KernelParams {
    half_search: u32,
    half_block: u32,
    h: f32,
    sigma: f32,
}

/// Non-Local Means on the GPU when the context has one, on the CPU otherwise.
#[derive(Debug, Clone)]
pub struct NonLocalMeansDenoiser {
    params: NonLocalMeansParams,
}

impl NonLocalMeansDenoiser {
    /// Binds validated parameters.
    pub fn new(params: NonLocalMeansParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }
}

impl Denoiser for NonLocalMeansDenoiser {
    fn name(&self) -> &str {
        "Non-Local Means"
    }

    fn params(&self) -> &dyn DenoiseParams {
        &self.params
    }

    fn margin(&self) -> u32 {
        self.params.half_search_size + self.params.half_block_size
    }

    fn denoise(&self, ctx: &ProcessingContext, input: &PixelBuffer) -> Result<PixelBuffer> {
        let stats = self.slice_stats(input)?;
        self.denoise_tile(ctx, input, &stats)
    }

    fn slice_stats(&self, slice: &PixelBuffer) -> Result<SliceStats> {
        check_bit_depth(slice)?;
        let (width, height) = slice.dimensions();
        let sigma = estimate_noise(&slice.to_normalized(), width as usize, height as usize);
        Ok(SliceStats {
            noise_sigma: Some(sigma),
        })
    }

    fn denoise_tile(
        &self,
        ctx: &ProcessingContext,
        tile: &PixelBuffer,
        stats: &SliceStats,
    ) -> Result<PixelBuffer> {
        self.params.validate()?;
        let bit_depth = check_bit_depth(tile)?;

        let (width, height) = tile.dimensions();
        let values = tile.to_normalized();
        let sigma = stats
            .noise_sigma
            .unwrap_or_else(|| estimate_noise(&values, width as usize, height as usize));
        let kernel = KernelParams {
            half_search: self.params.half_search_size,
            half_block: self.params.half_block_size,
            h: self.params.h as f32,
            sigma,
        };

        let output = match ctx.gpu_context() {
            Some(gpu_ctx) => gpu::denoise(ctx, gpu_ctx, &values, width, height, &kernel)?,
            None => cpu::denoise(&values, width as usize, height as usize, &kernel),
        };

        tracing::trace!(
            "NLM {}x{} tile, sigma {:.5}, {}",
            width,
            height,
            sigma,
            if ctx.has_gpu() { "gpu" } else { "cpu" }
        );

        PixelBuffer::from_normalized(bit_depth, width, height, &output)
    }
}

fn check_bit_depth(buffer: &PixelBuffer) -> Result<u32> {
    match buffer.bit_depth() {
        bit_depth @ (8 | 16) => Ok(bit_depth),
        other => Err(Error::UnsupportedBitDepth(other)),
    }
}
