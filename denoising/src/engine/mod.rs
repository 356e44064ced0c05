//! Drives a [`Denoiser`] over the selected slices of an image.

mod progress;
mod tiler;


pub use progress::{CancelToken, DenoiseProgress, ProgressCallback};

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use ::common::ScopeRef;

use crate::common::{Error, Result};
use crate::denoiser::{Denoiser, PARAM_PREFIX};
use crate::image::{ImageHandle, ImageStack, PixelBuffer, StackInfo};
use crate::processing_context::ProcessingContext;
use crate::range::ImageRange;
use crate::runtime::RuntimeBridge;
use progress::report_progress;

/// What happens to slices outside the range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlicePolicy {
    /// The output holds only the processed slices; its slice `i` is input
    /// slice `range.first() + i`.
    #[default]
    Omit,
    /// The output has every input slice; unselected ones are copied unchanged.
    PassThrough,
}

/// Runs one denoiser over image ranges.
///
/// The engine keeps no state between calls and can be shared between threads.
/// Each call holds the input's read lock from the first pixel read until the
/// output is assembled, so the host cannot edit or close the image meanwhile.
pub struct DenoiseEngine {
    denoiser: Arc<dyn Denoiser>,
    runtime: Arc<RuntimeBridge>,
    slice_policy: SlicePolicy,
    progress: ProgressCallback,
    cancel: Option<CancelToken>,
}

impl DenoiseEngine {
    /// Engine on the process-wide runtime.
    pub fn new(denoiser: impl Denoiser + 'static) -> Self {
        Self::from_arc(Arc::new(denoiser))
    }

    pub fn from_arc(denoiser: Arc<dyn Denoiser>) -> Self {
        Self {
            denoiser,
            runtime: RuntimeBridge::global(),
            slice_policy: SlicePolicy::default(),
            progress: ProgressCallback::default(),
            cancel: None,
        }
    }

    pub fn with_runtime(mut self, runtime: Arc<RuntimeBridge>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_slice_policy(mut self, slice_policy: SlicePolicy) -> Self {
        self.slice_policy = slice_policy;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn denoiser(&self) -> &dyn Denoiser {
        self.denoiser.as_ref()
    }

    pub fn slice_policy(&self) -> SlicePolicy {
        self.slice_policy
    }

    /// Denoises the slices of `image` selected by `range` into a new image
    /// titled `output_title`.
    ///
    /// All or nothing: any failure aborts the call and no output is returned.
    /// The output is not shown.
    pub fn denoise(
        &self,
        image: &ImageHandle,
        range: &ImageRange,
        output_title: &str,
    ) -> Result<ImageStack> {
        let runtime = self.runtime.context()?;
        let started = Instant::now();

        // Declared before the guard so it runs after the lock is released.
        let _finished = ScopeRef::new(|| {
            tracing::debug!(
                "Released input of '{}' after {:.2?}",
                output_title,
                started.elapsed()
            );
        });
        let input = image.read();

        let bit_depth = input.bit_depth();
        if bit_depth != 8 && bit_depth != 16 {
            return Err(Error::UnsupportedBitDepth(bit_depth));
        }
        range.validate_against(input.slice_count())?;
        self.denoiser.params().validate()?;

        let processed = self.denoise_slices(runtime.processing(), &input, range)?;
        let output = self.assemble(&input, range, processed, output_title)?;

        tracing::info!(
            "Denoised {} of '{}' into '{}' with {} ({}) in {:.2?}",
            range,
            input.title(),
            output_title,
            self.denoiser.name(),
            self.denoiser.params(),
            started.elapsed()
        );

        Ok(output)
    }

    fn denoise_slices(
        &self,
        ctx: &ProcessingContext,
        input: &ImageStack,
        range: &ImageRange,
    ) -> Result<Vec<PixelBuffer>> {
        let (width, height) = input.dimensions();
        let tiles = tiler::tiles(
            width,
            height,
            self.denoiser.tile_size(),
            self.denoiser.margin(),
        );
        let total_tiles = tiles.len() * range.len();

        let mut done = 0;
        let mut processed = Vec::with_capacity(range.len());
        for index in range {
            let slice = input.slice(index).ok_or(Error::InvalidRange {
                first: range.first(),
                last: range.last(),
                slice_count: input.slice_count(),
            })?;
            let mut output = PixelBuffer::zeroed(width, height, slice.bit_depth())?;
            let stats = self.denoiser.slice_stats(slice)?;

            for tile in &tiles {
                self.check_cancelled()?;

                let patch = slice.crop(tile.outer)?;
                let denoised = self.denoiser.denoise_tile(ctx, &patch, &stats)?;
                if denoised.dimensions() != patch.dimensions() {
                    return Err(Error::DimensionMismatch {
                        expected: patch.dimensions(),
                        actual: denoised.dimensions(),
                    });
                }
                output.insert(&denoised.crop(tile.core_in_outer())?, tile.core.x, tile.core.y)?;

                done += 1;
                report_progress(
                    &self.progress,
                    DenoiseProgress {
                        slice: index,
                        tile: done,
                        total_tiles,
                    },
                );
            }

            processed.push(output);
        }

        Ok(processed)
    }

    fn assemble(
        &self,
        input: &ImageStack,
        range: &ImageRange,
        processed: Vec<PixelBuffer>,
        output_title: &str,
    ) -> Result<ImageStack> {
        let (slices, current_slice) = match self.slice_policy {
            SlicePolicy::Omit => (processed, 0),
            SlicePolicy::PassThrough => {
                let mut slices = input.slices().to_vec();
                for (index, slice) in range.iter().zip(processed) {
                    slices[index] = slice;
                }
                (slices, input.current_slice())
            }
        };

        let mut output = ImageStack::new(output_title, slices)?;
        output.set_current_slice(current_slice)?;
        output.set_display_range(input.display_range());
        for (key, value) in input.properties() {
            output.set_property(key.clone(), value.clone());
        }
        for (key, value) in self.denoiser.properties() {
            output.set_property(key, value);
        }
        output.set_property(format!("{}range.first", PARAM_PREFIX), range.first().to_string());
        output.set_property(format!("{}range.last", PARAM_PREFIX), range.last().to_string());

        Ok(output)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for DenoiseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DenoiseEngine")
            .field("denoiser", &self.denoiser)
            .field("slice_policy", &self.slice_policy)
            .field("progress", &self.progress)
            .field("cancel", &self.cancel)
            .finish()
    }
}
