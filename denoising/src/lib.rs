//! GPU-accelerated denoising of multi-slice grayscale images.
//!
//! The pipeline has four parts:
//! - [`RuntimeBridge`]: process-wide compute runtime, started once
//! - [`ImageRange`]: which slices of a stack to process
//! - [`Denoiser`]: a per-slice transform, e.g. [`NonLocalMeansDenoiser`]
//! - [`DenoiseEngine`]: drives a denoiser over the selected slices
//!
//! ```rust,ignore
//! use denoising::*;
//!
//! RuntimeBridge::global().ensure_started(Backend::Auto, None, false)?;
//!
//! let image = ImageHandle::from(ImageStack::read_tiff("noisy.tif")?);
//! let range = ImageRange::current_slice(&image);
//! let denoiser = NonLocalMeansDenoiser::new(NonLocalMeansParams::new(1.5))?;
//!
//! let engine = DenoiseEngine::new(denoiser);
//! let denoised = engine.denoise(&image, &range, "noisy [denoised]")?;
//! ```

mod common;
mod denoiser;
mod engine;
mod gpu;
mod image;
mod processing_context;
mod range;
mod runtime;

pub mod prelude;

pub use prelude::*;
