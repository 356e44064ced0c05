// Error handling
pub use crate::common::{Error, Result};

// Runtime
pub use crate::runtime::{default_staging_dir, Backend, RuntimeBridge, RuntimeConfig, RuntimeContext, BACKEND_ENV};

// Images
pub use crate::image::{
    ImageHandle, ImageHost, ImageStack, PixelBuffer, Rect, Samples, StackInfo, TiffHost,
};
pub use crate::range::{ImageRange, RangeKind};

// Denoisers
pub use crate::denoiser::{
    estimate_noise, DenoiseParams, Denoiser, GpuNonLocalMeansPipeline, NoOpDenoiser, NoOpParams,
    NonLocalMeansDenoiser, NonLocalMeansParams, SliceStats, PARAM_PREFIX,
};

// Engine
pub use crate::engine::{CancelToken, DenoiseEngine, DenoiseProgress, ProgressCallback, SlicePolicy};

// Context and GPU
pub use crate::gpu::Gpu;
pub use crate::processing_context::{
    GpuContext, GpuPipeline, Kernel, KernelSource, ProcessingContext, KERNELS, NLM_KERNEL,
};
