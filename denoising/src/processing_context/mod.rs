mod gpu_context;
mod kernels;

pub use gpu_context::{GpuContext, GpuPipeline};
pub use kernels::{Kernel, KernelSource, KERNELS, KERNELS_DIR, NLM_KERNEL};

use std::borrow::Cow;

use crate::common::Result;
use crate::gpu::Gpu;

/// Compute resources a denoiser runs against.
///
/// Holds the GPU (if any) with its pipeline cache, and tells pipelines where
/// to load kernel sources from. Without a GPU, denoisers use their CPU path.
#[derive(Debug)]
pub struct ProcessingContext {
    gpu_context: Option<GpuContext>,
    kernels: KernelSource,
}

impl ProcessingContext {
    /// Creates a CPU-only context.
    pub fn cpu_only() -> Self {
        Self {
            gpu_context: None,
            kernels: KernelSource::Embedded,
        }
    }

    /// Creates a context on the given GPU, using the embedded kernels.
    pub fn with_gpu(gpu: Gpu) -> Self {
        Self {
            gpu_context: Some(GpuContext::new(gpu)),
            kernels: KernelSource::Embedded,
        }
    }

    /// Replaces the location kernels are loaded from.
    pub fn with_kernels(mut self, kernels: KernelSource) -> Self {
        self.kernels = kernels;
        self
    }

    pub fn has_gpu(&self) -> bool {
        self.gpu_context.is_some()
    }

    pub fn gpu(&self) -> Option<&Gpu> {
        self.gpu_context.as_ref().map(|ctx| ctx.gpu())
    }

    pub fn gpu_context(&self) -> Option<&GpuContext> {
        self.gpu_context.as_ref()
    }

    pub fn kernels(&self) -> &KernelSource {
        &self.kernels
    }

    /// Loads the source of `kernel` from the configured location.
    pub fn kernel_source(&self, kernel: &Kernel) -> Result<Cow<'static, str>> {
        self.kernels.load(kernel)
    }
}
