use crate::common::{Error, Result};
use crate::gpu::Gpu;
use crate::processing_context::GpuPipeline;

/// Compiled Non-Local Means compute pipeline, cached per GPU context.
#[derive(Debug)]
pub struct GpuNonLocalMeansPipeline {
    pub(super) pipeline: wgpu::ComputePipeline,
    pub(super) bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuNonLocalMeansPipeline {
    /// Compiles `source`, reporting shader errors instead of panicking.
    pub fn new(gpu: &Gpu, source: &str) -> Result<Self> {
        let (pipeline, error) =
            gpu.with_error_scope(wgpu::ErrorFilter::Validation, |device| build(device, source));

        if let Some(error) = error {
            return Err(Error::Gpu(format!("failed to build NLM pipeline: {}", error)));
        }

        Ok(pipeline)
    }
}

impl GpuPipeline for GpuNonLocalMeansPipeline {}

fn build(device: &wgpu::Device, source: &str) -> GpuNonLocalMeansPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("nlm_shader"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("nlm_bind_group_layout"),
        entries: &[
            // Params
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Input tile
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // Output tile
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: false },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("nlm_pipeline_layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("nlm_pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    GpuNonLocalMeansPipeline {
        pipeline,
        bind_group_layout,
    }
}
