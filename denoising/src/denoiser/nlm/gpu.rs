use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::pipeline::GpuNonLocalMeansPipeline;
use super::KernelParams;
use crate::common::{Error, Result};
use crate::processing_context::{GpuContext, ProcessingContext, NLM_KERNEL};

const WORKGROUP_SIZE: u32 = 16;

/// Must match `Params` in nlm.wgsl (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GpuParams {
    width: u32,
    height: u32,
    half_search: u32,
    half_block: u32,
    h: f32,
    sigma: f32,
    _padding: [u32; 2],
}

struct TileBuffers {
    input: wgpu::Buffer,
    output: wgpu::Buffer,
    staging: wgpu::Buffer,
    params: wgpu::Buffer,
}

impl TileBuffers {
    fn new(device: &wgpu::Device, values: &[f32], params: &GpuParams) -> Self {
        let size = std::mem::size_of_val(values) as u64;

        let input = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("nlm_input_buffer"),
            contents: bytemuck::cast_slice(values),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let output = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nlm_output_buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nlm_staging_buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("nlm_params_buffer"),
            contents: bytemuck::bytes_of(params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        Self {
            input,
            output,
            staging,
            params,
        }
    }
}

/// Runs the kernel on one tile. Every buffer created here is dropped before
/// returning, on success and on error.
pub(super) fn denoise(
    ctx: &ProcessingContext,
    gpu_ctx: &GpuContext,
    values: &[f32],
    width: u32,
    height: u32,
    params: &KernelParams,
) -> Result<Vec<f32>> {
    let pipeline = gpu_ctx.get_or_create(|gpu| {
        let source = ctx.kernel_source(&NLM_KERNEL)?;
        GpuNonLocalMeansPipeline::new(gpu, &source)
    })?;

    let gpu = gpu_ctx.gpu();
    let device = gpu.device();
    let queue = gpu.queue();

    let size = std::mem::size_of_val(values) as u64;
    check_buffer_size(
        size,
        device.limits().max_storage_buffer_binding_size as u64,
        width,
        height,
    )?;

    let gpu_params = GpuParams {
        width,
        height,
        half_search: params.half_search,
        half_block: params.half_block,
        h: params.h,
        sigma: params.sigma,
        _padding: [0; 2],
    };

    let (buffers, error) = gpu.with_error_scope(wgpu::ErrorFilter::OutOfMemory, |device| {
        TileBuffers::new(device, values, &gpu_params)
    });
    if let Some(error) = error {
        return Err(Error::DeviceMemory(format!(
            "allocating buffers for a {}x{} tile: {}",
            width, height, error
        )));
    }
    let TileBuffers {
        input: input_buffer,
        output: output_buffer,
        staging: staging_buffer,
        params: params_buffer,
    } = buffers;

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("nlm_bind_group"),
        layout: &pipeline.bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: input_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: output_buffer.as_entire_binding(),
            },
        ],
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("nlm_encoder"),
    });

    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("nlm_pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(
            width.div_ceil(WORKGROUP_SIZE),
            height.div_ceil(WORKGROUP_SIZE),
            1,
        );
    }

    encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, size);
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = staging_buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    gpu.wait()?;

    receiver
        .recv()
        .map_err(|_| Error::Gpu("readback callback was dropped".to_string()))?
        .map_err(|e| Error::Gpu(format!("failed to map NLM output: {}", e)))?;

    let data = buffer_slice.get_mapped_range();
    let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
    drop(data);
    staging_buffer.unmap();

    Ok(result)
}

/// Rejects tiles whose storage buffers exceed the device binding limit.
fn check_buffer_size(size: u64, limit: u64, width: u32, height: u32) -> Result<()> {
    if size > limit {
        return Err(Error::DeviceMemory(format!(
            "{}x{} tile needs a {} byte buffer, device allows {}",
            width, height, size, limit
        )));
    }
    Ok(())
}
