use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{Error, Result};

/// wgpu device and queue used for compute work.
#[derive(Debug, Clone)]
pub struct Gpu {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter_info: Arc<wgpu::AdapterInfo>,
    // Error scopes are one stack per device, shared by every thread.
    error_scope: Arc<Mutex<()>>,
}

impl Gpu {
    /// Creates a GPU context on the best adapter of any backend.
    pub fn new() -> Result<Self> {
        Self::with_backends(wgpu::Backends::all())
    }

    /// Creates a GPU context restricted to the given wgpu backends.
    pub fn with_backends(backends: wgpu::Backends) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| Error::Gpu(format!("failed to find suitable GPU adapter: {}", e)))?;

        let adapter_info = adapter.get_info();

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("denoise_device"),
            ..Default::default()
        }))
        .map_err(|e| Error::Gpu(format!("failed to create device: {}", e)))?;

        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            tracing::error!("Uncaptured GPU error: {}", error);
        }));

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_info: Arc::new(adapter_info),
            error_scope: Arc::new(Mutex::new(())),
        })
    }

    /// Runs `f` inside an error scope of `filter`, returning the error it raised.
    ///
    /// Only one scope is open on the device at a time, so an error is always
    /// reported to the caller whose commands raised it.
    pub fn with_error_scope<T>(
        &self,
        filter: wgpu::ErrorFilter,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> (T, Option<wgpu::Error>) {
        let _scope = self.error_scope.lock();
        self.device.push_error_scope(filter);
        let value = f(&self.device);
        let error = pollster::block_on(self.device.pop_error_scope());
        (value, error)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Adapter the device was created on.
    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.adapter_info
    }

    /// Blocks until all submitted work has finished and map callbacks have run.
    pub fn wait(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| Error::Gpu(format!("device poll failed: {}", e)))
    }
}
