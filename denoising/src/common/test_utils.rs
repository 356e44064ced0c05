use std::sync::{Arc, OnceLock};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::gpu::Gpu;
use crate::image::{ImageStack, PixelBuffer};
use crate::runtime::{Backend, RuntimeBridge};

/// Shared GPU for tests, `None` on machines without one.
pub(crate) fn test_gpu() -> Option<Gpu> {
    static GPU: OnceLock<Option<Gpu>> = OnceLock::new();
    GPU.get_or_init(|| match Gpu::new() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("GPU not available: {}", e);
            None
        }
    })
    .clone()
}

/// Flat mid-grey slice with additive gaussian noise of `sigma` (relative to
/// the full range), reproducible from `seed`.
pub(crate) fn noisy_slice(width: u32, height: u32, bit_depth: u32, sigma: f32, seed: u64) -> PixelBuffer {
    let mut rng = StdRng::seed_from_u64(seed);
    let values: Vec<f32> = (0..width * height)
        .map(|_| 0.5 + sigma * gaussian(&mut rng))
        .collect();
    PixelBuffer::from_normalized(bit_depth, width, height, &values).unwrap()
}

pub(crate) fn noisy_stack(
    title: &str,
    slices: usize,
    width: u32,
    height: u32,
    bit_depth: u32,
    seed: u64,
) -> ImageStack {
    let slices = (0..slices)
        .map(|i| noisy_slice(width, height, bit_depth, 0.08, seed + i as u64))
        .collect();
    ImageStack::new(title, slices).unwrap()
}

/// Private CPU runtime staged into a temporary folder.
pub(crate) fn cpu_runtime() -> (Arc<RuntimeBridge>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let bridge = Arc::new(RuntimeBridge::new());
    bridge
        .ensure_started(Backend::Cpu, Some(dir.path()), false)
        .unwrap();
    (bridge, dir)
}

fn gaussian(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.random::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}
