use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::common::{Error, Result};

/// Environment variable consulted by [`Backend::from_env`].
pub const BACKEND_ENV: &str = "DENOISE_BACKEND";

/// Compute backend the runtime is started on.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// No GPU, denoisers run their CPU kernels.
    Cpu,
    /// Best GPU adapter on any backend.
    #[default]
    Auto,
    Vulkan,
    Metal,
    Dx12,
    Gl,
}

impl Backend {
    /// wgpu backends to request an adapter from. `None` for [`Backend::Cpu`].
    pub fn wgpu_backends(self) -> Option<wgpu::Backends> {
        match self {
            Backend::Cpu => None,
            Backend::Auto => Some(wgpu::Backends::all()),
            Backend::Vulkan => Some(wgpu::Backends::VULKAN),
            Backend::Metal => Some(wgpu::Backends::METAL),
            Backend::Dx12 => Some(wgpu::Backends::DX12),
            Backend::Gl => Some(wgpu::Backends::GL),
        }
    }

    /// Reads the preferred backend from `DENOISE_BACKEND`, [`Backend::Auto`] if unset.
    pub fn from_env() -> Result<Self> {
        match std::env::var(BACKEND_ENV) {
            Ok(value) => value.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{}='{}' is not a backend, expected one of cpu, auto, vulkan, metal, dx12, gl",
                    BACKEND_ENV, value
                ))
            }),
            Err(_) => Ok(Backend::Auto),
        }
    }
}
