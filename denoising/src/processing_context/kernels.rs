use std::borrow::Cow;
use std::path::PathBuf;

use crate::common::{Error, Result};

/// A compute kernel shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    pub name: &'static str,
    pub file_name: &'static str,
    pub source: &'static str,
}

pub const NLM_KERNEL: Kernel = Kernel {
    name: "nlm",
    file_name: "nlm.wgsl",
    source: include_str!("../denoiser/nlm/nlm.wgsl"),
};

/// Folder under the staging root that kernels are written to.
pub const KERNELS_DIR: &str = "kernels";

/// Every kernel that gets staged when the runtime starts.
pub const KERNELS: &[Kernel] = &[NLM_KERNEL];

/// Where kernel sources are read from when pipelines are compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelSource {
    /// Sources compiled into the binary.
    Embedded,
    /// Sources staged into a folder on disk.
    Staged(PathBuf),
}

impl KernelSource {
    pub fn load(&self, kernel: &Kernel) -> Result<Cow<'static, str>> {
        match self {
            KernelSource::Embedded => Ok(Cow::Borrowed(kernel.source)),
            KernelSource::Staged(dir) => {
                let path = dir.join(kernel.file_name);
                let source = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Gpu(format!(
                        "failed to load kernel '{}' from {}: {}",
                        kernel.name,
                        path.display(),
                        e
                    ))
                })?;
                Ok(Cow::Owned(source))
            }
        }
    }
}
