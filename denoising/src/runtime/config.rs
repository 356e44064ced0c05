use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::runtime::Backend;

/// How the runtime should be started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub backend: Backend,
    /// Tried only when `backend` fails to start.
    pub fallback: Option<Backend>,
    /// Overrides the folder kernels are staged into.
    pub staging_dir: Option<PathBuf>,
    /// Promotes runtime diagnostics from `debug` to `info`.
    pub verbose: bool,
}

impl RuntimeConfig {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            ..Default::default()
        }
    }

    pub fn with_fallback(mut self, fallback: Backend) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Whether a runtime running on `backend` satisfies this config.
    pub(crate) fn accepts(&self, backend: Backend) -> bool {
        self.backend == backend || self.fallback == Some(backend)
    }
}
