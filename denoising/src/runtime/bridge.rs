use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::common::{Error, Result};
use crate::gpu::Gpu;
use crate::processing_context::{KernelSource, ProcessingContext};
use crate::runtime::staging::{default_staging_dir, stage_kernels};
use crate::runtime::{Backend, RuntimeConfig};

static GLOBAL: OnceLock<Arc<RuntimeBridge>> = OnceLock::new();

/// A started compute runtime.
#[derive(Debug)]
pub struct RuntimeContext {
    backend: Backend,
    bridge_path: PathBuf,
    adapter_name: Option<String>,
    processing: ProcessingContext,
}

impl RuntimeContext {
    /// Backend that was started. [`Backend::Auto`] stays `Auto`, see
    /// [`adapter_name`](Self::adapter_name) for the adapter it resolved to.
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Staging folder the native assets were written to.
    pub fn bridge_path(&self) -> &Path {
        &self.bridge_path
    }

    pub fn adapter_name(&self) -> Option<&str> {
        self.adapter_name.as_deref()
    }

    pub fn processing(&self) -> &ProcessingContext {
        &self.processing
    }
}

#[derive(Debug, Default)]
pub(super) struct BridgeState {
    running: Option<Arc<RuntimeContext>>,
    pub(super) failed: HashMap<Backend, String>,
}

/// Starts the compute runtime once and shares it.
///
/// Starting happens under a lock: concurrent callers block until the first
/// one finishes and then observe its context. Once a backend fails to start,
/// later requests for it fail immediately with the recorded reason.
#[derive(Debug, Default)]
pub struct RuntimeBridge {
    pub(super) state: Mutex<BridgeState>,
    starts: AtomicUsize,
}

impl RuntimeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide bridge.
    pub fn global() -> Arc<RuntimeBridge> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(RuntimeBridge::new())))
    }

    /// Starts the runtime on `backend` unless it is already running.
    ///
    /// Calling again with the same backend returns the running context.
    /// Requesting a different backend while one is running fails with
    /// [`Error::BackendConflict`]; call [`shutdown`](Self::shutdown) first.
    pub fn ensure_started(
        &self,
        backend: Backend,
        staging_dir: Option<&Path>,
        verbose: bool,
    ) -> Result<Arc<RuntimeContext>> {
        let mut config = RuntimeConfig::new(backend).with_verbose(verbose);
        config.staging_dir = staging_dir.map(Path::to_path_buf);
        self.start(&config)
    }

    /// Like [`ensure_started`](Self::ensure_started), with an optional fallback backend.
    pub fn start(&self, config: &RuntimeConfig) -> Result<Arc<RuntimeContext>> {
        let mut state = self.state.lock();

        if let Some(running) = &state.running {
            if config.accepts(running.backend) {
                return Ok(Arc::clone(running));
            }
            return Err(Error::BackendConflict {
                running: running.backend,
                requested: config.backend,
            });
        }

        let root = config
            .staging_dir
            .clone()
            .unwrap_or_else(default_staging_dir);
        let (kernels_dir, written) = stage_kernels(&root)?;
        tracing::debug!(
            "Staged {} kernel file(s) into {}",
            written,
            kernels_dir.display()
        );

        let candidates = std::iter::once(config.backend)
            .chain(config.fallback.filter(|&fallback| fallback != config.backend));

        let mut first_error = None;
        for backend in candidates {
            let known_failure = state.failed.get(&backend).cloned();
            let attempt = match known_failure {
                Some(reason) => Err(reason),
                None => {
                    let attempt = start_backend(backend, &root, &kernels_dir);
                    if let Err(reason) = &attempt {
                        tracing::warn!("Failed to start '{}' runtime: {}", backend, reason);
                        state.failed.insert(backend, reason.clone());
                    }
                    attempt
                }
            };

            match attempt {
                Ok(context) => {
                    report_started(&context, config.verbose);
                    let context = Arc::new(context);
                    state.running = Some(Arc::clone(&context));
                    self.starts.fetch_add(1, Ordering::SeqCst);
                    return Ok(context);
                }
                Err(reason) => {
                    first_error.get_or_insert(Error::RuntimeUnavailable { backend, reason });
                }
            }
        }

        Err(first_error.unwrap_or(Error::RuntimeNotStarted))
    }

    /// The running context, or [`Error::RuntimeNotStarted`].
    pub fn context(&self) -> Result<Arc<RuntimeContext>> {
        self.state
            .lock()
            .running
            .clone()
            .ok_or(Error::RuntimeNotStarted)
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().running.is_some()
    }

    /// Number of runtime starts that actually happened.
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    /// Drops the bridge's reference to the running context.
    ///
    /// Calls already holding the context finish on it. Returns whether a
    /// runtime was running.
    pub fn shutdown(&self) -> bool {
        let stopped = self.state.lock().running.take();
        if let Some(context) = &stopped {
            tracing::info!("Runtime '{}' shut down", context.backend);
        }
        stopped.is_some()
    }
}

fn start_backend(
    backend: Backend,
    root: &Path,
    kernels_dir: &Path,
) -> std::result::Result<RuntimeContext, String> {
    let kernels = KernelSource::Staged(kernels_dir.to_path_buf());

    let (processing, adapter_name) = match backend.wgpu_backends() {
        None => (ProcessingContext::cpu_only().with_kernels(kernels), None),
        Some(backends) => {
            let gpu = Gpu::with_backends(backends).map_err(|e| e.to_string())?;
            let info = gpu.adapter_info();
            let adapter_name = format!("{} ({:?})", info.name, info.backend);
            (
                ProcessingContext::with_gpu(gpu).with_kernels(kernels),
                Some(adapter_name),
            )
        }
    };

    Ok(RuntimeContext {
        backend,
        bridge_path: root.to_path_buf(),
        adapter_name,
        processing,
    })
}

fn report_started(context: &RuntimeContext, verbose: bool) {
    let adapter = context.adapter_name().unwrap_or("none");
    let staging = context.bridge_path.display();
    if verbose {
        tracing::info!(
            "Runtime started: backend '{}', adapter {}, staging {}",
            context.backend,
            adapter,
            staging
        );
    } else {
        tracing::debug!(
            "Runtime started: backend '{}', adapter {}, staging {}",
            context.backend,
            adapter,
            staging
        );
    }
}
