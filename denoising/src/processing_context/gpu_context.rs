use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::common::{Error, Result};
use crate::gpu::Gpu;

/// Marker for GPU pipelines that can be cached in a [`GpuContext`].
pub trait GpuPipeline: Any + fmt::Debug + Send + Sync {}

/// GPU plus a cache of compiled pipelines, keyed by pipeline type.
///
/// Pipelines are built on first use and shared by every caller afterwards,
/// including concurrent denoise calls.
pub struct GpuContext {
    gpu: Gpu,
    pipelines: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl GpuContext {
    pub fn new(gpu: Gpu) -> Self {
        Self {
            gpu,
            pipelines: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the pipeline of type `T`, creating it with `create` if needed.
    pub fn get_or_create<T, F>(&self, create: F) -> Result<Arc<T>>
    where
        T: GpuPipeline,
        F: FnOnce(&Gpu) -> Result<T>,
    {
        let type_id = TypeId::of::<T>();
        let mut pipelines = self.pipelines.lock();

        let pipeline = match pipelines.get(&type_id).cloned() {
            Some(pipeline) => pipeline,
            None => {
                let pipeline: Arc<dyn Any + Send + Sync> = Arc::new(create(&self.gpu)?);
                pipelines.insert(type_id, Arc::clone(&pipeline));
                pipeline
            }
        };

        pipeline
            .downcast::<T>()
            .map_err(|_| Error::Gpu("pipeline cache type mismatch".to_string()))
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.lock().len()
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }
}

impl fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuContext")
            .field("gpu", &self.gpu)
            .field("pipelines", &self.pipeline_count())
            .finish()
    }
}
