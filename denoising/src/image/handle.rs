use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::image::{ImageStack, StackInfo};

/// Shared handle to an image owned by the host.
///
/// Readers (the denoise engine) take the read lock for as long as they use
/// the pixels; host edits and closing need the write lock and wait for them.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    inner: Arc<RwLock<ImageStack>>,
}

impl ImageHandle {
    pub fn new(stack: ImageStack) -> Self {
        Self {
            inner: Arc::new(RwLock::new(stack)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ImageStack> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ImageStack> {
        self.inner.write()
    }

    /// Write access if nobody is reading the image right now.
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, ImageStack>> {
        self.inner.try_write()
    }

    pub fn title(&self) -> String {
        self.read().title().to_string()
    }

    pub fn bit_depth(&self) -> u32 {
        self.read().bit_depth()
    }

    pub fn ptr_eq(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Takes the stack back if this is the last handle.
    pub fn into_inner(self) -> Result<ImageStack, ImageHandle> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| ImageHandle { inner })
    }
}

impl From<ImageStack> for ImageHandle {
    fn from(stack: ImageStack) -> Self {
        Self::new(stack)
    }
}

impl StackInfo for ImageHandle {
    fn slice_count(&self) -> usize {
        self.read().slice_count()
    }

    fn current_slice(&self) -> usize {
        self.read().current_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelBuffer;

    #[test]
    fn readers_block_writers() {
        let stack = ImageStack::new("probe", vec![PixelBuffer::zeroed(2, 2, 8).unwrap()]).unwrap();
        let handle = ImageHandle::from(stack);
        let other = handle.clone();

        {
            let _reading = handle.read();
            assert!(other.try_write().is_none());
        }
        assert!(other.try_write().is_some());
        assert!(handle.ptr_eq(&other));
        assert_eq!(handle.title(), "probe");
        assert_eq!(handle.bit_depth(), 8);
        assert_eq!(handle.slice_count(), 1);

        let handle = handle.into_inner().unwrap_err();
        drop(other);
        assert_eq!(handle.into_inner().unwrap().title(), "probe");
    }
}
