use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ::common::SharedFn;

/// Reported after every denoised tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenoiseProgress {
    /// Slice index in the input image.
    pub slice: usize,
    /// Tiles finished so far, over all slices of the call.
    pub tile: usize,
    pub total_tiles: usize,
}

impl DenoiseProgress {
    pub fn percent(&self) -> f32 {
        if self.total_tiles == 0 {
            return 100.0;
        }
        self.tile as f32 * 100.0 / self.total_tiles as f32
    }
}

pub type ProgressCallback = SharedFn<dyn Fn(DenoiseProgress) + Send + Sync>;

pub(super) fn report_progress(callback: &ProgressCallback, progress: DenoiseProgress) {
    tracing::debug!(
        "Slice {}: tile {}/{} ({:.0}%)",
        progress.slice,
        progress.tile,
        progress.total_tiles,
        progress.percent()
    );
    if let Some(f) = callback.get() {
        f(progress);
    }
}

/// Cooperative cancellation flag, checked by the engine between tiles.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_total() {
        let progress = DenoiseProgress {
            slice: 0,
            tile: 1,
            total_tiles: 4,
        };
        assert_eq!(progress.percent(), 25.0);
    }

    #[test]
    fn clones_share_cancellation() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
