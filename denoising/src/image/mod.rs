//! In-memory image stacks and the host-side collaborator that opens and
//! shows them.

mod handle;
mod host;
mod pixel_buffer;
mod stack;
mod tiff;

pub use handle::ImageHandle;
pub use host::{ImageHost, TiffHost};
pub use pixel_buffer::{PixelBuffer, Rect, Samples};
pub use stack::ImageStack;

/// Slice layout of something a range can be built from.
pub trait StackInfo {
    fn slice_count(&self) -> usize;
    fn current_slice(&self) -> usize;
}
