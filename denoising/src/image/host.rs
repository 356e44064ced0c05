use std::path::{Path, PathBuf};

use crate::common::Result;
use crate::image::{ImageHandle, ImageStack};

/// The application the images belong to.
pub trait ImageHost: Send + Sync {
    fn open_image(&self, path: &Path) -> Result<ImageHandle>;

    /// Presents an image to the user. Never called by the engine itself.
    fn show(&self, image: &ImageHandle) -> Result<()>;
}

/// Headless host: opens TIFF stacks and "shows" images by saving them as
/// `<title>.tif` in its output folder.
#[derive(Debug, Clone)]
pub struct TiffHost {
    output_dir: PathBuf,
}

impl TiffHost {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// File an image with `title` is shown as.
    pub fn output_path(&self, title: &str) -> PathBuf {
        self.output_dir.join(format!("{}.tif", file_stem(title)))
    }
}

impl ImageHost for TiffHost {
    fn open_image(&self, path: &Path) -> Result<ImageHandle> {
        let stack = ImageStack::read_tiff(path)?;
        tracing::info!(
            "Opened '{}' ({} slice(s), {}-bit)",
            stack.title(),
            stack.slices().len(),
            stack.bit_depth()
        );
        Ok(ImageHandle::from(stack))
    }

    fn show(&self, image: &ImageHandle) -> Result<()> {
        let stack = image.read();
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_path(stack.title());
        stack.save_tiff(&path)?;
        tracing::info!("Showing '{}' as {}", stack.title(), path.display());
        Ok(())
    }
}

fn file_stem(title: &str) -> String {
    let title = title.trim();
    let title = title
        .strip_suffix(".tiff")
        .or_else(|| title.strip_suffix(".tif"))
        .unwrap_or(title);

    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.trim().is_empty() {
        "untitled".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::PixelBuffer;

    #[test]
    fn titles_become_safe_file_names() {
        let host = TiffHost::new("out");
        assert_eq!(host.output_path("cells [NLM]"), Path::new("out/cells _NLM_.tif"));
        assert_eq!(host.output_path("a/b.tif"), Path::new("out/a_b.tif"));
        assert_eq!(host.output_path("  "), Path::new("out/untitled.tif"));
    }

    #[test]
    fn show_then_open_returns_the_image() {
        let dir = tempfile::tempdir().unwrap();
        let host = TiffHost::new(dir.path().join("shown"));

        let slice = PixelBuffer::new_u8(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let image = ImageHandle::from(ImageStack::new("result", vec![slice.clone()]).unwrap());
        host.show(&image).unwrap();

        let reopened = host.open_image(&host.output_path("result")).unwrap();
        let reopened = reopened.read();
        assert_eq!(reopened.title(), "result");
        assert_eq!(reopened.slice(0), Some(&slice));
    }
}
