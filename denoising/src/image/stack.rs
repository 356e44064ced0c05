use std::collections::BTreeMap;
use std::path::Path;

use crate::common::{Error, Result};
use crate::image::{PixelBuffer, StackInfo};

/// A titled stack of equally sized grayscale slices.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStack {
    title: String,
    slices: Vec<PixelBuffer>,
    current_slice: usize,
    display_range: Option<(f64, f64)>,
    properties: BTreeMap<String, String>,
}

impl ImageStack {
    /// Builds a stack; all slices must share dimensions and bit depth.
    pub fn new(title: impl Into<String>, slices: Vec<PixelBuffer>) -> Result<Self> {
        let Some(first) = slices.first() else {
            return Err(Error::InvalidImage("an image needs at least one slice".to_string()));
        };

        let dimensions = first.dimensions();
        let bit_depth = first.bit_depth();
        for (index, slice) in slices.iter().enumerate().skip(1) {
            if slice.dimensions() != dimensions {
                return Err(Error::DimensionMismatch {
                    expected: dimensions,
                    actual: slice.dimensions(),
                });
            }
            if slice.bit_depth() != bit_depth {
                return Err(Error::InvalidImage(format!(
                    "slice {} is {}-bit, expected {}-bit",
                    index,
                    slice.bit_depth(),
                    bit_depth
                )));
            }
        }

        Ok(Self {
            title: title.into(),
            slices,
            current_slice: 0,
            display_range: None,
            properties: BTreeMap::new(),
        })
    }

    /// Reads a multi-page grayscale TIFF; the title is the file stem.
    pub fn read_tiff(path: impl AsRef<Path>) -> Result<Self> {
        super::tiff::read_stack(path.as_ref())
    }

    /// Writes every slice as one TIFF page.
    pub fn save_tiff(&self, path: impl AsRef<Path>) -> Result<()> {
        super::tiff::write_stack(self, path.as_ref())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> u32 {
        self.slices[0].width()
    }

    pub fn height(&self) -> u32 {
        self.slices[0].height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.slices[0].dimensions()
    }

    pub fn bit_depth(&self) -> u32 {
        self.slices[0].bit_depth()
    }

    pub fn slice(&self, index: usize) -> Option<&PixelBuffer> {
        self.slices.get(index)
    }

    pub fn slices(&self) -> &[PixelBuffer] {
        &self.slices
    }

    /// Replaces slice `index`; the replacement must keep the stack layout.
    pub fn set_slice(&mut self, index: usize, slice: PixelBuffer) -> Result<()> {
        let slice_count = self.slices.len();
        if index >= slice_count {
            return Err(Error::InvalidRange {
                first: index,
                last: index,
                slice_count,
            });
        }
        if slice.dimensions() != self.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: slice.dimensions(),
            });
        }
        if slice.bit_depth() != self.bit_depth() {
            return Err(Error::UnsupportedBitDepth(slice.bit_depth()));
        }
        self.slices[index] = slice;
        Ok(())
    }

    pub fn set_current_slice(&mut self, index: usize) -> Result<()> {
        if index >= self.slices.len() {
            return Err(Error::InvalidRange {
                first: index,
                last: index,
                slice_count: self.slices.len(),
            });
        }
        self.current_slice = index;
        Ok(())
    }

    /// Min/max mapped to black/white when the image is displayed.
    pub fn display_range(&self) -> Option<(f64, f64)> {
        self.display_range
    }

    pub fn set_display_range(&mut self, range: Option<(f64, f64)>) {
        self.display_range = range;
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }
}

impl StackInfo for ImageStack {
    fn slice_count(&self) -> usize {
        self.slices.len()
    }

    fn current_slice(&self) -> usize {
        self.current_slice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slices(count: usize, width: u32, height: u32) -> Vec<PixelBuffer> {
        (0..count)
            .map(|i| PixelBuffer::new_u8(width, height, vec![i as u8; (width * height) as usize]).unwrap())
            .collect()
    }

    #[test]
    fn new_validates_layout() {
        assert!(ImageStack::new("empty", vec![]).is_err());

        let mut mixed = slices(2, 4, 4);
        mixed.push(PixelBuffer::zeroed(4, 3, 8).unwrap());
        assert!(matches!(
            ImageStack::new("mixed", mixed),
            Err(Error::DimensionMismatch {
                expected: (4, 4),
                actual: (4, 3)
            })
        ));

        let mut depths = slices(1, 4, 4);
        depths.push(PixelBuffer::zeroed(4, 4, 16).unwrap());
        assert!(ImageStack::new("depths", depths).is_err());
    }

    #[test]
    fn current_slice_is_bounded() {
        let mut stack = ImageStack::new("stack", slices(3, 2, 2)).unwrap();
        assert_eq!(stack.current_slice(), 0);
        stack.set_current_slice(2).unwrap();
        assert_eq!(stack.current_slice(), 2);
        assert!(stack.set_current_slice(3).is_err());
        assert_eq!(stack.slice_count(), 3);
    }

    #[test]
    fn set_slice_keeps_layout() {
        let mut stack = ImageStack::new("stack", slices(2, 2, 2)).unwrap();
        stack
            .set_slice(1, PixelBuffer::new_u8(2, 2, vec![9; 4]).unwrap())
            .unwrap();
        assert_eq!(stack.slice(1).unwrap().get(1, 1), 9.0);

        assert!(stack.set_slice(2, PixelBuffer::zeroed(2, 2, 8).unwrap()).is_err());
        assert!(stack.set_slice(0, PixelBuffer::zeroed(3, 2, 8).unwrap()).is_err());
        assert!(stack.set_slice(0, PixelBuffer::zeroed(2, 2, 16).unwrap()).is_err());
    }
}
