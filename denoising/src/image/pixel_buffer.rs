use crate::common::{Error, Result};

/// Sample storage of one slice, row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl Samples {
    pub fn bit_depth(&self) -> u32 {
        match self {
            Samples::U8(_) => 8,
            Samples::U16(_) => 16,
            Samples::F32(_) => 32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::U8(v) => v.len(),
            Samples::U16(v) => v.len(),
            Samples::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn zeroed(bit_depth: u32, len: usize) -> Result<Self> {
        match bit_depth {
            8 => Ok(Samples::U8(vec![0; len])),
            16 => Ok(Samples::U16(vec![0; len])),
            32 => Ok(Samples::F32(vec![0.0; len])),
            other => Err(Error::UnsupportedBitDepth(other)),
        }
    }
}

/// Axis-aligned region of a slice, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// One grayscale slice.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    samples: Samples,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, samples: Samples) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage(format!(
                "slice dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(Error::InvalidImage(format!(
                "{}x{} slice needs {} samples, got {}",
                width,
                height,
                expected,
                samples.len()
            )));
        }

        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn new_u8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::new(width, height, Samples::U8(data))
    }

    pub fn new_u16(width: u32, height: u32, data: Vec<u16>) -> Result<Self> {
        Self::new(width, height, Samples::U16(data))
    }

    pub fn new_f32(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        Self::new(width, height, Samples::F32(data))
    }

    pub fn zeroed(width: u32, height: u32, bit_depth: u32) -> Result<Self> {
        let samples = Samples::zeroed(bit_depth, width as usize * height as usize)?;
        Self::new(width, height, samples)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bit_depth(&self) -> u32 {
        self.samples.bit_depth()
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw sample value at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> f64 {
        let i = y as usize * self.width as usize + x as usize;
        match &self.samples {
            Samples::U8(v) => v[i] as f64,
            Samples::U16(v) => v[i] as f64,
            Samples::F32(v) => v[i] as f64,
        }
    }

    /// Samples scaled to `[0, 1]` by the bit range. Float samples are copied as is.
    pub fn to_normalized(&self) -> Vec<f32> {
        match &self.samples {
            Samples::U8(v) => v.iter().map(|&s| s as f32 / u8::MAX as f32).collect(),
            Samples::U16(v) => v.iter().map(|&s| s as f32 / u16::MAX as f32).collect(),
            Samples::F32(v) => v.clone(),
        }
    }

    /// Inverse of [`to_normalized`](Self::to_normalized): scales, rounds and clamps.
    pub fn from_normalized(bit_depth: u32, width: u32, height: u32, values: &[f32]) -> Result<Self> {
        let samples = match bit_depth {
            8 => Samples::U8(values.iter().map(|&v| quantize(v, u8::MAX as f32) as u8).collect()),
            16 => Samples::U16(
                values
                    .iter()
                    .map(|&v| quantize(v, u16::MAX as f32) as u16)
                    .collect(),
            ),
            32 => Samples::F32(values.to_vec()),
            other => return Err(Error::UnsupportedBitDepth(other)),
        };
        Self::new(width, height, samples)
    }

    /// Copies `rect` out into a new buffer.
    pub fn crop(&self, rect: Rect) -> Result<PixelBuffer> {
        self.check_bounds(rect)?;
        let samples = match &self.samples {
            Samples::U8(v) => Samples::U8(crop_rows(v, self.width, rect)),
            Samples::U16(v) => Samples::U16(crop_rows(v, self.width, rect)),
            Samples::F32(v) => Samples::F32(crop_rows(v, self.width, rect)),
        };
        PixelBuffer::new(rect.width, rect.height, samples)
    }

    /// Writes `tile` into this buffer with its top-left corner at `(x, y)`.
    pub fn insert(&mut self, tile: &PixelBuffer, x: u32, y: u32) -> Result<()> {
        let rect = Rect::new(x, y, tile.width, tile.height);
        self.check_bounds(rect)?;
        let width = self.width;
        match (&mut self.samples, &tile.samples) {
            (Samples::U8(dst), Samples::U8(src)) => insert_rows(dst, width, src, rect),
            (Samples::U16(dst), Samples::U16(src)) => insert_rows(dst, width, src, rect),
            (Samples::F32(dst), Samples::F32(src)) => insert_rows(dst, width, src, rect),
            (dst, src) => {
                return Err(Error::InvalidImage(format!(
                    "cannot insert a {}-bit tile into a {}-bit slice",
                    src.bit_depth(),
                    dst.bit_depth()
                )));
            }
        }
        Ok(())
    }

    /// Mean and population standard deviation of the raw samples.
    pub fn mean_std(&self) -> (f64, f64) {
        let values: Vec<f64> = match &self.samples {
            Samples::U8(v) => v.iter().map(|&s| s as f64).collect(),
            Samples::U16(v) => v.iter().map(|&s| s as f64).collect(),
            Samples::F32(v) => v.iter().map(|&s| s as f64).collect(),
        };
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        (mean, variance.sqrt())
    }

    fn check_bounds(&self, rect: Rect) -> Result<()> {
        if rect.width == 0 || rect.height == 0 || rect.right() > self.width || rect.bottom() > self.height {
            return Err(Error::InvalidImage(format!(
                "region {:?} is outside the {}x{} slice",
                rect, self.width, self.height
            )));
        }
        Ok(())
    }
}

fn quantize(value: f32, max: f32) -> f32 {
    (value * max).round().clamp(0.0, max)
}

fn crop_rows<T: Copy>(src: &[T], width: u32, rect: Rect) -> Vec<T> {
    let width = width as usize;
    let mut out = Vec::with_capacity(rect.area());
    for y in rect.y..rect.bottom() {
        let start = y as usize * width + rect.x as usize;
        out.extend_from_slice(&src[start..start + rect.width as usize]);
    }
    out
}

fn insert_rows<T: Copy>(dst: &mut [T], width: u32, src: &[T], rect: Rect) {
    let width = width as usize;
    let row_len = rect.width as usize;
    for (row, y) in (rect.y..rect.bottom()).enumerate() {
        let start = y as usize * width + rect.x as usize;
        dst[start..start + row_len].copy_from_slice(&src[row * row_len..(row + 1) * row_len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_u16(width: u32, height: u32) -> PixelBuffer {
        let data = (0..width * height).map(|i| (i * 100) as u16).collect();
        PixelBuffer::new_u16(width, height, data).unwrap()
    }

    #[test]
    fn rejects_mismatched_sample_count() {
        let err = PixelBuffer::new_u8(4, 4, vec![0; 15]).unwrap_err();
        assert!(err.to_string().contains("16 samples"));

        assert!(PixelBuffer::new_u8(0, 4, vec![]).is_err());
        assert!(matches!(
            PixelBuffer::zeroed(2, 2, 12),
            Err(Error::UnsupportedBitDepth(12))
        ));
    }

    #[test]
    fn normalization_maps_full_range() {
        let buf = PixelBuffer::new_u8(3, 1, vec![0, 51, 255]).unwrap();
        let normalized = buf.to_normalized();
        assert_eq!(normalized[0], 0.0);
        assert!((normalized[1] - 0.2).abs() < 1e-6);
        assert_eq!(normalized[2], 1.0);

        let back = PixelBuffer::from_normalized(8, 3, 1, &normalized).unwrap();
        assert_eq!(back, buf);
    }

    #[test]
    fn from_normalized_clamps_out_of_range_values() {
        let buf = PixelBuffer::from_normalized(16, 3, 1, &[-0.5, 0.5, 1.5]).unwrap();
        assert_eq!(buf.samples(), &Samples::U16(vec![0, 32768, 65535]));
    }

    #[test]
    fn crop_and_insert_restore_the_region() {
        let original = gradient_u16(6, 5);
        let rect = Rect::new(2, 1, 3, 3);

        let tile = original.crop(rect).unwrap();
        assert_eq!(tile.dimensions(), (3, 3));
        assert_eq!(tile.get(0, 0), original.get(2, 1));
        assert_eq!(tile.get(2, 2), original.get(4, 3));

        let mut target = PixelBuffer::zeroed(6, 5, 16).unwrap();
        target.insert(&tile, 2, 1).unwrap();
        assert_eq!(target.get(3, 2), original.get(3, 2));
        assert_eq!(target.get(0, 0), 0.0);
        assert_eq!(target.get(5, 4), 0.0);
    }

    #[test]
    fn crop_outside_bounds_fails() {
        let buf = gradient_u16(4, 4);
        assert!(buf.crop(Rect::new(2, 2, 3, 1)).is_err());
        assert!(buf.crop(Rect::new(0, 0, 0, 1)).is_err());
    }

    #[test]
    fn insert_requires_matching_depth() {
        let mut target = PixelBuffer::zeroed(4, 4, 16).unwrap();
        let tile = PixelBuffer::zeroed(2, 2, 8).unwrap();
        let err = target.insert(&tile, 0, 0).unwrap_err();
        assert!(err.to_string().contains("8-bit"));
    }

    #[test]
    fn mean_std_of_constant_is_zero_spread() {
        let buf = PixelBuffer::new_u8(2, 2, vec![10, 10, 10, 10]).unwrap();
        assert_eq!(buf.mean_std(), (10.0, 0.0));

        let buf = PixelBuffer::new_u8(2, 1, vec![0, 10]).unwrap();
        assert_eq!(buf.mean_std(), (5.0, 5.0));
    }
}
