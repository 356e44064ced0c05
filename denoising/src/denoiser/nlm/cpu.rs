use rayon::prelude::*;

use super::KernelParams;

/// Row-parallel Non-Local Means on normalised samples.
pub(super) fn denoise(values: &[f32], width: usize, height: usize, params: &KernelParams) -> Vec<f32> {
    let mut output = vec![0.0f32; values.len()];
    let image = Image {
        values,
        width: width as i32,
        height: height as i32,
    };

    output
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                *out = image.filter_pixel(x as i32, y as i32, params);
            }
        });

    output
}

struct Image<'a> {
    values: &'a [f32],
    width: i32,
    height: i32,
}

impl Image<'_> {
    #[inline]
    fn at(&self, x: i32, y: i32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    #[inline]
    fn clamped(&self, x: i32, y: i32) -> f32 {
        self.at(x.clamp(0, self.width - 1), y.clamp(0, self.height - 1))
    }

    fn patch_distance(&self, x: i32, y: i32, cx: i32, cy: i32, half_block: i32) -> f32 {
        let mut sum = 0.0f32;
        for by in -half_block..=half_block {
            for bx in -half_block..=half_block {
                let diff = self.clamped(x + bx, y + by) - self.clamped(cx + bx, cy + by);
                sum += diff * diff;
            }
        }
        let side = (2 * half_block + 1) as f32;
        sum / (side * side)
    }

    fn filter_pixel(&self, x: i32, y: i32, params: &KernelParams) -> f32 {
        let s = params.half_search as i32;
        let b = params.half_block as i32;
        let variance = params.sigma * params.sigma;
        let filter = (params.h * params.h * variance).max(1e-12);

        let mut weight_sum = 0.0f32;
        let mut value_sum = 0.0f32;
        for cy in (y - s).max(0)..=(y + s).min(self.height - 1) {
            for cx in (x - s).max(0)..=(x + s).min(self.width - 1) {
                let d2 = self.patch_distance(x, y, cx, cy, b);
                let w = (-(d2 - 2.0 * variance).max(0.0) / filter).exp();
                weight_sum += w;
                value_sum += w * self.at(cx, cy);
            }
        }

        value_sum / weight_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(h: f32, sigma: f32) -> KernelParams {
        KernelParams {
            half_search: 2,
            half_block: 1,
            h,
            sigma,
        }
    }

    #[test]
    fn flat_image_is_unchanged() {
        let values = vec![0.25; 8 * 6];
        let output = denoise(&values, 8, 6, &params(2.0, 0.0));
        assert!(output.iter().all(|&v| (v - 0.25).abs() < 1e-6));
    }

    #[test]
    fn isolated_spike_is_attenuated() {
        let (width, height) = (9, 9);
        let mut values = vec![0.5f32; width * height];
        let center = 4 * width + 4;
        values[center] = 0.9;

        let output = denoise(&values, width, height, &params(4.0, 0.1));
        assert!(output[center] < 0.9);
        assert!(output[center] > 0.5);
    }

    #[test]
    fn zero_sigma_keeps_edges() {
        // Left half dark, right half bright: patches across the edge differ.
        let (width, height) = (10, 4);
        let values: Vec<f32> = (0..width * height)
            .map(|i| if i % width < 5 { 0.1 } else { 0.9 })
            .collect();

        let output = denoise(&values, width, height, &params(1.0, 0.0));
        for (out, input) in output.iter().zip(&values) {
            assert!((out - input).abs() < 1e-3);
        }
    }
}
