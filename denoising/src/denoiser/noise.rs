/// Largest centred region the estimate looks at.
const REGION: usize = 2048;

/// Gaussian consistency constant of the median absolute deviation.
const MAD_SCALE: f32 = 0.6745;

/// Estimates the standard deviation of additive noise in a row-major image.
///
/// Uses the median absolute diagonal (HH) Haar coefficient over 2x2 blocks,
/// restricted to the centred 2048x2048 region. Returns 0 for images smaller
/// than one block.
pub fn estimate_noise(values: &[f32], width: usize, height: usize) -> f32 {
    debug_assert_eq!(values.len(), width * height);
    if width < 2 || height < 2 {
        return 0.0;
    }

    let region_width = width.min(REGION);
    let region_height = height.min(REGION);
    let x0 = (width - region_width) / 2;
    let y0 = (height - region_height) / 2;

    let mut coefficients = Vec::with_capacity((region_width / 2) * (region_height / 2));
    for y in (y0..y0 + region_height - 1).step_by(2) {
        let row = &values[y * width..(y + 1) * width];
        let next = &values[(y + 1) * width..(y + 2) * width];
        for x in (x0..x0 + region_width - 1).step_by(2) {
            let hh = (row[x] - row[x + 1] - next[x] + next[x + 1]) / 2.0;
            coefficients.push(hh.abs());
        }
    }

    if coefficients.is_empty() {
        return 0.0;
    }

    let mid = coefficients.len() / 2;
    let (_, median, _) = coefficients.select_nth_unstable_by(mid, f32::total_cmp);
    *median / MAD_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn flat_image_has_no_noise() {
        let values = vec![0.5; 64 * 64];
        assert_eq!(estimate_noise(&values, 64, 64), 0.0);
    }

    #[test]
    fn tiny_image_has_no_estimate() {
        assert_eq!(estimate_noise(&[0.3], 1, 1), 0.0);
        assert_eq!(estimate_noise(&[0.3, 0.4, 0.5], 3, 1), 0.0);
    }

    #[test]
    fn recovers_gaussian_sigma() {
        let mut rng = StdRng::seed_from_u64(7);
        let sigma = 0.05f32;
        let (width, height) = (256, 256);
        let values: Vec<f32> = (0..width * height)
            .map(|_| {
                let u1: f32 = rng.random::<f32>().max(f32::MIN_POSITIVE);
                let u2: f32 = rng.random();
                let gauss = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
                0.5 + sigma * gauss
            })
            .collect();

        let estimate = estimate_noise(&values, width, height);
        assert!(
            (estimate - sigma).abs() < 0.1 * sigma,
            "estimated {estimate}, expected about {sigma}"
        );
    }

    #[test]
    fn smooth_gradient_is_ignored() {
        let (width, height) = (64, 32);
        let values: Vec<f32> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x + y) as f32 / 200.0))
            .collect();
        assert!(estimate_noise(&values, width, height) < 1e-6);
    }
}
