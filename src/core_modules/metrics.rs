use image::RgbImage;

/// Compression rate of a trained network.
///
/// `block_len` is the length of one channel vector, `block_count` the number of
/// blocks and `hidden_size` the bottleneck width: `(L·K) / ((L + K)·h + 2)`.
pub fn compression_rate(block_len: usize, block_count: usize, hidden_size: usize) -> f64 {
    let l = block_len as f64;
    let k = block_count as f64;
    (l * k) / ((l + k) * hidden_size as f64 + 2.0)
}

/// Peak signal-to-noise ratio between two images of equal size, in dB.
/// Identical images give `f64::INFINITY`.
pub fn compute_psnr(target: &RgbImage, rendered: &RgbImage) -> f64 {
    debug_assert_eq!(target.dimensions(), rendered.dimensions());
    let samples = (target.width() as u64 * target.height() as u64 * 3) as f64;
    if samples == 0.0 {
        return f64::INFINITY;
    }

    let mut squared = 0.0;
    for (target_pixel, rendered_pixel) in target.pixels().zip(rendered.pixels()) {
        for i in 0..3 {
            let diff = f64::from(target_pixel[i]) - f64::from(rendered_pixel[i]);
            squared += diff * diff;
        }
    }

    if squared == 0.0 {
        return f64::INFINITY;
    }
    let mse = squared / samples;
    20.0 * 255.0_f64.log10() - 10.0 * mse.log10()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    #[test]
    fn compression_rate_of_tiny_grid() {
        assert_relative_eq!(compression_rate(4, 4, 2), 16.0 / 18.0);
        assert_relative_eq!(compression_rate(4, 4, 2), 0.888_888_888_888_888_9, epsilon = 1e-12);
    }

    #[test]
    fn compression_rate_grows_with_smaller_bottleneck() {
        assert!(compression_rate(64, 1024, 8) > compression_rate(64, 1024, 16));
    }

    #[test]
    fn psnr_of_identical_images_is_infinite() {
        let image = RgbImage::from_pixel(4, 4, Rgb([12, 34, 56]));
        assert!(compute_psnr(&image, &image).is_infinite());
    }

    #[test]
    fn psnr_of_uniform_offset() {
        let a = RgbImage::from_pixel(4, 4, Rgb([100, 100, 100]));
        let b = RgbImage::from_pixel(4, 4, Rgb([110, 110, 110]));
        // mse = 100
        assert_relative_eq!(compute_psnr(&a, &b), 20.0 * 255.0_f64.log10() - 20.0, epsilon = 1e-9);
    }
}
