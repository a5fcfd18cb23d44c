use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use imageproc::filter::gaussian_blur_f32;

use super::transform::AffineTransform;

/// Render `source` into a `size` x `size` classifier input using the geometry
/// of `transform` (as built by [`AffineTransform::frame_to_input`]): the image
/// is resized by the transform's scale factors and pasted at its translation
/// offset, leaving any letterbox padding black.
pub fn resize_for_input(
    source: &DynamicImage,
    transform: &AffineTransform,
    size: u32,
) -> RgbImage {
    let scaled_w = ((source.width() as f32) * transform.scale_x()).round().max(1.0) as u32;
    let scaled_h = ((source.height() as f32) * transform.scale_y()).round().max(1.0) as u32;

    let scaled = imageops::resize(&source.to_rgb8(), scaled_w, scaled_h, FilterType::CatmullRom);

    let mut canvas = RgbImage::new(size, size);
    imageops::overlay(
        &mut canvas,
        &scaled,
        transform.translate_x().round() as i64,
        transform.translate_y().round() as i64,
    );
    canvas
}

/// Gaussian blur applied to the classifier input to knock down sensor noise
/// and seven-segment edge shimmer before inference.
pub fn apply_blur(input: &RgbImage, sigma: f32) -> RgbImage {
    gaussian_blur_f32(input, sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn letterboxed_input_pads_short_axis() {
        // A white 100x50 frame letterboxed into 200x200 occupies rows 50..150.
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 50, Rgb([255, 255, 255])));
        let transform = AffineTransform::frame_to_input(100, 50, 200, true);
        let input = resize_for_input(&white, &transform, 200);

        assert_eq!(input.dimensions(), (200, 200));
        assert_eq!(input.get_pixel(100, 25), &Rgb([0, 0, 0]));
        assert_eq!(input.get_pixel(100, 100), &Rgb([255, 255, 255]));
        assert_eq!(input.get_pixel(100, 175), &Rgb([0, 0, 0]));
    }

    #[test]
    fn independent_axis_input_fills_canvas() {
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 50, Rgb([255, 255, 255])));
        let transform = AffineTransform::frame_to_input(100, 50, 200, false);
        let input = resize_for_input(&white, &transform, 200);

        assert_eq!(input.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(input.get_pixel(199, 199), &Rgb([255, 255, 255]));
    }

    #[test]
    fn blur_preserves_dimensions() {
        let input = RgbImage::new(64, 64);
        let blurred = apply_blur(&input, 1.0);
        assert_eq!(blurred.dimensions(), (64, 64));
    }
}
