//! The enhancement pipeline of C1 (§4.1): auto-orient, upscale, contrast,
//! sharpness, unsharp mask, and the Tesseract-tuned grayscale variant.

use image::{imageops, DynamicImage, GenericImageView, Rgb, RgbImage};

/// Minimum short-side dimension the upscale step targets.
pub const MIN_DIMENSION: u32 = 1000;

/// Apply EXIF orientation (1-8) to a decoded image, matching the `exif`
/// crate's orientation tag values.
pub fn auto_orient(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// Upscale so the minimum dimension reaches at least `MIN_DIMENSION`,
/// using a high-quality Lanczos3 resampler. A no-op if already large enough.
pub fn upscale_to_minimum(image: &DynamicImage) -> DynamicImage {
    let (w, h) = image.dimensions();
    let short_side = w.min(h);
    if short_side >= MIN_DIMENSION || short_side == 0 {
        return image.clone();
    }
    let scale = MIN_DIMENSION as f64 / short_side as f64;
    let new_w = (w as f64 * scale).round() as u32;
    let new_h = (h as f64 * scale).round() as u32;
    image.resize(new_w, new_h, imageops::FilterType::Lanczos3)
}

/// PIL-style contrast enhancement: `new = (old - 128) * factor + 128`,
/// clamped to `[0,255]` per channel.
pub fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for px in out.pixels_mut() {
        for c in 0..3 {
            let v = px.0[c] as f32;
            px.0[c] = (((v - 128.0) * factor) + 128.0).clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// PIL-style sharpness enhancement via a simple 3x3 sharpening kernel
/// blended with the original by `factor` (factor 1.0 is a no-op, as PIL
/// defines it relative to the unsharpened source).
pub fn adjust_sharpness(image: &RgbImage, factor: f32) -> RgbImage {
    let sharpened = DynamicImage::ImageRgb8(image.clone()).filter3x3(&[0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0]);
    let sharpened = sharpened.to_rgb8();
    blend(image, &sharpened, (factor - 1.0).clamp(0.0, 1.0))
}

/// Unsharp mask with PIL's (radius, percent, threshold) parameterisation:
/// blur at `radius`, amplify the high-frequency residual by `percent`,
/// only where the residual exceeds `threshold`.
pub fn unsharp_mask(image: &RgbImage, radius: f32, percent: u32, threshold: u8) -> RgbImage {
    let blurred = imageops::blur(image, radius);
    let amount = percent as f32 / 100.0;
    let mut out = image.clone();
    for (px, blur_px) in out.pixels_mut().zip(blurred.pixels()) {
        for c in 0..3 {
            let orig = px.0[c] as i32;
            let blur = blur_px.0[c] as i32;
            let diff = orig - blur;
            if diff.unsigned_abs() as u8 >= threshold {
                px.0[c] = (orig as f32 + diff as f32 * amount).clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

fn blend(a: &RgbImage, b: &RgbImage, t: f32) -> RgbImage {
    let (w, h) = a.dimensions();
    let mut out = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let pa = a.get_pixel(x, y);
            let pb = b.get_pixel(x, y);
            let mut mixed = [0u8; 3];
            for c in 0..3 {
                mixed[c] = (pa.0[c] as f32 * (1.0 - t) + pb.0[c] as f32 * t).clamp(0.0, 255.0) as u8;
            }
            out.put_pixel(x, y, Rgb(mixed));
        }
    }
    out
}

/// The primary enhancement pipeline for the engine configured as primary
/// (§4.1): RGB upscale, contrast ×1.3, sharpness ×1.2, unsharp mask
/// (radius 1, percent 50, threshold 3).
pub fn enhance_primary(image: &DynamicImage) -> RgbImage {
    let upscaled = upscale_to_minimum(image);
    let rgb = upscaled.to_rgb8();
    let contrasted = adjust_contrast(&rgb, 1.3);
    let sharpened = adjust_sharpness(&contrasted, 1.2);
    unsharp_mask(&sharpened, 1.0, 50, 3)
}

/// The Tesseract-tuned variant for the fallback engine (§4.1): grayscale,
/// contrast ×2.0, sharpen filter.
pub fn enhance_tesseract_tuned(image: &DynamicImage) -> RgbImage {
    let upscaled = upscale_to_minimum(image);
    let gray = upscaled.grayscale().to_rgb8();
    let contrasted = adjust_contrast(&gray, 2.0);
    adjust_sharpness(&contrasted, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgb: [u8; 3]) -> RgbImage {
        let mut img = RgbImage::new(w, h);
        for p in img.pixels_mut() {
            *p = Rgb(rgb);
        }
        img
    }

    #[test]
    fn upscale_reaches_minimum_dimension() {
        let image = DynamicImage::ImageRgb8(solid(100, 200, [10, 10, 10]));
        let upscaled = upscale_to_minimum(&image);
        assert!(upscaled.dimensions().0.min(upscaled.dimensions().1) >= MIN_DIMENSION);
    }

    #[test]
    fn upscale_is_noop_when_already_large() {
        let image = DynamicImage::ImageRgb8(solid(1200, 1600, [10, 10, 10]));
        let upscaled = upscale_to_minimum(&image);
        assert_eq!(upscaled.dimensions(), (1200, 1600));
    }

    #[test]
    fn contrast_pushes_values_away_from_midpoint() {
        let image = solid(2, 2, [200, 200, 200]);
        let out = adjust_contrast(&image, 1.3);
        assert!(out.get_pixel(0, 0).0[0] > 200);
    }

    #[test]
    fn unsharp_mask_preserves_dimensions() {
        let image = solid(10, 10, [128, 128, 128]);
        let out = unsharp_mask(&image, 1.0, 50, 3);
        assert_eq!(out.dimensions(), (10, 10));
    }
}
