//! Image cleanup before OCR: grayscale, 3x3 median, contrast stretch, Otsu binarisation.

use image::{GrayImage, Luma};

use super::ExtractionError;

const CONTRAST_ALPHA: f32 = 1.2;
const CONTRAST_BETA: f32 = 10.0;

pub fn preprocess_for_ocr(data: &[u8]) -> Result<GrayImage, ExtractionError> {
    let decoded =
        image::load_from_memory(data).map_err(|e| ExtractionError::Image(e.to_string()))?;
    let gray = decoded.to_luma8();
    let denoised = median_3x3(&gray);
    let contrasted = adjust_contrast(&denoised, CONTRAST_ALPHA, CONTRAST_BETA);
    let threshold = otsu_threshold(&contrasted);
    Ok(binarize(&contrasted, threshold))
}

/// Median of each 3x3 neighbourhood, replicating edge pixels.
fn median_3x3(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    GrayImage::from_fn(w, h, |x, y| {
        let mut window = [0u8; 9];
        let mut i = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = (x as i64 + dx).clamp(0, w as i64 - 1) as u32;
                let ny = (y as i64 + dy).clamp(0, h as i64 - 1) as u32;
                window[i] = img.get_pixel(nx, ny).0[0];
                i += 1;
            }
        }
        window.sort_unstable();
        Luma([window[4]])
    })
}

/// `p * alpha + beta`, saturated to 0..=255.
fn adjust_contrast(img: &GrayImage, alpha: f32, beta: f32) -> GrayImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let v = (pixel.0[0] as f32 * alpha + beta).round();
        pixel.0[0] = v.clamp(0.0, 255.0) as u8;
    }
    out
}

/// Otsu's method: the threshold maximising between-class variance.
fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }

    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &n)| v as f64 * n as f64)
        .sum();

    let mut sum_background = 0.0;
    let mut weight_background = 0u64;
    let mut best_variance = -1.0;
    let mut best_threshold = 0u8;

    for (t, &count) in histogram.iter().enumerate() {
        weight_background += count;
        if weight_background == 0 {
            continue;
        }
        let weight_foreground = total - weight_background;
        if weight_foreground == 0 {
            break;
        }
        sum_background += t as f64 * count as f64;
        let mean_background = sum_background / weight_background as f64;
        let mean_foreground = (sum_all - sum_background) / weight_foreground as f64;
        let diff = mean_background - mean_foreground;
        let variance = weight_background as f64 * weight_foreground as f64 * diff * diff;
        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Pixels above the threshold become white, the rest black.
fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > threshold { 255 } else { 0 };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_png(img: GrayImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_median_removes_salt_noise() {
        let mut img = GrayImage::from_pixel(5, 5, Luma([10]));
        img.put_pixel(2, 2, Luma([255]));
        let out = median_3x3(&img);
        assert_eq!(out.get_pixel(2, 2).0[0], 10);
    }

    #[test]
    fn test_contrast_saturates() {
        let img = GrayImage::from_fn(2, 1, |x, _| Luma([if x == 0 { 0 } else { 250 }]));
        let out = adjust_contrast(&img, 1.2, 10.0);
        assert_eq!(out.get_pixel(0, 0).0[0], 10);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn test_otsu_splits_bimodal_image() {
        let img = GrayImage::from_fn(10, 10, |x, _| Luma([if x < 5 { 30 } else { 220 }]));
        let t = otsu_threshold(&img);
        assert!((30..220).contains(&t), "threshold was {t}");
        let bin = binarize(&img, t);
        assert_eq!(bin.get_pixel(0, 0).0[0], 0);
        assert_eq!(bin.get_pixel(9, 9).0[0], 255);
    }

    #[test]
    fn test_otsu_uniform_image_does_not_panic() {
        let img = GrayImage::from_pixel(4, 4, Luma([128]));
        let _ = otsu_threshold(&img);
    }

    #[test]
    fn test_preprocess_outputs_binary_image() {
        let img = GrayImage::from_fn(12, 12, |x, _| Luma([if x < 6 { 40 } else { 200 }]));
        let out = preprocess_for_ocr(&encode_png(img)).unwrap();
        assert_eq!(out.dimensions(), (12, 12));
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn test_preprocess_rejects_non_images() {
        assert!(matches!(
            preprocess_for_ocr(b"not an image"),
            Err(ExtractionError::Image(_))
        ));
    }
}
