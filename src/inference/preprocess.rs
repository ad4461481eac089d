//! Image preprocessing for inference
//!
//! Turns an uploaded image into the `[1, 3, H, W]` float input the classifier
//! expects. Every step is deterministic:
//!
//! 1. convert to 3-channel RGB (alpha dropped, grayscale expanded)
//! 2. resize to exactly `size x size` with Catmull-Rom bicubic resampling,
//!    ignoring the aspect ratio
//! 3. scale samples from `0..=255` to `0.0..=1.0`
//! 4. normalize each channel with the ImageNet mean/std
//! 5. lay the values out channel-major (CHW) with a leading batch dimension

use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::{imageops::FilterType, DynamicImage};

use crate::utils::error::{LeafLensError, Result};

/// ImageNet normalization mean values (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resampling filter used for the resize step
///
/// Changing it changes the numeric input of the model.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// A normalized image in `[1, 3, H, W]` layout, flattened
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    data: Vec<f32>,
    height: usize,
    width: usize,
}

impl NormalizedImage {
    /// Shape as `[batch, channels, height, width]`
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.height, self.width]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Values of one channel (0 = R, 1 = G, 2 = B)
    pub fn channel(&self, c: usize) -> &[f32] {
        let plane = self.height * self.width;
        &self.data[c * plane..(c + 1) * plane]
    }

    /// Move the buffer onto a device as a 4D tensor
    pub fn into_tensor<B: Backend>(self, device: &B::Device) -> Tensor<B, 4> {
        let shape = self.shape();
        Tensor::from_data(TensorData::new(self.data, shape), device)
    }
}

/// Decode uploaded bytes, guessing the format from the content
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(LeafLensError::Decode("empty upload".to_string()));
    }

    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(LeafLensError::Decode(format!(
            "image has no pixels ({}x{})",
            image.width(),
            image.height()
        )));
    }

    Ok(image)
}

/// Resize and normalize an image into the classifier input layout
pub fn preprocess(image: &DynamicImage, size: u32) -> NormalizedImage {
    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, size, size, RESIZE_FILTER);

    let plane = size as usize * size as usize;
    let mut data = vec![0.0f32; 3 * plane];

    for (i, pixel) in resized.pixels().enumerate() {
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            data[c * plane + i] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    NormalizedImage {
        data,
        height: size as usize,
        width: size as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceBackend;
    use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_output_shape_for_any_aspect_ratio() {
        for (w, h) in [(1, 1), (37, 512), (640, 480), (160, 160), (3000, 20)] {
            let img = DynamicImage::new_rgb8(w, h);
            let out = preprocess(&img, 160);
            assert_eq!(out.shape(), [1, 3, 160, 160]);
            assert_eq!(out.data().len(), 3 * 160 * 160);
        }
    }

    #[test]
    fn test_values_stay_in_normalized_range() {
        let img = RgbImage::from_fn(64, 48, |x, y| {
            Rgb([(x * 4) as u8, (y * 5) as u8, ((x + y) % 256) as u8])
        });
        let out = preprocess(&DynamicImage::ImageRgb8(img), 160);

        assert!(out.data().iter().all(|v| v.is_finite() && *v >= -3.0 && *v <= 3.0));
    }

    #[test]
    fn test_channel_normalization_constants() {
        let black = preprocess(&DynamicImage::new_rgb8(10, 10), 160);
        let white = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let white = preprocess(&DynamicImage::ImageRgb8(white), 160);

        for c in 0..3 {
            let expected_black = -IMAGENET_MEAN[c] / IMAGENET_STD[c];
            let expected_white = (1.0 - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
            assert!(black.channel(c).iter().all(|v| (v - expected_black).abs() < 1e-5));
            assert!(white.channel(c).iter().all(|v| (v - expected_white).abs() < 1e-5));
        }
    }

    #[test]
    fn test_chw_layout() {
        // Pure red: only the R plane sits above its mean
        let red = RgbImage::from_pixel(20, 20, Rgb([255, 0, 0]));
        let out = preprocess(&DynamicImage::ImageRgb8(red), 160);

        assert!(out.channel(0).iter().all(|v| *v > 2.0));
        assert!(out.channel(1).iter().all(|v| *v < -2.0));
        assert!(out.channel(2).iter().all(|v| *v < -1.5));
    }

    #[test]
    fn test_grayscale_and_alpha_are_converted() {
        let gray = GrayImage::from_pixel(30, 30, Luma([128]));
        let out = preprocess(&DynamicImage::ImageLuma8(gray), 160);
        assert_eq!(out.shape(), [1, 3, 160, 160]);

        let rgba = RgbaImage::from_pixel(30, 30, Rgba([10, 200, 30, 0]));
        let out = preprocess(&DynamicImage::ImageRgba8(rgba), 160);
        let expected_g = (200.0 / 255.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!(out.channel(1).iter().all(|v| (v - expected_g).abs() < 1e-5));
    }

    #[test]
    fn test_preprocess_is_deterministic() {
        let img = RgbImage::from_fn(90, 70, |x, y| Rgb([x as u8, y as u8, (x * y % 251) as u8]));
        let img = DynamicImage::ImageRgb8(img);
        assert_eq!(preprocess(&img, 160), preprocess(&img, 160));
    }

    #[test]
    fn test_decode_png_and_jpeg() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])));

        let decoded = decode_image(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));

        let decoded = decode_image(&encode(&img, ImageFormat::Jpeg)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_image(b""), Err(LeafLensError::Decode(_))));
        assert!(matches!(
            decode_image(b"hello, this is not an image"),
            Err(LeafLensError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_rejects_images_without_pixels() {
        let headers: [&[u8]; 3] = [b"P6\n0 0\n255\n", b"P6\n0 5\n255\n", b"P6\n5 0\n255\n"];
        for header in headers {
            assert!(matches!(decode_image(header), Err(LeafLensError::Decode(_))));
        }
    }

    #[test]
    fn test_into_tensor_shape() {
        let device = Default::default();
        let out = preprocess(&DynamicImage::new_rgb8(5, 5), 160);
        let tensor = out.into_tensor::<InferenceBackend>(&device);
        assert_eq!(tensor.dims(), [1, 3, 160, 160]);
    }
}
