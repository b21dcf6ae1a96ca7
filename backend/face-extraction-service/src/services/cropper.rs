//! Face cropper - cuts detected faces out of a source image
//!
//! Decodes the source once, crops each face rectangle and encodes the result
//! as JPEG regardless of the source format.
//!
//! Uses `spawn_blocking` for CPU-intensive operations to avoid blocking the async runtime.

use crate::config::CropperConfig;
use crate::error::{ExtractionError, Result};
use crate::models::FaceBoundingBox;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use std::io::Cursor;
use std::sync::Arc;
use tokio::task::JoinError;
use tracing::{debug, error};

/// A single encoded face crop
#[derive(Debug, Clone)]
pub struct CroppedFace {
    /// JPEG bytes
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

/// Pixel rectangle actually cut from the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CropRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Face cropper
pub struct FaceCropper {
    config: CropperConfig,
}

impl FaceCropper {
    pub fn new(config: CropperConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CropperConfig::default())
    }

    /// Decode raw bytes as a raster image
    pub fn decode(&self, data: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(data)
            .map_err(|e| ExtractionError::ImageDecode(format!("Failed to decode image: {e}")))
    }

    /// Decode `data` and crop one face out of it (blocking)
    pub fn crop(&self, data: &[u8], bbox: &FaceBoundingBox) -> Result<CroppedFace> {
        let img = self.decode(data)?;
        self.crop_decoded(&img, bbox)
    }

    /// Crop one face out of an already decoded image (blocking)
    pub fn crop_decoded(&self, img: &DynamicImage, bbox: &FaceBoundingBox) -> Result<CroppedFace> {
        let (img_w, img_h) = img.dimensions();
        let rect = self.resolve_rect(img_w, img_h, bbox)?;

        let face = img.crop_imm(rect.x, rect.y, rect.width, rect.height);
        let data = self.encode_jpeg(&face)?;

        debug!(
            left = rect.x,
            top = rect.y,
            width = rect.width,
            height = rect.height,
            size = data.len(),
            "Face cropped"
        );

        Ok(CroppedFace {
            data,
            width: rect.width,
            height: rect.height,
        })
    }

    /// Decode on the blocking pool
    pub async fn decode_async(self: Arc<Self>, data: Bytes) -> Result<DynamicImage> {
        tokio::task::spawn_blocking(move || self.decode(&data))
            .await
            .map_err(|e| task_failed("decode", e))?
    }

    /// Crop on the blocking pool
    pub async fn crop_async(
        self: Arc<Self>,
        img: Arc<DynamicImage>,
        bbox: FaceBoundingBox,
    ) -> Result<CroppedFace> {
        tokio::task::spawn_blocking(move || self.crop_decoded(&img, &bbox))
            .await
            .map_err(|e| task_failed("crop", e))?
    }

    /// Validate (strict) or clamp (lenient) the rectangle against the image
    fn resolve_rect(&self, img_w: u32, img_h: u32, bbox: &FaceBoundingBox) -> Result<CropRect> {
        let out_of_bounds = || {
            ExtractionError::CropBounds(format!(
                "rectangle left={} top={} width={} height={} outside {}x{} image",
                bbox.left, bbox.top, bbox.width, bbox.height, img_w, img_h
            ))
        };

        if bbox.width == 0 || bbox.height == 0 {
            return Err(out_of_bounds());
        }

        if self.config.strict_bounds {
            if bbox.right() > img_w as u64 || bbox.bottom() > img_h as u64 {
                return Err(out_of_bounds());
            }
            return Ok(CropRect {
                x: bbox.left,
                y: bbox.top,
                width: bbox.width,
                height: bbox.height,
            });
        }

        let right = bbox.right().min(img_w as u64) as u32;
        let bottom = bbox.bottom().min(img_h as u64) as u32;
        if bbox.left >= right || bbox.top >= bottom {
            return Err(out_of_bounds());
        }

        Ok(CropRect {
            x: bbox.left,
            y: bbox.top,
            width: right - bbox.left,
            height: bottom - bbox.top,
        })
    }

    /// Encode image as JPEG; JPEG has no alpha channel so convert to RGB first
    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Bytes> {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buf = Vec::new();
        let mut cursor = Cursor::new(&mut buf);

        rgb.write_to(&mut cursor, ImageOutputFormat::Jpeg(self.config.jpeg_quality))
            .map_err(|e| ExtractionError::Internal(format!("Failed to encode JPEG: {e}")))?;

        Ok(Bytes::from(buf))
    }
}

fn task_failed(stage: &str, e: JoinError) -> ExtractionError {
    error!(stage, error = %e, "Blocking image task failed");
    ExtractionError::Internal(format!("{stage} task failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn bbox(left: u32, top: u32, width: u32, height: u32) -> FaceBoundingBox {
        FaceBoundingBox {
            left,
            top,
            width,
            height,
        }
    }

    fn lenient() -> FaceCropper {
        FaceCropper::new(CropperConfig {
            strict_bounds: false,
            ..CropperConfig::default()
        })
    }

    #[test]
    fn test_crop_produces_requested_size() {
        let cropper = FaceCropper::with_defaults();
        let face = cropper.crop(&png(100, 100), &bbox(10, 10, 20, 20)).unwrap();

        assert_eq!((face.width, face.height), (20, 20));
        let decoded = image::load_from_memory(&face.data).unwrap();
        assert_eq!(decoded.dimensions(), (20, 20));
        assert_eq!(image::guess_format(&face.data).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_crop_touching_edges_is_in_bounds() {
        let cropper = FaceCropper::with_defaults();
        let face = cropper.crop(&png(100, 100), &bbox(80, 0, 20, 100)).unwrap();
        assert_eq!((face.width, face.height), (20, 100));
    }

    #[test]
    fn test_crop_past_right_edge_is_rejected() {
        let cropper = FaceCropper::with_defaults();
        let err = cropper.crop(&png(100, 100), &bbox(90, 10, 20, 20)).unwrap_err();
        assert_eq!(err.kind(), "crop_bounds_error");
    }

    #[test]
    fn test_crop_fully_outside_is_rejected() {
        let cropper = FaceCropper::with_defaults();
        let err = cropper.crop(&png(100, 100), &bbox(150, 150, 10, 10)).unwrap_err();
        assert_eq!(err.kind(), "crop_bounds_error");
    }

    #[test]
    fn test_empty_rectangle_is_rejected() {
        let cropper = FaceCropper::with_defaults();
        let err = cropper.crop(&png(100, 100), &bbox(10, 10, 0, 20)).unwrap_err();
        assert_eq!(err.kind(), "crop_bounds_error");
    }

    #[test]
    fn test_lenient_mode_clamps_partial_overlap() {
        let face = lenient().crop(&png(100, 100), &bbox(90, 95, 20, 20)).unwrap();
        assert_eq!((face.width, face.height), (10, 5));
    }

    #[test]
    fn test_lenient_mode_still_rejects_no_overlap() {
        let err = lenient().crop(&png(100, 100), &bbox(100, 0, 5, 5)).unwrap_err();
        assert_eq!(err.kind(), "crop_bounds_error");
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let cropper = FaceCropper::with_defaults();
        let err = cropper.crop(b"definitely not an image", &bbox(0, 0, 1, 1)).unwrap_err();
        assert_eq!(err.kind(), "image_decode_error");
    }

    #[test]
    fn test_alpha_source_is_encoded_as_jpeg() {
        let img = RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 128]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();

        let face = FaceCropper::with_defaults()
            .crop(&buf, &bbox(5, 5, 10, 10))
            .unwrap();
        assert_eq!(image::guess_format(&face.data).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_async_crop_matches_blocking() {
        let cropper = Arc::new(FaceCropper::with_defaults());
        let img = cropper
            .clone()
            .decode_async(Bytes::from(png(64, 48)))
            .await
            .unwrap();
        let face = cropper
            .crop_async(Arc::new(img), bbox(4, 4, 16, 8))
            .await
            .unwrap();
        assert_eq!((face.width, face.height), (16, 8));
    }

    #[tokio::test]
    async fn test_panicked_task_is_internal_error() {
        let join = tokio::task::spawn_blocking(|| -> Result<()> { panic!("worker died") })
            .await
            .unwrap_err();

        let err = task_failed("crop", join);
        assert_eq!(err.kind(), "internal_error");
        assert!(err.to_string().contains("crop task failed"));
    }
}
