use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageError, Rgb, RgbImage};

use crate::export::{EncodedImage, RasterError, RasterOptions, Rasterizer};
use crate::image::paint::CardFace;

/// Scales a [`CardFace`], flattens it onto the background colour and encodes it as JPEG.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegRasterizer;

impl JpegRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer<CardFace> for JpegRasterizer {
    fn rasterize(
        &mut self,
        face: &CardFace,
        options: &RasterOptions,
    ) -> Result<EncodedImage, RasterError> {
        let (width, height) = face.image.dimensions();
        let target_w = scaled(width, options.scale);
        let target_h = scaled(height, options.scale);
        let pixels = u64::from(target_w) * u64::from(target_h);
        if pixels > options.max_pixels {
            return Err(RasterError::ResourceExhausted(format!(
                "card {} needs {}x{} pixels, limit is {}",
                face.serial, target_w, target_h, options.max_pixels
            )));
        }

        let resized;
        let source = if (target_w, target_h) == (width, height) {
            &face.image
        } else {
            resized = imageops::resize(&face.image, target_w, target_h, FilterType::Triangle);
            &resized
        };

        let [bg_r, bg_g, bg_b] = options.background;
        let flat = RgbImage::from_fn(target_w, target_h, |x, y| {
            let [r, g, b, a] = source.get_pixel(x, y).0;
            let alpha = f32::from(a) / 255.0;
            let blend = |fg: u8, bg: u8| {
                (f32::from(fg) * alpha + f32::from(bg) * (1.0 - alpha)).round() as u8
            };
            Rgb([blend(r, bg_r), blend(g, bg_g), blend(b, bg_b)])
        });

        let quality = (options.quality * 100.0).round().clamp(1.0, 100.0) as u8;
        let mut data = Vec::new();
        JpegEncoder::new_with_quality(&mut data, quality)
            .encode_image(&flat)
            .map_err(raster_error)?;

        Ok(EncodedImage {
            width: target_w,
            height: target_h,
            data,
        })
    }
}

fn scaled(px: u32, scale: f32) -> u32 {
    ((px as f32 * scale).round() as u32).max(1)
}

fn raster_error(err: ImageError) -> RasterError {
    match err {
        ImageError::Limits(limit) => RasterError::ResourceExhausted(limit.to_string()),
        other => RasterError::Encode(other.to_string()),
    }
}
