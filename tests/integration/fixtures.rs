//! Shared test images

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

/// Deterministic, position-dependent pattern so crops can be located exactly
pub fn pattern(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x / 256 + y / 256) * 40) as u8, 255])
    })
}

pub fn encode_as(raster: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    if format == ImageFormat::WebP {
        let rgb = image::DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
        return webp::Encoder::from_rgb(&rgb, raster.width(), raster.height())
            .encode(90.0)
            .to_vec();
    }
    let mut image = image::DynamicImage::ImageRgba8(raster.clone());
    if format == ImageFormat::Jpeg {
        image = image::DynamicImage::ImageRgb8(image.to_rgb8());
    }
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .expect("Failed to encode fixture");
    buffer.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode_as(&pattern(width, height), ImageFormat::Png)
}
