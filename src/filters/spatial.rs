//! Full-raster filter passes that cannot be folded into a color matrix.

use image::{imageops, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::color::{is_opaque, multiply_over, premultiply, unpremultiply};

use super::settings::{DuotoneSettings, NoiseSettings, VignetteSettings};

/// Gaussian blur with a standard deviation of `radius` pixels.
///
/// Rasters with any transparency are blurred premultiplied, so fully
/// transparent pixels contribute no color to their neighbors.
pub fn blur(raster: &RgbaImage, radius: f32) -> RgbaImage {
    if is_opaque(raster) {
        return imageops::blur(raster, radius);
    }
    unpremultiply(&imageops::blur(&premultiply(raster), radius))
}

/// Map each pixel's gray level onto the dark..light gradient and blend the
/// result over the grayscaled pixel by `intensity / 100`
pub fn duotone(raster: &mut RgbaImage, settings: &DuotoneSettings) {
    let factor = settings.intensity.clamp(0.0, 100.0) / 100.0;
    let dark = settings.color_dark;
    let light = settings.color_light;
    let dark = [dark.r, dark.g, dark.b].map(|c| c as f32);
    let light = [light.r, light.g, light.b].map(|c| c as f32);

    for px in raster.pixels_mut() {
        let gray = ((px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0).round();
        let t = gray / 255.0;
        for c in 0..3 {
            let mapped = dark[c] * (1.0 - t) + light[c] * t;
            px[c] = (gray * (1.0 - factor) + mapped * factor)
                .round()
                .clamp(0.0, 255.0) as u8;
        }
    }
}

/// Radial gradient from transparent at `inner` to `color` at the corners,
/// multiplied over the raster
pub fn vignette(raster: &mut RgbaImage, settings: &VignetteSettings) {
    let (w, h) = raster.dimensions();
    let cx = w as f32 / 2.0;
    let cy = h as f32 / 2.0;
    let outer = (cx * cx + cy * cy).sqrt();
    let inner = outer * (1.0 - settings.intensity.clamp(0.0, 100.0) / 100.0);
    let span = outer - inner;
    if outer <= 0.0 || span <= 0.0 {
        return;
    }

    for (x, y, px) in raster.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        let d = (dx * dx + dy * dy).sqrt();
        if d <= inner {
            continue;
        }
        let coverage = ((d - inner) / span).min(1.0);
        *px = multiply_over(*px, settings.color, coverage);
    }
}

/// 3x3 sharpen kernel `[[0,-s,0],[-s,1+4s,-s],[0,-s,0]]` with
/// `s = amount / 100 * 0.8`. The outermost 1px ring is left as is.
pub fn sharpen(raster: &mut RgbaImage, amount: f32) {
    let (w, h) = raster.dimensions();
    if w < 3 || h < 3 {
        return;
    }
    let s = amount.clamp(0.0, 100.0) / 100.0 * 0.8;
    let src = raster.clone();

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = src.get_pixel(x, y);
            let up = src.get_pixel(x, y - 1);
            let down = src.get_pixel(x, y + 1);
            let left = src.get_pixel(x - 1, y);
            let right = src.get_pixel(x + 1, y);

            let out = raster.get_pixel_mut(x, y);
            for c in 0..3 {
                let neighbors = up[c] as f32 + down[c] as f32 + left[c] as f32 + right[c] as f32;
                let sum = center[c] as f32 * (1.0 + 4.0 * s) - neighbors * s;
                out[c] = sum.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Add a uniform offset in `±(amount / 100 * 70) / 2` to every channel.
///
/// Monochrome noise shares one draw across R, G and B; color noise draws per
/// channel. A seed makes the grain reproducible.
pub fn noise(raster: &mut RgbaImage, settings: &NoiseSettings) {
    let scale = settings.amount.clamp(0.0, 100.0) / 100.0 * 70.0;
    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let shift = |value: u8, offset: f32| (value as f32 + offset).round().clamp(0.0, 255.0) as u8;

    for px in raster.pixels_mut() {
        if settings.monochrome {
            let offset = (rng.gen::<f32>() - 0.5) * scale;
            for c in 0..3 {
                px[c] = shift(px[c], offset);
            }
        } else {
            for c in 0..3 {
                let offset = (rng.gen::<f32>() - 0.5) * scale;
                px[c] = shift(px[c], offset);
            }
        }
    }
}
