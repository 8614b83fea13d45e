//! Affine RGB color matrices.
//!
//! Each point filter (brightness, contrast, saturation, grayscale, sepia,
//! hue-rotate) is expressed as a 3x4 matrix over channel values in 0..=255.
//! Consecutive point filters are composed into one matrix and applied in a
//! single pass, so intermediate results are never quantized to 8 bits.

use image::RgbaImage;

/// `out = M · [r, g, b] + offset`, rows are output channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    m: [[f32; 3]; 3],
    offset: [f32; 3],
}

// Rec. 601 luma weights used by the saturate / hue-rotate matrices
const LR: f32 = 0.213;
const LG: f32 = 0.715;
const LB: f32 = 0.072;

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl ColorMatrix {
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            offset: [0.0; 3],
        }
    }

    /// Linear scale, `percent` = 100 is identity
    pub fn brightness(percent: f32) -> Self {
        let k = percent / 100.0;
        Self {
            m: [[k, 0.0, 0.0], [0.0, k, 0.0], [0.0, 0.0, k]],
            offset: [0.0; 3],
        }
    }

    /// Scale about mid-gray, `percent` = 100 is identity
    pub fn contrast(percent: f32) -> Self {
        let k = percent / 100.0;
        let o = 127.5 * (1.0 - k);
        Self {
            m: [[k, 0.0, 0.0], [0.0, k, 0.0], [0.0, 0.0, k]],
            offset: [o; 3],
        }
    }

    /// `percent` = 100 is identity, 0 is fully desaturated
    pub fn saturation(percent: f32) -> Self {
        let s = percent / 100.0;
        Self {
            m: [
                [LR + (1.0 - LR) * s, LG - LG * s, LB - LB * s],
                [LR - LR * s, LG + (1.0 - LG) * s, LB - LB * s],
                [LR - LR * s, LG - LG * s, LB + (1.0 - LB) * s],
            ],
            offset: [0.0; 3],
        }
    }

    /// Blend toward the channel average; `percent` = 0 is identity
    pub fn grayscale(percent: f32) -> Self {
        let f = percent / 100.0;
        let a = f / 3.0;
        let d = 1.0 - f + a;
        Self {
            m: [[d, a, a], [a, d, a], [a, a, d]],
            offset: [0.0; 3],
        }
    }

    /// Blend toward the classic sepia tone; `percent` = 0 is identity
    pub fn sepia(percent: f32) -> Self {
        let f = percent / 100.0;
        let tone = [
            [0.393, 0.769, 0.189],
            [0.349, 0.686, 0.168],
            [0.272, 0.534, 0.131],
        ];
        let mut m = [[0.0; 3]; 3];
        for (row, tone_row) in m.iter_mut().zip(tone.iter()) {
            for (c, value) in row.iter_mut().enumerate() {
                *value = tone_row[c] * f;
            }
        }
        for (i, row) in m.iter_mut().enumerate() {
            row[i] += 1.0 - f;
        }
        Self { m, offset: [0.0; 3] }
    }

    /// Rotate hue by `degrees`; multiples of 360 are identity
    pub fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            m: [
                [
                    LR + cos * (1.0 - LR) - sin * LR,
                    LG - cos * LG - sin * LG,
                    LB - cos * LB + sin * (1.0 - LB),
                ],
                [
                    LR - cos * LR + sin * 0.143,
                    LG + cos * (1.0 - LG) + sin * 0.140,
                    LB - cos * LB - sin * 0.283,
                ],
                [
                    LR - cos * LR - sin * (1.0 - LR),
                    LG - cos * LG + sin * LG,
                    LB + cos * (1.0 - LB) + sin * LB,
                ],
            ],
            offset: [0.0; 3],
        }
    }

    /// Matrix equivalent to applying `self` first, then `next`
    pub fn then(&self, next: &ColorMatrix) -> ColorMatrix {
        let mut m = [[0.0; 3]; 3];
        let mut offset = [0.0; 3];
        for i in 0..3 {
            for j in 0..3 {
                m[i][j] = (0..3).map(|k| next.m[i][k] * self.m[k][j]).sum();
            }
            offset[i] = (0..3).map(|k| next.m[i][k] * self.offset[k]).sum::<f32>() + next.offset[i];
        }
        ColorMatrix { m, offset }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Transform one RGB triple, rounding and clamping to 8 bits
    pub fn transform(&self, rgb: [u8; 3]) -> [u8; 3] {
        let v = rgb.map(|c| c as f32);
        let mut out = [0u8; 3];
        for (i, slot) in out.iter_mut().enumerate() {
            let x = self.m[i][0] * v[0] + self.m[i][1] * v[1] + self.m[i][2] * v[2] + self.offset[i];
            *slot = x.round().clamp(0.0, 255.0) as u8;
        }
        out
    }

    /// Apply to every pixel of `raster` in place; alpha is untouched
    pub fn apply(&self, raster: &mut RgbaImage) {
        if self.is_identity() {
            return;
        }
        for px in raster.pixels_mut() {
            let [r, g, b] = self.transform([px[0], px[1], px[2]]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }
}
