// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Conversion of full-resolution component rows to interleaved output.

use crate::headers::{AdobeTransform, FrameHeader};

/// How the components of a frame are to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Grayscale,
    /// Three components, or four with the fourth ignored.
    YCbCr,
    Rgb,
    Cmyk,
    Ycck,
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColorSpace::Grayscale => "grayscale",
            ColorSpace::YCbCr => "YCbCr",
            ColorSpace::Rgb => "RGB",
            ColorSpace::Cmyk => "CMYK",
            ColorSpace::Ycck => "YCCK",
        };
        f.write_str(name)
    }
}

impl ColorSpace {
    /// Guesses the color space from the component count and ids and from
    /// the JFIF and Adobe markers seen before the frame.
    pub fn detect(frame: &FrameHeader, jfif: bool, adobe: Option<AdobeTransform>) -> ColorSpace {
        match frame.components.len() {
            1 => ColorSpace::Grayscale,
            3 => {
                let rgb_ids = frame
                    .components
                    .iter()
                    .map(|c| c.id)
                    .eq(*b"RGB");
                if rgb_ids || (adobe == Some(AdobeTransform::Untransformed) && !jfif) {
                    ColorSpace::Rgb
                } else {
                    ColorSpace::YCbCr
                }
            }
            _ => match adobe {
                Some(AdobeTransform::Untransformed) => ColorSpace::Cmyk,
                Some(AdobeTransform::Ycck) => ColorSpace::Ycck,
                _ => ColorSpace::YCbCr,
            },
        }
    }

    /// Whether output with fewer than three channels only needs the first
    /// component.
    pub fn luma_is_first_component(&self) -> bool {
        matches!(self, ColorSpace::Grayscale | ColorSpace::YCbCr)
    }
}

// Coefficients rounded to 12 fractional bits, then scaled to 20.
const CR_TO_R: i32 = 5743 << 8;
const CR_TO_G: i32 = -(2925 << 8);
const CB_TO_G: i32 = -(1410 << 8);
const CB_TO_B: i32 = 7258 << 8;

#[inline]
fn clamp(x: i32) -> u8 {
    x.clamp(0, 255) as u8
}

/// Fixed-point YCbCr to RGB, 20 fractional bits.
#[inline]
pub fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> [u8; 3] {
    let y_fixed = ((y as i32) << 20) + (1 << 19);
    let cb = cb as i32 - 128;
    let cr = cr as i32 - 128;
    let r = y_fixed + cr * CR_TO_R;
    let g = y_fixed + cr * CR_TO_G + ((cb * CB_TO_G) & !0xffff);
    let b = y_fixed + cb * CB_TO_B;
    [clamp(r >> 20), clamp(g >> 20), clamp(b >> 20)]
}

/// `x * k / 255`, rounded.
#[inline]
pub fn blend(x: u8, k: u8) -> u8 {
    let t = x as u32 * k as u32 + 128;
    ((t + (t >> 8)) >> 8) as u8
}

#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 77 + g as u32 * 150 + b as u32 * 29) >> 8) as u8
}

/// Writes one output row. `rows` holds a full-resolution row per component
/// that is needed (only the first one for grayscale-like output of
/// [`ColorSpace::luma_is_first_component`] spaces).
pub fn convert_row(color_space: ColorSpace, rows: &[&[u8]], channels: usize, out: &mut [u8]) {
    for (x, pixel) in out.chunks_exact_mut(channels).enumerate() {
        let c0 = rows[0][x];
        let rgb = match color_space {
            ColorSpace::Grayscale => [c0, c0, c0],
            ColorSpace::YCbCr if channels < 3 => [c0, c0, c0],
            ColorSpace::YCbCr => ycbcr_to_rgb(c0, rows[1][x], rows[2][x]),
            ColorSpace::Rgb => [c0, rows[1][x], rows[2][x]],
            ColorSpace::Cmyk => {
                let k = rows[3][x];
                [blend(c0, k), blend(rows[1][x], k), blend(rows[2][x], k)]
            }
            ColorSpace::Ycck => {
                let k = rows[3][x];
                if channels < 3 {
                    let gray = blend(255 - c0, k);
                    [gray, gray, gray]
                } else {
                    ycbcr_to_rgb(c0, rows[1][x], rows[2][x]).map(|v| blend(255 - v, k))
                }
            }
        };
        match channels {
            1 | 2 => {
                pixel[0] = match color_space {
                    ColorSpace::Rgb | ColorSpace::Cmyk => luma(rgb[0], rgb[1], rgb[2]),
                    _ => rgb[0],
                };
            }
            _ => pixel[..3].copy_from_slice(&rgb),
        }
        if channels == 2 || channels == 4 {
            pixel[channels - 1] = 255;
        }
    }
}
