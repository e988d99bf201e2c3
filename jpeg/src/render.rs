// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Turns decoded component planes into interleaved 8-bit pixels.

pub mod color;
pub mod upsample;

use crate::decode::Component;
use crate::MAX_COMPONENTS;
use crate::error::{Error, Result};
use crate::util::tracing_wrappers::*;
use crate::util::try_filled_vec;
use color::{ColorSpace, convert_row};
use upsample::RowResampler;

/// Resamples every needed component to `width` x `height` and converts the
/// result to `channels` interleaved channels.
pub fn render(
    components: &[Component],
    (width, height): (usize, usize),
    color_space: ColorSpace,
    channels: usize,
) -> Result<Vec<u8>> {
    let row_len = width.checked_mul(channels).ok_or(Error::ArithmeticOverflow)?;
    let len = row_len.checked_mul(height).ok_or(Error::ArithmeticOverflow)?;
    let mut pixels = try_filled_vec(len, 0u8)?;
    if len == 0 {
        return Ok(pixels);
    }

    let needed = if channels < 3 && color_space.luma_is_first_component() {
        1
    } else {
        components.len()
    };
    let components = &components[..needed];
    let mut resamplers = Vec::with_capacity(needed);
    let mut rows = Vec::with_capacity(needed);
    for component in components {
        let (h_ratio, v_ratio) = component.ratio;
        let resampler = RowResampler::new(h_ratio, v_ratio, width, component.size.1);
        debug!(
            id = component.info.id,
            upsampler = %resampler.upsampler(),
            "resampling component"
        );
        rows.push(try_filled_vec(resampler.output_len(), 0u8)?);
        resamplers.push(resampler);
    }

    for out in pixels.chunks_exact_mut(row_len) {
        for ((resampler, row), component) in
            resamplers.iter_mut().zip(rows.iter_mut()).zip(components)
        {
            resampler.next_row(&component.plane, row);
        }
        let mut full_rows: [&[u8]; MAX_COMPONENTS] = [&[]; MAX_COMPONENTS];
        for (full, row) in full_rows.iter_mut().zip(rows.iter()) {
            *full = &row[..width];
        }
        convert_row(color_space, &full_rows[..needed], channels, out);
    }
    Ok(pixels)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::headers::ComponentInfo;
    use crate::image::Image;
    use test_log::test;

    fn component(
        id: u8,
        samp: (u8, u8),
        ratio: (usize, usize),
        size: (usize, usize),
        value: u8,
    ) -> Component {
        Component {
            info: ComponentInfo {
                id,
                h_samp_factor: samp.0,
                v_samp_factor: samp.1,
                quant_table: 0,
            },
            size,
            ratio,
            plane: Image::new_filled((16, 16), value).unwrap(),
            coefficients: None,
            dc_pred: 0,
        }
    }

    #[test]
    fn gray_channels() {
        let mut gray = component(1, (1, 1), (1, 1), (3, 2), 0);
        gray.plane.row_mut(0)[..3].copy_from_slice(&[1, 2, 3]);
        gray.plane.row_mut(1)[..3].copy_from_slice(&[4, 5, 6]);
        let components = [gray];
        let one = render(&components, (3, 2), ColorSpace::Grayscale, 1).unwrap();
        assert_eq!(one, [1, 2, 3, 4, 5, 6]);
        let two = render(&components, (3, 2), ColorSpace::Grayscale, 2).unwrap();
        assert_eq!(two, [1, 255, 2, 255, 3, 255, 4, 255, 5, 255, 6, 255]);
        let three = render(&components, (3, 2), ColorSpace::Grayscale, 3).unwrap();
        assert_eq!(&three[..6], &[1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn subsampled_chroma() {
        let components = [
            component(1, (2, 2), (1, 1), (5, 3), 90),
            component(2, (1, 1), (2, 2), (3, 2), 128),
            component(3, (1, 1), (2, 2), (3, 2), 128),
        ];
        let rgb = render(&components, (5, 3), ColorSpace::YCbCr, 3).unwrap();
        assert_eq!(rgb.len(), 5 * 3 * 3);
        assert!(rgb.iter().all(|&v| v == 90));
        // Luma-only output does not look at chroma.
        let gray = render(&components[..1], (5, 3), ColorSpace::YCbCr, 1).unwrap();
        assert_eq!(gray, [90; 15]);
    }

    #[test]
    fn chroma_corner_is_not_blended() {
        let mut cr = component(3, (1, 1), (2, 2), (2, 2), 128);
        cr.plane.row_mut(0)[..2].copy_from_slice(&[228, 128]);
        let components = [
            component(1, (2, 2), (1, 1), (4, 4), 100),
            component(2, (1, 1), (2, 2), (2, 2), 128),
            cr,
        ];
        let rgb = render(&components, (4, 4), ColorSpace::YCbCr, 3).unwrap();
        // Top-left output pixel sees 3/4 of the corner chroma sample
        // horizontally and the same row vertically.
        let red = |x: usize, y: usize| rgb[(y * 4 + x) * 3];
        assert!(red(0, 0) > red(1, 0));
        assert!(red(1, 0) > red(2, 0));
        assert!(red(0, 0) > red(0, 3));
        assert_eq!(red(3, 3), 100);
    }

    #[test]
    fn empty_output() {
        let components = [component(1, (1, 1), (1, 1), (0, 0), 0)];
        assert!(render(&components, (0, 0), ColorSpace::Grayscale, 3).unwrap().is_empty());
    }
}
