// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use color_eyre::eyre::{Result, eyre};
use jpeg::DecodedImage;

fn png_color(num_channels: usize) -> Result<png::ColorType> {
    match num_channels {
        1 => Ok(png::ColorType::Grayscale),
        2 => Ok(png::ColorType::GrayscaleAlpha),
        3 => Ok(png::ColorType::Rgb),
        4 => Ok(png::ColorType::Rgba),
        _ => Err(eyre!(
            "Invalid number of channels for PNG output {:?}",
            num_channels
        )),
    }
}

/// Encodes an 8-bit decoded image as a PNG stream.
pub fn to_png(image: &DecodedImage) -> Result<Vec<u8>> {
    let width = u32::try_from(image.width)?;
    let height = u32::try_from(image.height)?;
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png_color(image.channels)?);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&image.pixels)?;
        writer.finish()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_channel_count() {
        assert!(png_color(0).is_err());
        assert!(png_color(5).is_err());
        assert_eq!(png_color(2).ok(), Some(png::ColorType::GrayscaleAlpha));
    }

    #[test]
    fn writes_header() -> Result<()> {
        let image = DecodedImage {
            width: 4,
            height: 3,
            channels: 3,
            pixels: (0..4 * 3 * 3).map(|v| v as u8).collect(),
            color_space: jpeg::api::ColorSpace::YCbCr,
        };
        let encoded = to_png(&image)?;
        assert_eq!(&encoded[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(&encoded[12..16], b"IHDR");
        assert_eq!(&encoded[16..24], &[0, 0, 0, 4, 0, 0, 0, 3]);
        // Bit depth 8, truecolor.
        assert_eq!(&encoded[24..26], &[8, 2]);
        Ok(())
    }

    #[test]
    fn short_pixel_buffer_is_an_error() {
        let image = DecodedImage {
            width: 4,
            height: 3,
            channels: 1,
            pixels: vec![0; 5],
            color_space: jpeg::api::ColorSpace::Grayscale,
        };
        assert!(to_png(&image).is_err());
    }
}
