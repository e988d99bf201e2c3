// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use color_eyre::eyre::{Result, eyre};
use jpeg::DecodedImage;
use std::io::Write;

/// File extension matching the netpbm flavor written for `channels`.
pub fn pnm_extension(channels: usize) -> Result<&'static str> {
    match channels {
        1 => Ok("pgm"),
        3 => Ok("ppm"),
        _ => Err(eyre!(
            "PNM output needs 1 or 3 channels, got {}",
            channels
        )),
    }
}

/// Writes a binary PGM (P5) or PPM (P6) with maxval 255.
pub fn to_pnm(image: &DecodedImage) -> Result<Vec<u8>> {
    let magic = match pnm_extension(image.channels)? {
        "pgm" => "P5",
        _ => "P6",
    };
    let expected = image.width * image.height * image.channels;
    if image.pixels.len() != expected {
        return Err(eyre!(
            "Pixel buffer has {} bytes, expected {}",
            image.pixels.len(),
            expected
        ));
    }
    let mut ret = vec![];
    write!(&mut ret, "{magic}\n{} {}\n255\n", image.width, image.height)?;
    ret.extend_from_slice(&image.pixels);
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jpeg::api::ColorSpace;

    #[test]
    fn gray_header() -> Result<()> {
        let image = DecodedImage {
            width: 2,
            height: 1,
            channels: 1,
            pixels: vec![7, 9],
            color_space: ColorSpace::Grayscale,
        };
        assert_eq!(to_pnm(&image)?, b"P5\n2 1\n255\n\x07\x09");
        Ok(())
    }

    #[test]
    fn alpha_is_rejected() {
        let image = DecodedImage {
            width: 1,
            height: 1,
            channels: 4,
            pixels: vec![0; 4],
            color_space: ColorSpace::YCbCr,
        };
        assert!(to_pnm(&image).is_err());
        assert_eq!(pnm_extension(3).ok(), Some("ppm"));
    }
}
