// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use super::{ColorSpace, JpegDecoderOptions, JpegInfo};
use crate::decode::DecoderContext;
use crate::error::{Error, Result};
use crate::render::render;
use crate::source::{ByteSource, SliceSource};
use crate::util::tracing_wrappers::*;

/// A fully decoded image: `height` rows of `width` pixels with `channels`
/// interleaved 8-bit samples each, without row padding.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub pixels: Vec<u8>,
    /// How the source components were interpreted.
    pub color_space: ColorSpace,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("color_space", &self.color_space)
            .field("pixels", &format_args!("[{} bytes]", self.pixels.len()))
            .finish()
    }
}

impl DecodedImage {
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.width * self.channels;
        &self.pixels[y * stride..(y + 1) * stride]
    }

    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let start = (y * self.width + x) * self.channels;
        &self.pixels[start..start + self.channels]
    }
}

pub struct JpegDecoder {
    options: JpegDecoderOptions,
}

impl JpegDecoder {
    pub fn new(options: JpegDecoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &JpegDecoderOptions {
        &self.options
    }

    /// Decodes one image from `src`. Nothing after EOI is read.
    pub fn decode<S: ByteSource + ?Sized>(&self, src: &mut S) -> Result<DecodedImage> {
        let mut ctx = DecoderContext::new(self.options.limits.clone());
        ctx.read_headers(src)?;
        let info = JpegInfo::from_context(&ctx).ok_or(Error::TruncatedStream)?;
        let channels = self.options.channels_for(info.num_components())?;
        ctx.allocate()?;
        ctx.decode_scans(src)?;
        ctx.finish()?;
        debug!(
            width = info.width,
            height = info.height,
            channels,
            color_space = %info.color_space,
            scans = ctx.scans_decoded,
            "rendering"
        );
        let pixels = render(
            &ctx.components,
            (info.width, info.height),
            info.color_space,
            channels,
        )?;
        Ok(DecodedImage {
            width: info.width,
            height: info.height,
            channels,
            pixels,
            color_space: info.color_space,
        })
    }
}

/// Decodes `bytes` with default limits. `requested_channels` is 0 for the
/// natural channel count (3 for color sources, 1 for grayscale) or 1 to 4.
///
/// ```
/// let err = jpeg::decode(&[0x89, b'P', b'N', b'G'], 0).unwrap_err();
/// assert_eq!(err.kind(), jpeg::error::ErrorKind::MalformedContainer);
/// ```
pub fn decode(bytes: &[u8], requested_channels: u8) -> Result<DecodedImage> {
    decode_with_options(
        bytes,
        &JpegDecoderOptions::default().with_output_channels(requested_channels),
    )
}

pub fn decode_with_options(bytes: &[u8], options: &JpegDecoderOptions) -> Result<DecodedImage> {
    JpegDecoder::new(options.clone()).decode(&mut SliceSource::new(bytes))
}
