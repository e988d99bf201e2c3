// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use super::JpegDecoderLimits;
use crate::error::{Error, Result};

#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct JpegDecoderOptions {
    /// Interleaved channels per output pixel. 0 picks 3 for color sources
    /// and 1 for grayscale; 1 to 4 force that many.
    pub output_channels: u8,
    pub limits: JpegDecoderLimits,
}

impl JpegDecoderOptions {
    pub fn with_output_channels(mut self, output_channels: u8) -> Self {
        self.output_channels = output_channels;
        self
    }

    pub fn with_limits(mut self, limits: JpegDecoderLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Number of output channels for a frame with `num_components`
    /// components.
    pub(crate) fn channels_for(&self, num_components: usize) -> Result<usize> {
        match self.output_channels {
            0 if num_components >= 3 => Ok(3),
            0 => Ok(1),
            n @ 1..=4 => Ok(n as usize),
            n => Err(Error::InvalidChannelCount(n)),
        }
    }
}
