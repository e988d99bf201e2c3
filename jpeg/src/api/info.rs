// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use super::{ColorSpace, JpegDecoderLimits};
use crate::decode::DecoderContext;
use crate::error::Result;
use crate::headers::{AdobeTransform, CodingProcess};
use crate::source::{ByteSource, SliceSource};

/// Sampling factors of one frame component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSampling {
    pub id: u8,
    pub h_samp_factor: u8,
    pub v_samp_factor: u8,
}

/// What can be learned from a stream without decoding any scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegInfo {
    pub width: usize,
    pub height: usize,
    pub process: CodingProcess,
    pub components: Vec<ComponentSampling>,
    pub color_space: ColorSpace,
    /// Restart interval set before the frame header, 0 if none.
    pub restart_interval: u16,
    pub jfif: bool,
    pub adobe: Option<AdobeTransform>,
}

impl JpegInfo {
    pub fn is_progressive(&self) -> bool {
        self.process == CodingProcess::Progressive
    }

    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn from_context(ctx: &DecoderContext) -> Option<JpegInfo> {
        let frame = ctx.frame.as_ref()?;
        Some(JpegInfo {
            width: frame.width as usize,
            height: frame.height as usize,
            process: frame.process,
            components: frame
                .components
                .iter()
                .map(|c| ComponentSampling {
                    id: c.id,
                    h_samp_factor: c.h_samp_factor,
                    v_samp_factor: c.v_samp_factor,
                })
                .collect(),
            color_space: ColorSpace::detect(frame, ctx.jfif, ctx.adobe),
            restart_interval: ctx.restart_interval,
            jfif: ctx.jfif,
            adobe: ctx.adobe,
        })
    }
}

/// Parses the stream up to and including the frame header.
pub fn read_info(bytes: &[u8]) -> Result<JpegInfo> {
    read_info_from(&mut SliceSource::new(bytes))
}

pub fn read_info_from<S: ByteSource + ?Sized>(src: &mut S) -> Result<JpegInfo> {
    let mut ctx = DecoderContext::new(JpegDecoderLimits::default());
    ctx.read_headers(src)?;
    JpegInfo::from_context(&ctx).ok_or(crate::error::Error::TruncatedStream)
}
