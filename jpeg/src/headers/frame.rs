// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{Error, Result};
use crate::headers::JpegSegment;
use crate::headers::markers::{SOF0, SOF1, SOF2};
use crate::source::ByteSource;
use crate::{BLOCK_DIM, MAX_COMPONENTS, NUM_TABLE_SLOTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingProcess {
    Baseline,
    ExtendedSequential,
    Progressive,
}

impl CodingProcess {
    /// Maps a SOF marker code to a supported Huffman process.
    pub fn from_marker(marker: u8) -> Result<CodingProcess> {
        match marker {
            SOF0 => Ok(CodingProcess::Baseline),
            SOF1 => Ok(CodingProcess::ExtendedSequential),
            SOF2 => Ok(CodingProcess::Progressive),
            _ => Err(Error::UnsupportedProcess(marker)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    pub id: u8,
    pub h_samp_factor: u8,
    pub v_samp_factor: u8,
    pub quant_table: u8,
}

#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub process: CodingProcess,
    pub width: u16,
    pub height: u16,
    pub components: Vec<ComponentInfo>,
}

impl JpegSegment for FrameHeader {
    fn read<S: ByteSource + ?Sized>(src: &mut S, marker: u8, length: u16) -> Result<Self> {
        let process = CodingProcess::from_marker(marker)?;
        if length < 11 {
            return Err(Error::BadSegmentLength(marker, length));
        }
        let precision = src.read_byte()?;
        if precision != 8 {
            return Err(Error::UnsupportedPrecision(precision));
        }
        let height = src.read_u16_be()?;
        let width = src.read_u16_be()?;
        if width == 0 || height == 0 {
            return Err(Error::InvalidImageSize(width as u32, height as u32));
        }
        let num_components = src.read_byte()?;
        if !matches!(num_components, 1 | 3 | 4) {
            return Err(Error::UnsupportedComponentCount(num_components));
        }
        if length != 8 + 3 * num_components as u16 {
            return Err(Error::BadSegmentLength(marker, length));
        }

        let mut components: Vec<ComponentInfo> = Vec::with_capacity(MAX_COMPONENTS);
        for _ in 0..num_components {
            let id = src.read_byte()?;
            let hv = src.read_byte()?;
            let quant_table = src.read_byte()?;
            let (h, v) = (hv >> 4, hv & 15);
            if !(1..=4).contains(&h) || !(1..=4).contains(&v) {
                return Err(Error::BadSamplingFactors(h, v, id));
            }
            if quant_table as usize >= NUM_TABLE_SLOTS {
                return Err(Error::BadQuantTableIndex(quant_table));
            }
            if components.iter().any(|c| c.id == id) {
                return Err(Error::DuplicateComponentId(id));
            }
            components.push(ComponentInfo {
                id,
                h_samp_factor: h,
                v_samp_factor: v,
                quant_table,
            });
        }

        let frame = FrameHeader {
            process,
            width,
            height,
            components,
        };
        let (h_max, v_max) = (frame.h_max(), frame.v_max());
        for c in frame.components.iter() {
            if h_max % c.h_samp_factor != 0 {
                return Err(Error::UnsupportedSamplingRatio(h_max, c.h_samp_factor));
            }
            if v_max % c.v_samp_factor != 0 {
                return Err(Error::UnsupportedSamplingRatio(v_max, c.v_samp_factor));
            }
        }
        Ok(frame)
    }
}

impl FrameHeader {
    pub fn is_progressive(&self) -> bool {
        self.process == CodingProcess::Progressive
    }

    pub fn h_max(&self) -> u8 {
        self.components
            .iter()
            .map(|c| c.h_samp_factor)
            .max()
            .unwrap_or(1)
    }

    pub fn v_max(&self) -> u8 {
        self.components
            .iter()
            .map(|c| c.v_samp_factor)
            .max()
            .unwrap_or(1)
    }

    /// MCU size in pixels.
    pub fn mcu_size(&self) -> (usize, usize) {
        (
            self.h_max() as usize * BLOCK_DIM,
            self.v_max() as usize * BLOCK_DIM,
        )
    }

    /// Number of MCUs per row and per column of an interleaved scan.
    pub fn mcus(&self) -> (usize, usize) {
        let (mcu_w, mcu_h) = self.mcu_size();
        (
            (self.width as usize).div_ceil(mcu_w),
            (self.height as usize).div_ceil(mcu_h),
        )
    }

    /// Samples actually covered by the image in component `c`.
    pub fn component_size(&self, c: usize) -> (usize, usize) {
        let info = &self.components[c];
        (
            (self.width as usize * info.h_samp_factor as usize).div_ceil(self.h_max() as usize),
            (self.height as usize * info.v_samp_factor as usize)
                .div_ceil(self.v_max() as usize),
        )
    }

    /// Blocks per row and column in the MCU-aligned plane of component `c`.
    pub fn component_blocks(&self, c: usize) -> (usize, usize) {
        let info = &self.components[c];
        let (mcus_x, mcus_y) = self.mcus();
        (
            mcus_x * info.h_samp_factor as usize,
            mcus_y * info.v_samp_factor as usize,
        )
    }

    pub fn component_index(&self, id: u8) -> Option<usize> {
        self.components.iter().position(|c| c.id == id)
    }
}
