// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::error::{Error, Result};
use crate::headers::FrameHeader;
use crate::source::ByteSource;
use crate::{MAX_COMPONENTS, NUM_TABLE_SLOTS};

/// Largest successive-approximation shift accepted for 8-bit data.
const MAX_SUCCESSIVE_APPROXIMATION: u8 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanComponent {
    /// Index into the frame's component list.
    pub component: usize,
    pub dc_table: u8,
    pub ac_table: u8,
}

#[derive(Debug, Clone)]
pub struct ScanHeader {
    pub components: Vec<ScanComponent>,
    pub spectral_start: u8,
    pub spectral_end: u8,
    pub succ_high: u8,
    pub succ_low: u8,
}

/// What a scan contributes to the coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// All 64 coefficients of every block, sequential mode.
    Baseline,
    DcFirst {
        succ_low: u8,
    },
    DcRefine {
        succ_low: u8,
    },
    AcFirst {
        spectral_start: u8,
        spectral_end: u8,
        succ_low: u8,
    },
    AcRefine {
        spectral_start: u8,
        spectral_end: u8,
        succ_low: u8,
    },
}

impl ScanKind {
    pub fn is_dc(&self) -> bool {
        matches!(self, ScanKind::DcFirst { .. } | ScanKind::DcRefine { .. })
    }

    pub fn is_ac(&self) -> bool {
        matches!(self, ScanKind::AcFirst { .. } | ScanKind::AcRefine { .. })
    }
}

impl ScanHeader {
    /// Parses an SOS segment. Component selectors are resolved against
    /// `frame`.
    pub fn read<S: ByteSource + ?Sized>(
        src: &mut S,
        marker: u8,
        length: u16,
        frame: &FrameHeader,
    ) -> Result<ScanHeader> {
        let num_components = src.read_byte()?;
        if num_components == 0
            || num_components as usize > MAX_COMPONENTS
            || num_components as usize > frame.components.len()
        {
            return Err(Error::BadScanComponentCount(num_components));
        }
        if length != 6 + 2 * num_components as u16 {
            return Err(Error::BadSegmentLength(marker, length));
        }
        let mut components = Vec::with_capacity(num_components as usize);
        for _ in 0..num_components {
            let id = src.read_byte()?;
            let tables = src.read_byte()?;
            let component = frame
                .component_index(id)
                .ok_or(Error::BadSosComponent(id))?;
            let (dc_table, ac_table) = (tables >> 4, tables & 15);
            if dc_table as usize >= NUM_TABLE_SLOTS {
                return Err(Error::MissingHuffmanTable("DC", dc_table));
            }
            if ac_table as usize >= NUM_TABLE_SLOTS {
                return Err(Error::MissingHuffmanTable("AC", ac_table));
            }
            components.push(ScanComponent {
                component,
                dc_table,
                ac_table,
            });
        }
        let spectral_start = src.read_byte()?;
        let spectral_end = src.read_byte()?;
        let approximation = src.read_byte()?;
        Ok(ScanHeader {
            components,
            spectral_start,
            spectral_end,
            succ_high: approximation >> 4,
            succ_low: approximation & 15,
        })
    }

    /// Validates the spectral selection and successive approximation
    /// parameters for the frame's coding process.
    pub fn kind(&self, progressive: bool) -> Result<ScanKind> {
        let (ss, se, ah, al) = (
            self.spectral_start,
            self.spectral_end,
            self.succ_high,
            self.succ_low,
        );
        if !progressive {
            // Se is ignored in sequential mode; all 64 coefficients are coded.
            if ss != 0 || ah != 0 || al != 0 {
                return Err(Error::BadBaselineScan(ss, se, ah, al));
            }
            return Ok(ScanKind::Baseline);
        }

        let bad = || Error::BadProgression(ss, se, ah, al);
        if ss > se
            || se > 63
            || ah > MAX_SUCCESSIVE_APPROXIMATION
            || al > MAX_SUCCESSIVE_APPROXIMATION
        {
            return Err(bad());
        }
        if ss == 0 && se != 0 {
            return Err(bad());
        }
        if ss != 0 && self.components.len() != 1 {
            return Err(bad());
        }
        if ah != 0 && al + 1 != ah {
            return Err(bad());
        }
        Ok(match (ss, ah) {
            (0, 0) => ScanKind::DcFirst { succ_low: al },
            (0, _) => ScanKind::DcRefine { succ_low: al },
            (_, 0) => ScanKind::AcFirst {
                spectral_start: ss,
                spectral_end: se,
                succ_low: al,
            },
            _ => ScanKind::AcRefine {
                spectral_start: ss,
                spectral_end: se,
                succ_low: al,
            },
        })
    }
}
