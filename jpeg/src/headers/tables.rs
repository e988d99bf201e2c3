// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! DQT, DHT and DRI segments.

use crate::entropy_coding::huffman::{HuffmanTable, MAX_SYMBOLS};
use crate::error::{Error, Result};
use crate::headers::JpegSegment;
use crate::source::ByteSource;
use crate::util::tracing_wrappers::*;
use crate::{BLOCK_SIZE, DEZIGZAG, NUM_TABLE_SLOTS};

/// Quantizer steps in natural (row-major) order.
pub type QuantTable = [u16; BLOCK_SIZE];

/// All tables defined by one DQT segment.
#[derive(Debug)]
pub struct QuantTableSegment {
    pub tables: Vec<(u8, QuantTable)>,
}

impl JpegSegment for QuantTableSegment {
    fn read<S: ByteSource + ?Sized>(src: &mut S, marker: u8, length: u16) -> Result<Self> {
        let mut remaining = length as usize - 2;
        let mut tables = Vec::new();
        while remaining > 0 {
            let pq_tq = src.read_byte()?;
            let precision = pq_tq >> 4;
            let slot = pq_tq & 15;
            if precision > 1 || slot as usize >= NUM_TABLE_SLOTS {
                return Err(Error::BadQuantTable(precision, slot));
            }
            let size = 1 + BLOCK_SIZE * (precision as usize + 1);
            if remaining < size {
                return Err(Error::BadSegmentLength(marker, length));
            }
            let mut table = [0u16; BLOCK_SIZE];
            for &natural in DEZIGZAG.iter() {
                table[natural] = if precision == 1 {
                    src.read_u16_be()?
                } else {
                    src.read_byte()? as u16
                };
            }
            trace!(slot, precision, "quantization table");
            tables.push((slot, table));
            remaining -= size;
        }
        Ok(QuantTableSegment { tables })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableClass {
    Dc,
    Ac,
}

#[derive(Debug)]
pub struct HuffmanTableDefinition {
    pub class: TableClass,
    pub slot: u8,
    pub table: HuffmanTable,
}

/// All tables defined by one DHT segment. AC tables come with their
/// run/level lookup already built.
#[derive(Debug)]
pub struct HuffmanTableSegment {
    pub tables: Vec<HuffmanTableDefinition>,
}

impl JpegSegment for HuffmanTableSegment {
    fn read<S: ByteSource + ?Sized>(src: &mut S, marker: u8, length: u16) -> Result<Self> {
        let mut remaining = length as usize - 2;
        let mut tables = Vec::new();
        while remaining > 0 {
            if remaining < 17 {
                return Err(Error::BadSegmentLength(marker, length));
            }
            let tc_th = src.read_byte()?;
            let class = tc_th >> 4;
            let slot = tc_th & 15;
            if class > 1 || slot as usize >= NUM_TABLE_SLOTS {
                return Err(Error::BadHuffmanHeader(class, slot));
            }
            let mut counts = [0u8; 16];
            for count in counts.iter_mut() {
                *count = src.read_byte()?;
            }
            remaining -= 17;
            let num_symbols: usize = counts.iter().map(|&c| c as usize).sum();
            if num_symbols > MAX_SYMBOLS {
                return Err(Error::TooManyHuffmanSymbols(num_symbols));
            }
            if remaining < num_symbols {
                return Err(Error::BadSegmentLength(marker, length));
            }
            let mut values = [0u8; MAX_SYMBOLS];
            for value in values[..num_symbols].iter_mut() {
                *value = src.read_byte()?;
            }
            remaining -= num_symbols;

            let table = HuffmanTable::build(&counts, &values[..num_symbols])?;
            let (class, table) = if class == 0 {
                (TableClass::Dc, table)
            } else {
                (TableClass::Ac, table.with_fast_ac())
            };
            trace!(?class, slot, num_symbols, "Huffman table");
            tables.push(HuffmanTableDefinition { class, slot, table });
        }
        Ok(HuffmanTableSegment { tables })
    }
}

/// Define-restart-interval segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartInterval(pub u16);

impl JpegSegment for RestartInterval {
    fn read<S: ByteSource + ?Sized>(src: &mut S, marker: u8, length: u16) -> Result<Self> {
        if length != 4 {
            return Err(Error::BadSegmentLength(marker, length));
        }
        Ok(RestartInterval(src.read_u16_be()?))
    }
}
