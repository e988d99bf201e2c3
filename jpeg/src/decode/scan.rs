// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Iteration over the data units of one scan, with restart handling.

use jpeg_transforms::idct8x8;

use crate::bit_reader::BitReader;
use crate::decode::block::{
    decode_ac_first, decode_ac_refine, decode_baseline, decode_dc_first, decode_dc_refine,
};
use crate::decode::{Component, Tables};
use crate::entropy_coding::huffman::HuffmanTable;
use crate::error::{Error, Result};
use crate::headers::markers::{RST0, RST7, SOS};
use crate::headers::{FrameHeader, QuantTable, ScanHeader, ScanKind};
use crate::image::CoefficientImage;
use crate::source::ByteSource;
use crate::util::tracing_wrappers::*;
use crate::{BLOCK_DIM, BLOCK_SIZE};

/// How the entropy-coded segment of a scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// The segment ran into this marker, which has been consumed.
    Marker(u8),
    /// The stream ended right after one or more `FF` bytes.
    TruncatedMarker,
    /// The decoder stopped without seeing a marker; there may be padding
    /// before the next one.
    NoMarker,
}

/// Tables a scan component decodes with, resolved once per scan.
struct UnitTables<'t> {
    dc: Option<&'t HuffmanTable>,
    ac: Option<&'t HuffmanTable>,
    quant: Option<&'t QuantTable>,
    dc_slot: u8,
    ac_slot: u8,
    quant_slot: u8,
}

impl<'t> UnitTables<'t> {
    fn dc(&self) -> Result<&'t HuffmanTable> {
        self.dc.ok_or(Error::MissingHuffmanTable("DC", self.dc_slot))
    }

    fn ac(&self) -> Result<&'t HuffmanTable> {
        self.ac.ok_or(Error::MissingHuffmanTable("AC", self.ac_slot))
    }

    fn quant(&self) -> Result<&'t QuantTable> {
        self.quant.ok_or(Error::MissingQuantTable(self.quant_slot))
    }
}

struct ScanDecoder<'a, 't, S: ByteSource + ?Sized> {
    br: BitReader<'a, S>,
    kind: ScanKind,
    eob_run: u32,
    restart_interval: u32,
    units_to_restart: u32,
    tables: Vec<UnitTables<'t>>,
}

fn huffman_table<'t>(
    slots: &'t [Option<HuffmanTable>],
    class: &'static str,
    slot: u8,
) -> Result<&'t HuffmanTable> {
    slots[slot as usize]
        .as_ref()
        .ok_or(Error::MissingHuffmanTable(class, slot))
}

fn coefficients_mut(
    coefficients: &mut Option<CoefficientImage>,
) -> Result<&mut CoefficientImage> {
    coefficients.as_mut().ok_or(Error::UnexpectedMarker(SOS))
}

impl<'a, 't, S: ByteSource + ?Sized> ScanDecoder<'a, 't, S> {
    fn new(
        src: &'a mut S,
        header: &ScanHeader,
        kind: ScanKind,
        components: &[Component],
        tables: &'t Tables,
        restart_interval: u16,
    ) -> Result<Self> {
        let mut unit_tables = Vec::with_capacity(header.components.len());
        for sc in header.components.iter() {
            let needs_dc = matches!(kind, ScanKind::Baseline | ScanKind::DcFirst { .. });
            let needs_ac = kind == ScanKind::Baseline || kind.is_ac();
            let quant_slot = components[sc.component].info.quant_table;
            unit_tables.push(UnitTables {
                dc: if needs_dc {
                    Some(huffman_table(&tables.dc, "DC", sc.dc_table)?)
                } else {
                    None
                },
                ac: if needs_ac {
                    Some(huffman_table(&tables.ac, "AC", sc.ac_table)?)
                } else {
                    None
                },
                quant: if kind == ScanKind::Baseline {
                    Some(
                        tables.quant[quant_slot as usize]
                            .as_ref()
                            .ok_or(Error::MissingQuantTable(quant_slot))?,
                    )
                } else {
                    None
                },
                dc_slot: sc.dc_table,
                ac_slot: sc.ac_table,
                quant_slot,
            });
        }
        let restart_interval = if restart_interval == 0 {
            u32::MAX
        } else {
            restart_interval as u32
        };
        Ok(ScanDecoder {
            br: BitReader::new(src),
            kind,
            eob_run: 0,
            restart_interval,
            units_to_restart: restart_interval,
            tables: unit_tables,
        })
    }

    fn decode_unit(
        &mut self,
        component: &mut Component,
        scan_index: usize,
        bx: usize,
        by: usize,
    ) -> Result<()> {
        let tables = &self.tables[scan_index];
        let br = &mut self.br;
        match self.kind {
            ScanKind::Baseline => {
                let mut block = [0i16; BLOCK_SIZE];
                decode_baseline(
                    br,
                    tables.dc()?,
                    tables.ac()?,
                    tables.quant()?,
                    &mut component.dc_pred,
                    &mut block,
                )?;
                let stride = component.plane.size().0;
                idct8x8(
                    &block,
                    component.plane.tail_mut(bx * BLOCK_DIM, by * BLOCK_DIM),
                    stride,
                );
            }
            ScanKind::DcFirst { succ_low } => {
                let dc = tables.dc()?;
                let block = coefficients_mut(&mut component.coefficients)?.block_mut(bx, by);
                decode_dc_first(br, dc, &mut component.dc_pred, succ_low, block)?;
            }
            ScanKind::DcRefine { succ_low } => decode_dc_refine(
                br,
                succ_low,
                coefficients_mut(&mut component.coefficients)?.block_mut(bx, by),
            ),
            ScanKind::AcFirst {
                spectral_start,
                spectral_end,
                succ_low,
            } => decode_ac_first(
                br,
                tables.ac()?,
                spectral_start,
                spectral_end,
                succ_low,
                &mut self.eob_run,
                coefficients_mut(&mut component.coefficients)?.block_mut(bx, by),
            )?,
            ScanKind::AcRefine {
                spectral_start,
                spectral_end,
                succ_low,
            } => decode_ac_refine(
                br,
                tables.ac()?,
                spectral_start,
                spectral_end,
                succ_low,
                &mut self.eob_run,
                coefficients_mut(&mut component.coefficients)?.block_mut(bx, by),
            )?,
        }
        Ok(())
    }

    /// Counts down to the next restart marker. Returns false if the scan has
    /// to stop because the expected marker is not there.
    fn restart_if_due(&mut self, components: &mut [Component], last_unit: bool) -> bool {
        self.units_to_restart -= 1;
        if self.units_to_restart > 0 {
            return true;
        }
        self.br.ensure(24);
        match self.br.marker() {
            Some(marker @ RST0..=RST7) => {
                trace!(marker, "restart");
                self.br.reset();
                for c in components.iter_mut() {
                    c.dc_pred = 0;
                }
                self.eob_run = 0;
                self.units_to_restart = self.restart_interval;
                true
            }
            _ => {
                if !last_unit {
                    warn!("missing restart marker, ending scan early");
                }
                false
            }
        }
    }

    /// Replaces a decoding error with the source error that caused it, if
    /// the segment was cut short by a failed read.
    fn source_error_or(&mut self, err: Error) -> Error {
        self.br.take_error().unwrap_or(err)
    }

    fn end(&mut self) -> Result<ScanEnd> {
        if let Some(err) = self.br.take_error() {
            return Err(err);
        }
        Ok(if let Some(marker) = self.br.marker() {
            ScanEnd::Marker(marker)
        } else if self.br.hit_truncated_marker() {
            ScanEnd::TruncatedMarker
        } else {
            ScanEnd::NoMarker
        })
    }
}

/// Decodes the entropy-coded segment that follows an SOS header.
///
/// Sequential scans write finished samples into the component planes;
/// progressive scans update the coefficient buffers. Predictors are reset
/// at the start of the scan and at every restart marker.
pub fn decode_scan<S: ByteSource + ?Sized>(
    src: &mut S,
    frame: &FrameHeader,
    header: &ScanHeader,
    kind: ScanKind,
    components: &mut [Component],
    tables: &Tables,
    restart_interval: u16,
) -> Result<ScanEnd> {
    let mut decoder = ScanDecoder::new(src, header, kind, components, tables, restart_interval)?;
    for c in components.iter_mut() {
        c.dc_pred = 0;
    }

    if let [sc] = header.components.as_slice() {
        // Non-interleaved: one block per unit, only blocks inside the image.
        let (width, height) = frame.component_size(sc.component);
        let (blocks_x, blocks_y) = (width.div_ceil(BLOCK_DIM), height.div_ceil(BLOCK_DIM));
        for by in 0..blocks_y {
            for bx in 0..blocks_x {
                decoder
                    .decode_unit(&mut components[sc.component], 0, bx, by)
                    .map_err(|err| decoder.source_error_or(err))?;
                let last = bx + 1 == blocks_x && by + 1 == blocks_y;
                if !decoder.restart_if_due(components, last) {
                    return decoder.end();
                }
            }
        }
    } else {
        let (mcus_x, mcus_y) = frame.mcus();
        for mcu_y in 0..mcus_y {
            for mcu_x in 0..mcus_x {
                for (scan_index, sc) in header.components.iter().enumerate() {
                    let component = &mut components[sc.component];
                    let h = component.info.h_samp_factor as usize;
                    let v = component.info.v_samp_factor as usize;
                    for y in 0..v {
                        for x in 0..h {
                            decoder
                                .decode_unit(component, scan_index, mcu_x * h + x, mcu_y * v + y)
                                .map_err(|err| decoder.source_error_or(err))?;
                        }
                    }
                }
                let last = mcu_x + 1 == mcus_x && mcu_y + 1 == mcus_y;
                if !decoder.restart_if_due(components, last) {
                    return decoder.end();
                }
            }
        }
    }
    decoder.end()
}
