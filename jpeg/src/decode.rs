// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! The marker-level state machine and the per-frame decoding state.

pub mod block;
pub mod scan;

use jpeg_transforms::idct8x8;

use crate::api::JpegDecoderLimits;
use crate::entropy_coding::huffman::HuffmanTable;
use crate::error::{Error, Result};
use crate::headers::markers::{SOI, SOS};
use crate::headers::tables::{RestartInterval, TableClass};
use crate::headers::{
    AdobeTransform, AppSegment, ComponentInfo, FrameHeader, HuffmanTableSegment, JpegSegment,
    Marker, QuantTable, QuantTableSegment, ScanHeader, read_segment, read_segment_length,
    skip_segment,
};
use crate::image::{CoefficientImage, Image};
use crate::source::ByteSource;
use crate::util::tracing_wrappers::*;
use crate::{BLOCK_DIM, BLOCK_SIZE, NUM_TABLE_SLOTS};
use scan::{ScanEnd, decode_scan};

/// Value of samples that no scan has written to.
const UNCODED_SAMPLE: u8 = 128;

/// Tables installed by DHT and DQT segments. Later definitions replace
/// earlier ones in the same slot.
pub struct Tables {
    pub dc: [Option<HuffmanTable>; NUM_TABLE_SLOTS],
    pub ac: [Option<HuffmanTable>; NUM_TABLE_SLOTS],
    pub quant: [Option<QuantTable>; NUM_TABLE_SLOTS],
}

impl Tables {
    fn new() -> Tables {
        Tables {
            dc: array_init::array_init(|_| None),
            ac: array_init::array_init(|_| None),
            quant: array_init::array_init(|_| None),
        }
    }
}

/// Per-component decoding state.
#[derive(Debug)]
pub struct Component {
    pub info: ComponentInfo,
    /// Samples covered by the image.
    pub size: (usize, usize),
    /// Horizontal and vertical upsampling factors to full resolution.
    pub ratio: (usize, usize),
    /// Samples for the whole MCU-aligned block grid.
    pub plane: Image<u8>,
    /// Coefficients accumulated across progressive scans.
    pub coefficients: Option<CoefficientImage>,
    pub dc_pred: i32,
}

/// Result of looking for the next marker between segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerSearch {
    Found(u8),
    /// The stream ended after an `FF` byte was seen.
    TruncatedMarker,
    Exhausted,
}

/// Skips to the next marker. `FF 00` pairs and fill bytes are skipped.
fn find_marker<S: ByteSource + ?Sized>(src: &mut S) -> Result<MarkerSearch> {
    let mut seen_ff = false;
    let mut skipped = 0usize;
    loop {
        if src.at_eof() {
            return Ok(if seen_ff {
                MarkerSearch::TruncatedMarker
            } else {
                MarkerSearch::Exhausted
            });
        }
        let byte = src.read_byte()?;
        if byte != 0xff {
            skipped += 1;
            continue;
        }
        seen_ff = true;
        let mut code = 0xff;
        while code == 0xff {
            if src.at_eof() {
                return Ok(MarkerSearch::TruncatedMarker);
            }
            code = src.read_byte()?;
        }
        if code != 0x00 {
            if skipped > 0 {
                debug!(skipped, "skipped bytes before marker");
            }
            return Ok(MarkerSearch::Found(code));
        }
        skipped += 2;
    }
}

pub struct DecoderContext {
    limits: JpegDecoderLimits,
    pub frame: Option<FrameHeader>,
    pub components: Vec<Component>,
    pub tables: Tables,
    pub restart_interval: u16,
    pub jfif: bool,
    pub adobe: Option<AdobeTransform>,
    pub scans_decoded: usize,
}

impl DecoderContext {
    pub fn new(limits: JpegDecoderLimits) -> DecoderContext {
        DecoderContext {
            limits,
            frame: None,
            components: Vec::new(),
            tables: Tables::new(),
            restart_interval: 0,
            jfif: false,
            adobe: None,
            scans_decoded: 0,
        }
    }

    /// Reads SOI and every segment up to and including the frame header.
    pub fn read_headers<S: ByteSource + ?Sized>(&mut self, src: &mut S) -> Result<&FrameHeader> {
        let b0 = src.read_byte()?;
        let b1 = src.read_byte()?;
        if b0 != 0xff || b1 != SOI {
            return Err(Error::NoSoiMarker(b0, b1));
        }
        while self.frame.is_none() {
            let code = match find_marker(src)? {
                MarkerSearch::Found(code) => code,
                MarkerSearch::TruncatedMarker | MarkerSearch::Exhausted => {
                    return Err(Error::TruncatedStream);
                }
            };
            self.process_marker(src, code)?;
        }
        self.frame.as_ref().ok_or(Error::TruncatedStream)
    }

    /// Handles a segment that is valid both before and after the frame
    /// header.
    fn process_marker<S: ByteSource + ?Sized>(&mut self, src: &mut S, code: u8) -> Result<()> {
        let marker = Marker::from(code);
        trace!(?marker, "marker");
        match marker {
            Marker::Dqt => {
                let segment: QuantTableSegment = read_segment(src, code)?;
                for (slot, table) in segment.tables {
                    self.tables.quant[slot as usize] = Some(table);
                }
            }
            Marker::Dht => {
                let segment: HuffmanTableSegment = read_segment(src, code)?;
                for definition in segment.tables {
                    let slots = match definition.class {
                        TableClass::Dc => &mut self.tables.dc,
                        TableClass::Ac => &mut self.tables.ac,
                    };
                    slots[definition.slot as usize] = Some(definition.table);
                }
            }
            Marker::Dri => {
                let RestartInterval(interval) = read_segment(src, code)?;
                debug!(interval, "restart interval");
                self.restart_interval = interval;
            }
            Marker::App(_) | Marker::Com => match read_segment(src, code)? {
                AppSegment::Jfif => self.jfif = true,
                AppSegment::Adobe(transform) => self.adobe = Some(transform),
                AppSegment::Other => {}
            },
            Marker::Sof(_) => {
                if self.frame.is_some() {
                    return Err(Error::DuplicateFrame);
                }
                let length = read_segment_length(src, code)?;
                let frame = FrameHeader::read(src, code, length)?;
                let pixels = frame.width as usize * frame.height as usize;
                if self.limits.max_pixels.is_some_and(|max| pixels > max) {
                    return Err(Error::ImageTooLarge(frame.width as u32, frame.height as u32));
                }
                debug!(
                    width = frame.width,
                    height = frame.height,
                    components = frame.components.len(),
                    process = ?frame.process,
                    "frame header"
                );
                self.frame = Some(frame);
            }
            Marker::Dac => return Err(Error::UnsupportedProcess(code)),
            Marker::Sos if self.frame.is_none() => return Err(Error::ScanBeforeFrame),
            Marker::Reserved(_) if self.frame.is_none() => return Err(Error::UnknownMarker(code)),
            Marker::Reserved(_) => {
                warn!(code, "skipping unknown marker segment");
                skip_segment(src, code)?;
            }
            Marker::Rst(_) | Marker::Tem if self.frame.is_some() => {
                trace!(code, "ignoring standalone marker");
            }
            Marker::Sos | Marker::Soi | Marker::Eoi | Marker::Dnl | Marker::Rst(_) | Marker::Tem => {
                return Err(Error::UnexpectedMarker(code));
            }
        }
        Ok(())
    }

    /// Allocates sample planes, and coefficient buffers for progressive
    /// frames.
    pub fn allocate(&mut self) -> Result<()> {
        let frame = self.frame.as_ref().ok_or(Error::TruncatedStream)?;
        let mut components = Vec::with_capacity(frame.components.len());
        for (c, info) in frame.components.iter().enumerate() {
            let blocks = frame.component_blocks(c);
            let plane_size = (
                blocks.0.checked_mul(BLOCK_DIM).ok_or(Error::ArithmeticOverflow)?,
                blocks.1.checked_mul(BLOCK_DIM).ok_or(Error::ArithmeticOverflow)?,
            );
            let coefficients = if frame.is_progressive() {
                Some(CoefficientImage::new_blocks(blocks)?)
            } else {
                None
            };
            debug!(
                id = info.id,
                h = info.h_samp_factor,
                v = info.v_samp_factor,
                ?plane_size,
                "component"
            );
            components.push(Component {
                info: *info,
                size: frame.component_size(c),
                ratio: (
                    (frame.h_max() / info.h_samp_factor) as usize,
                    (frame.v_max() / info.v_samp_factor) as usize,
                ),
                plane: Image::new_filled(plane_size, UNCODED_SAMPLE)?,
                coefficients,
                dc_pred: 0,
            });
        }
        self.components = components;
        Ok(())
    }

    /// Processes everything after the frame header up to EOI.
    ///
    /// A stream that ends after at least one scan, right after an `FF` byte,
    /// is accepted as if EOI had followed.
    pub fn decode_scans<S: ByteSource + ?Sized>(&mut self, src: &mut S) -> Result<()> {
        let mut pending = None;
        loop {
            let code = match pending.take() {
                Some(code) => code,
                None => match find_marker(src)? {
                    MarkerSearch::Found(code) => code,
                    MarkerSearch::TruncatedMarker | MarkerSearch::Exhausted => {
                        return Err(Error::TruncatedStream);
                    }
                },
            };
            match Marker::from(code) {
                Marker::Eoi if self.scans_decoded == 0 => return Err(Error::NoScans),
                Marker::Eoi => {
                    trace!("end of image");
                    return Ok(());
                }
                Marker::Sos => match self.process_scan(src)? {
                    ScanEnd::Marker(code) => pending = Some(code),
                    ScanEnd::TruncatedMarker => {
                        warn!("stream ends without EOI");
                        return Ok(());
                    }
                    ScanEnd::NoMarker => match find_marker(src)? {
                        MarkerSearch::Found(code) => pending = Some(code),
                        MarkerSearch::TruncatedMarker => {
                            warn!("stream ends without EOI");
                            return Ok(());
                        }
                        MarkerSearch::Exhausted => return Err(Error::TruncatedStream),
                    },
                },
                Marker::Dnl => self.process_dnl(src)?,
                _ => self.process_marker(src, code)?,
            }
        }
    }

    fn process_dnl<S: ByteSource + ?Sized>(&mut self, src: &mut S) -> Result<()> {
        let length = src.read_u16_be()?;
        let lines = src.read_u16_be()?;
        let height = self.frame.as_ref().map_or(0, |f| f.height);
        if length != 4 || lines != height {
            return Err(Error::BadDnl(length, lines));
        }
        trace!(lines, "DNL");
        Ok(())
    }

    fn process_scan<S: ByteSource + ?Sized>(&mut self, src: &mut S) -> Result<ScanEnd> {
        let frame = self.frame.as_ref().ok_or(Error::ScanBeforeFrame)?;
        if let Some(max_scans) = self.limits.max_scans {
            if self.scans_decoded >= max_scans {
                return Err(Error::TooManyScans(max_scans));
            }
        }
        let length = read_segment_length(src, SOS)?;
        let header = ScanHeader::read(src, SOS, length, frame)?;
        let kind = header.kind(frame.is_progressive())?;
        debug!(
            components = header.components.len(),
            ?kind,
            restart_interval = self.restart_interval,
            "scan"
        );
        let end = decode_scan(
            src,
            frame,
            &header,
            kind,
            &mut self.components,
            &self.tables,
            self.restart_interval,
        )?;
        self.scans_decoded += 1;
        trace!(?end, "scan finished");
        Ok(end)
    }

    /// Turns the coefficients of a progressive frame into samples. Uses the
    /// quantization tables in effect at the end of the stream.
    pub fn finish(&mut self) -> Result<()> {
        for component in self.components.iter_mut() {
            let Some(coefficients) = component.coefficients.as_ref() else {
                continue;
            };
            let slot = component.info.quant_table;
            let quant = self.tables.quant[slot as usize]
                .as_ref()
                .ok_or(Error::MissingQuantTable(slot))?;
            let (blocks_x, blocks_y) = coefficients.size();
            let stride = component.plane.size().0;
            let mut dequantized = [0i16; BLOCK_SIZE];
            for by in 0..blocks_y {
                for bx in 0..blocks_x {
                    let block = coefficients.block(bx, by);
                    for ((out, &coefficient), &q) in
                        dequantized.iter_mut().zip(block.iter()).zip(quant.iter())
                    {
                        *out = (coefficient as i32).wrapping_mul(q as i32) as i16;
                    }
                    idct8x8(
                        &dequantized,
                        component.plane.tail_mut(bx * BLOCK_DIM, by * BLOCK_DIM),
                        stride,
                    );
                }
            }
        }
        Ok(())
    }
}
