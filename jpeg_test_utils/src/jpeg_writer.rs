// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! A small JPEG encoder back end: serializes already quantized coefficient
//! blocks as baseline or progressive streams with per-scan optimal Huffman
//! tables.

use crate::BitWriter;

/// Quantized DCT coefficients in row-major (natural) order.
pub type Block = [i16; 64];

/// Natural index of each zigzag position.
#[rustfmt::skip]
pub const ZIGZAG: [usize; 64] = [
     0,  1,  8, 16,  9,  2,  3, 10,
    17, 24, 32, 25, 18, 11,  4,  5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13,  6,  7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

pub const SOF0: u8 = 0xc0;
pub const SOF1: u8 = 0xc1;
pub const SOF2: u8 = 0xc2;
pub const DHT: u8 = 0xc4;
pub const RST0: u8 = 0xd0;
pub const SOI: u8 = 0xd8;
pub const EOI: u8 = 0xd9;
pub const SOS: u8 = 0xda;
pub const DQT: u8 = 0xdb;
pub const DRI: u8 = 0xdd;
pub const APP0: u8 = 0xe0;
pub const APP14: u8 = 0xee;
pub const COM: u8 = 0xfe;

/// A block whose only non-zero coefficient is DC.
pub fn dc_block(dc: i16) -> Block {
    let mut block = [0; 64];
    block[0] = dc;
    block
}

/// Quantized DC value that makes a flat block decode to `sample`, given the
/// DC quantizer `q`.
pub fn dc_for_sample(sample: u8, q: u16) -> i16 {
    let scaled = (sample as i32 - 128) * 8;
    let q = q as i32;
    // Round to nearest.
    let dc = if scaled >= 0 {
        (scaled + q / 2) / q
    } else {
        (scaled - q / 2) / q
    };
    dc as i16
}

#[derive(Debug, Clone)]
pub struct WriterComponent {
    pub id: u8,
    pub h: u8,
    pub v: u8,
    pub quant_table: u8,
    /// One block per position of the MCU-aligned grid, row-major.
    pub blocks: Vec<Block>,
}

/// Parameters of one scan. `components` index the frame components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSpec {
    pub components: Vec<usize>,
    pub ss: u8,
    pub se: u8,
    pub ah: u8,
    pub al: u8,
}

impl ScanSpec {
    pub fn sequential(components: Vec<usize>) -> ScanSpec {
        ScanSpec {
            components,
            ss: 0,
            se: 63,
            ah: 0,
            al: 0,
        }
    }

    pub fn dc(components: Vec<usize>, ah: u8, al: u8) -> ScanSpec {
        ScanSpec {
            components,
            ss: 0,
            se: 0,
            ah,
            al,
        }
    }

    pub fn ac(component: usize, ss: u8, se: u8, ah: u8, al: u8) -> ScanSpec {
        ScanSpec {
            components: vec![component],
            ss,
            se,
            ah,
            al,
        }
    }
}

/// A progression with spectral selection and two levels of successive
/// approximation for every component.
pub fn simple_progression(num_components: usize) -> Vec<ScanSpec> {
    let all: Vec<usize> = (0..num_components).collect();
    let mut scans = vec![ScanSpec::dc(all.clone(), 0, 1)];
    scans.extend(all.iter().map(|&c| ScanSpec::ac(c, 1, 5, 0, 2)));
    scans.extend(all.iter().map(|&c| ScanSpec::ac(c, 6, 63, 0, 2)));
    scans.extend(all.iter().map(|&c| ScanSpec::ac(c, 1, 63, 2, 1)));
    scans.push(ScanSpec::dc(all.clone(), 1, 0));
    scans.extend(all.iter().map(|&c| ScanSpec::ac(c, 1, 63, 1, 0)));
    scans
}

#[derive(Debug, Clone)]
pub struct JpegWriter {
    pub width: u16,
    pub height: u16,
    pub components: Vec<WriterComponent>,
    /// Quantization tables in natural order, by slot.
    pub quant_tables: Vec<[u16; 64]>,
    pub restart_interval: u16,
    pub jfif: bool,
    pub adobe_transform: Option<u8>,
    /// Raw `(marker, payload)` segments written after the APP segments.
    pub extra_segments: Vec<(u8, Vec<u8>)>,
    /// Restart markers to leave out, counted across the whole stream.
    pub omitted_restarts: Vec<usize>,
    pub omit_eoi: bool,
}

impl JpegWriter {
    /// A writer for a frame with the given sampling factors, component ids
    /// 1, 2, ..., all blocks zero and a single all-ones quantization table.
    pub fn new(width: u16, height: u16, sampling: &[(u8, u8)]) -> JpegWriter {
        let mut writer = JpegWriter {
            width,
            height,
            components: sampling
                .iter()
                .enumerate()
                .map(|(i, &(h, v))| WriterComponent {
                    id: i as u8 + 1,
                    h,
                    v,
                    quant_table: 0,
                    blocks: Vec::new(),
                })
                .collect(),
            quant_tables: vec![[1; 64]],
            restart_interval: 0,
            jfif: false,
            adobe_transform: None,
            extra_segments: Vec::new(),
            omitted_restarts: Vec::new(),
            omit_eoi: false,
        };
        for c in 0..writer.components.len() {
            let (w, h) = writer.block_grid(c);
            writer.components[c].blocks = vec![[0; 64]; w * h];
        }
        writer
    }

    pub fn with_ids(mut self, ids: &[u8]) -> JpegWriter {
        for (component, &id) in self.components.iter_mut().zip(ids) {
            component.id = id;
        }
        self
    }

    fn h_max(&self) -> usize {
        self.components.iter().map(|c| c.h as usize).max().unwrap_or(1)
    }

    fn v_max(&self) -> usize {
        self.components.iter().map(|c| c.v as usize).max().unwrap_or(1)
    }

    pub fn mcus(&self) -> (usize, usize) {
        (
            (self.width as usize).div_ceil(8 * self.h_max()),
            (self.height as usize).div_ceil(8 * self.v_max()),
        )
    }

    /// Blocks of the MCU-aligned grid of component `c`.
    pub fn block_grid(&self, c: usize) -> (usize, usize) {
        let (mx, my) = self.mcus();
        let component = &self.components[c];
        (mx * component.h as usize, my * component.v as usize)
    }

    /// Blocks covering the image area of component `c`; non-interleaved
    /// scans code exactly these.
    pub fn coded_blocks(&self, c: usize) -> (usize, usize) {
        let component = &self.components[c];
        let w = (self.width as usize * component.h as usize).div_ceil(self.h_max());
        let h = (self.height as usize * component.v as usize).div_ceil(self.v_max());
        (w.div_ceil(8), h.div_ceil(8))
    }

    pub fn block_mut(&mut self, c: usize, bx: usize, by: usize) -> &mut Block {
        let stride = self.block_grid(c).0;
        &mut self.components[c].blocks[by * stride + bx]
    }

    pub fn block(&self, c: usize, bx: usize, by: usize) -> &Block {
        let stride = self.block_grid(c).0;
        &self.components[c].blocks[by * stride + bx]
    }

    /// Sets every block of component `c` to a flat block with the given DC.
    pub fn fill_dc(&mut self, c: usize, dc: i16) {
        for block in self.components[c].blocks.iter_mut() {
            *block = dc_block(dc);
        }
    }

    /// One interleaved sequential scan over all components.
    pub fn baseline(&self) -> Vec<u8> {
        let all = (0..self.components.len()).collect();
        self.encode(SOF0, &[ScanSpec::sequential(all)])
    }

    /// Sequential scans, e.g. one per component.
    pub fn sequential(&self, scans: &[ScanSpec]) -> Vec<u8> {
        self.encode(SOF0, scans)
    }

    pub fn progressive(&self, scans: &[ScanSpec]) -> Vec<u8> {
        self.encode(SOF2, scans)
    }

    pub fn encode(&self, sof: u8, scans: &[ScanSpec]) -> Vec<u8> {
        let mut out = vec![0xff, SOI];
        if self.jfif {
            segment(
                &mut out,
                APP0,
                &[b'J', b'F', b'I', b'F', 0, 1, 1, 0, 0, 1, 0, 1, 0, 0],
            );
        }
        if let Some(transform) = self.adobe_transform {
            segment(
                &mut out,
                APP14,
                &[b'A', b'd', b'o', b'b', b'e', 0, 100, 0, 0, 0, 0, transform],
            );
        }
        for (marker, payload) in &self.extra_segments {
            segment(&mut out, *marker, payload);
        }
        for (slot, table) in self.quant_tables.iter().enumerate() {
            let wide = table.iter().any(|&q| q > 255);
            let mut payload = vec![((wide as u8) << 4) | slot as u8];
            for &k in ZIGZAG.iter() {
                if wide {
                    payload.extend(table[k].to_be_bytes());
                } else {
                    payload.push(table[k] as u8);
                }
            }
            segment(&mut out, DQT, &payload);
        }
        if self.restart_interval > 0 {
            segment(&mut out, DRI, &self.restart_interval.to_be_bytes());
        }
        let mut frame = vec![8];
        frame.extend(self.height.to_be_bytes());
        frame.extend(self.width.to_be_bytes());
        frame.push(self.components.len() as u8);
        for component in &self.components {
            frame.extend([
                component.id,
                (component.h << 4) | component.v,
                component.quant_table,
            ]);
        }
        segment(&mut out, sof, &frame);
        let mut restarts = 0;
        for spec in scans {
            let mut encoder = ScanEncoder::new(self, spec, sof == SOF2);
            encoder.run();
            encoder.write(&mut out, &mut restarts);
        }
        if !self.omit_eoi {
            out.extend([0xff, EOI]);
        }
        out
    }
}

/// Writes a marker segment with its length field.
pub fn segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.extend([0xff, marker]);
    out.extend((payload.len() as u16 + 2).to_be_bytes());
    out.extend_from_slice(payload);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Dc = 0,
    Ac = 1,
}

#[derive(Debug, Clone, Copy)]
enum Token {
    Symbol(Class, usize, u8),
    Bits(u32, u32),
    Restart,
}

/// Category and magnitude bits of a coefficient or DC difference.
fn magnitude(value: i32) -> (u32, u32) {
    let category = 32 - value.unsigned_abs().leading_zeros();
    let mask = (1u32 << category).wrapping_sub(1);
    let bits = if value < 0 {
        (value - 1) as u32 & mask
    } else {
        value as u32
    };
    (category, bits)
}

struct ScanEncoder<'w> {
    writer: &'w JpegWriter,
    spec: &'w ScanSpec,
    progressive: bool,
    tokens: Vec<Token>,
    dc_pred: [i32; 4],
    eob_run: u32,
    /// Correction bits of blocks covered by the pending EOB run.
    pending: Vec<u32>,
}

impl<'w> ScanEncoder<'w> {
    fn new(writer: &'w JpegWriter, spec: &'w ScanSpec, progressive: bool) -> ScanEncoder<'w> {
        ScanEncoder {
            writer,
            spec,
            progressive,
            tokens: Vec::new(),
            dc_pred: [0; 4],
            eob_run: 0,
            pending: Vec::new(),
        }
    }

    fn units(&self) -> Vec<Vec<(usize, usize, usize)>> {
        let mut units = Vec::new();
        if let [c] = self.spec.components[..] {
            let (w, h) = self.writer.coded_blocks(c);
            for by in 0..h {
                for bx in 0..w {
                    units.push(vec![(c, bx, by)]);
                }
            }
        } else {
            let (mx, my) = self.writer.mcus();
            for y in 0..my {
                for x in 0..mx {
                    let mut unit = Vec::new();
                    for &c in &self.spec.components {
                        let component = &self.writer.components[c];
                        let (h, v) = (component.h as usize, component.v as usize);
                        for dy in 0..v {
                            for dx in 0..h {
                                unit.push((c, x * h + dx, y * v + dy));
                            }
                        }
                    }
                    units.push(unit);
                }
            }
        }
        units
    }

    fn run(&mut self) {
        let interval = self.writer.restart_interval as usize;
        for (i, unit) in self.units().into_iter().enumerate() {
            if interval > 0 && i > 0 && i % interval == 0 {
                self.flush_eob_run();
                self.tokens.push(Token::Restart);
                self.dc_pred = [0; 4];
            }
            for (c, bx, by) in unit {
                let block = *self.writer.block(c, bx, by);
                self.encode_block(c, &block);
            }
        }
        self.flush_eob_run();
    }

    fn symbol(&mut self, class: Class, c: usize, symbol: u8) {
        self.tokens.push(Token::Symbol(class, c, symbol));
    }

    fn bits(&mut self, bits: u32, count: u32) {
        if count > 0 {
            self.tokens.push(Token::Bits(bits, count));
        }
    }

    fn dc_diff(&mut self, c: usize, value: i32) {
        let diff = value - self.dc_pred[c];
        self.dc_pred[c] = value;
        let (category, bits) = magnitude(diff);
        self.symbol(Class::Dc, c, category as u8);
        self.bits(bits, category);
    }

    fn encode_block(&mut self, c: usize, block: &Block) {
        let ScanSpec { ss, se, ah, al, .. } = *self.spec;
        if !self.progressive {
            self.encode_sequential(c, block);
        } else if ss == 0 && ah == 0 {
            self.dc_diff(c, block[0] as i32 >> al);
        } else if ss == 0 {
            self.bits((block[0] as i32 >> al) as u32 & 1, 1);
        } else if ah == 0 {
            self.encode_ac_first(c, block, ss as usize, se as usize, al);
        } else {
            self.encode_ac_refine(c, block, ss as usize, se as usize, al);
        }
    }

    fn encode_sequential(&mut self, c: usize, block: &Block) {
        self.dc_diff(c, block[0] as i32);
        let mut run = 0;
        for &k in &ZIGZAG[1..] {
            let value = block[k] as i32;
            if value == 0 {
                run += 1;
                continue;
            }
            while run > 15 {
                self.symbol(Class::Ac, c, 0xf0);
                run -= 16;
            }
            let (category, bits) = magnitude(value);
            self.symbol(Class::Ac, c, (run << 4) | category as u8);
            self.bits(bits, category);
            run = 0;
        }
        if run > 0 {
            self.symbol(Class::Ac, c, 0x00);
        }
    }

    fn ac_component(&self) -> usize {
        self.spec.components[0]
    }

    fn flush_eob_run(&mut self) {
        if self.eob_run > 0 {
            let nbits = 31 - self.eob_run.leading_zeros();
            let c = self.ac_component();
            self.symbol(Class::Ac, c, (nbits << 4) as u8);
            self.bits(self.eob_run, nbits);
            self.eob_run = 0;
        }
        for bit in std::mem::take(&mut self.pending) {
            self.bits(bit, 1);
        }
    }

    fn encode_ac_first(&mut self, c: usize, block: &Block, ss: usize, se: usize, al: u8) {
        let mut run = 0u8;
        for &k in &ZIGZAG[ss..=se] {
            let coefficient = block[k] as i32;
            let shifted = coefficient.abs() >> al;
            if shifted == 0 {
                run += 1;
                continue;
            }
            self.flush_eob_run();
            while run > 15 {
                self.symbol(Class::Ac, c, 0xf0);
                run -= 16;
            }
            let (category, bits) = magnitude(if coefficient < 0 { -shifted } else { shifted });
            self.symbol(Class::Ac, c, (run << 4) | category as u8);
            self.bits(bits, category);
            run = 0;
        }
        if run > 0 {
            self.eob_run += 1;
            if self.eob_run == 0x7fff {
                self.flush_eob_run();
            }
        }
    }

    fn encode_ac_refine(&mut self, c: usize, block: &Block, ss: usize, se: usize, al: u8) {
        let band = &ZIGZAG[ss..=se];
        let absolute: Vec<i32> = band.iter().map(|&k| (block[k] as i32).abs() >> al).collect();
        let last_new = absolute.iter().rposition(|&a| a == 1);
        let mut run = 0u8;
        let mut corrections = Vec::new();
        for (i, &a) in absolute.iter().enumerate() {
            if a == 0 {
                run += 1;
                continue;
            }
            while run > 15 && last_new.is_some_and(|last| i <= last) {
                self.flush_eob_run();
                self.symbol(Class::Ac, c, 0xf0);
                run -= 16;
                for bit in std::mem::take(&mut corrections) {
                    self.bits(bit, 1);
                }
            }
            if a > 1 {
                corrections.push((a & 1) as u32);
                continue;
            }
            self.flush_eob_run();
            self.symbol(Class::Ac, c, (run << 4) | 1);
            self.bits((block[band[i]] >= 0) as u32, 1);
            for bit in std::mem::take(&mut corrections) {
                self.bits(bit, 1);
            }
            run = 0;
        }
        if run > 0 || !corrections.is_empty() {
            self.eob_run += 1;
            self.pending.extend(corrections);
            if self.eob_run == 0x7fff || self.pending.len() > 937 {
                self.flush_eob_run();
            }
        }
    }

    /// Appends DHT (if any table is used), SOS and the entropy-coded data.
    fn write(&self, out: &mut Vec<u8>, restarts: &mut usize) {
        let mut frequencies = [[[0u32; 256]; 4]; 2];
        for token in &self.tokens {
            if let Token::Symbol(class, c, symbol) = *token {
                frequencies[class as usize][c][symbol as usize] += 1;
            }
        }
        let mut codes = [[[(0u16, 0u8); 256]; 4]; 2];
        let mut dht = Vec::new();
        for class in [Class::Dc, Class::Ac] {
            for c in 0..4 {
                let counts = &frequencies[class as usize][c];
                if counts.iter().all(|&f| f == 0) {
                    continue;
                }
                let (lengths, values) = optimal_table(counts);
                dht.push(((class as u8) << 4) | c as u8);
                dht.extend_from_slice(&lengths);
                dht.extend_from_slice(&values);
                codes[class as usize][c] = canonical_codes(&lengths, &values);
            }
        }
        if !dht.is_empty() {
            segment(out, DHT, &dht);
        }

        let mut sos = vec![self.spec.components.len() as u8];
        for &c in &self.spec.components {
            sos.extend([self.writer.components[c].id, ((c as u8) << 4) | c as u8]);
        }
        sos.extend([self.spec.ss, self.spec.se, (self.spec.ah << 4) | self.spec.al]);
        segment(out, SOS, &sos);

        let mut bw = BitWriter::new();
        let mut scan_restarts = 0u8;
        for token in &self.tokens {
            match *token {
                Token::Symbol(class, c, symbol) => {
                    let (code, length) = codes[class as usize][c][symbol as usize];
                    bw.write(code as u32, length as u32);
                }
                Token::Bits(bits, count) => bw.write(bits, count),
                Token::Restart => {
                    if self.writer.omitted_restarts.contains(restarts) {
                        bw.align();
                    } else {
                        bw.marker(RST0 + scan_restarts % 8);
                    }
                    scan_restarts = scan_restarts.wrapping_add(1);
                    *restarts += 1;
                }
            }
        }
        out.extend(bw.finish());
    }
}

/// Code lengths limited to 16 bits for the given symbol frequencies, with the
/// all-ones code left unused. Returns the DHT counts and symbols.
pub fn optimal_table(frequencies: &[u32; 256]) -> ([u8; 16], Vec<u8>) {
    // Symbol 256 reserves the all-ones code point.
    let mut freq: Vec<u64> = frequencies.iter().map(|&f| f as u64).collect();
    freq.push(1);
    let mut code_size = [0usize; 257];
    let mut others: [Option<usize>; 257] = [None; 257];
    loop {
        let mut c1 = None;
        let mut c2 = None;
        for i in 0..257 {
            if freq[i] == 0 {
                continue;
            }
            if c1.is_none_or(|c: usize| freq[i] <= freq[c]) {
                c2 = c1;
                c1 = Some(i);
            } else if c2.is_none_or(|c: usize| freq[i] <= freq[c]) {
                c2 = Some(i);
            }
        }
        let (Some(mut c1), Some(mut c2)) = (c1, c2) else {
            break;
        };
        freq[c1] += freq[c2];
        freq[c2] = 0;
        code_size[c1] += 1;
        while let Some(next) = others[c1] {
            c1 = next;
            code_size[c1] += 1;
        }
        others[c1] = Some(c2);
        code_size[c2] += 1;
        while let Some(next) = others[c2] {
            c2 = next;
            code_size[c2] += 1;
        }
    }

    let mut bits = [0usize; 258];
    for &size in code_size.iter().filter(|&&s| s > 0) {
        bits[size] += 1;
    }
    let mut i = bits.len() - 1;
    while i > 16 {
        while bits[i] > 0 {
            let mut j = i - 2;
            while bits[j] == 0 {
                j -= 1;
            }
            bits[i] -= 2;
            bits[i - 1] += 1;
            bits[j + 1] += 2;
            bits[j] -= 1;
        }
        i -= 1;
    }
    while bits[i] == 0 {
        i -= 1;
    }
    bits[i] -= 1;

    let mut counts = [0u8; 16];
    for (count, &b) in counts.iter_mut().zip(&bits[1..=16]) {
        *count = b as u8;
    }
    let mut values = Vec::new();
    for size in 1..258 {
        for symbol in 0..256 {
            if code_size[symbol] == size {
                values.push(symbol as u8);
            }
        }
    }
    (counts, values)
}

/// Canonical code and length for every symbol of a DHT table.
pub fn canonical_codes(counts: &[u8; 16], values: &[u8]) -> [(u16, u8); 256] {
    let mut codes = [(0u16, 0u8); 256];
    let mut code = 0u32;
    let mut k = 0;
    for (i, &count) in counts.iter().enumerate() {
        for _ in 0..count {
            codes[values[k] as usize] = (code as u16, i as u8 + 1);
            code += 1;
            k += 1;
        }
        code <<= 1;
    }
    codes
}
