// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// Writes entropy-coded data MSB first, stuffing a zero byte after every
/// `FF`.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    acc: u64,
    nbits: u32,
}

impl BitWriter {
    pub fn new() -> BitWriter {
        BitWriter::default()
    }

    /// Appends the low `count` bits of `bits`.
    pub fn write(&mut self, bits: u32, count: u32) {
        assert!(count <= 32);
        if count == 0 {
            return;
        }
        let mask = (1u64 << count) - 1;
        self.acc = (self.acc << count) | (bits as u64 & mask);
        self.nbits += count;
        while self.nbits >= 8 {
            let byte = (self.acc >> (self.nbits - 8)) as u8;
            self.bytes.push(byte);
            if byte == 0xff {
                self.bytes.push(0);
            }
            self.nbits -= 8;
        }
        self.acc &= (1u64 << self.nbits) - 1;
    }

    /// Pads to a byte boundary with one bits.
    pub fn align(&mut self) {
        if self.nbits > 0 {
            self.write(u32::MAX, 8 - self.nbits);
        }
    }

    /// Pads, then writes a marker without stuffing.
    pub fn marker(&mut self, code: u8) {
        self.align();
        self.bytes.extend([0xff, code]);
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.align();
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stuffing_and_padding() {
        let mut writer = BitWriter::new();
        writer.write(0xff, 8);
        writer.write(0b101, 3);
        assert_eq!(writer.finish(), [0xff, 0x00, 0b1011_1111]);
    }

    #[test]
    fn markers_are_not_stuffed() {
        let mut writer = BitWriter::new();
        writer.write(0, 1);
        writer.marker(0xd0);
        writer.write(0x12345, 20);
        assert_eq!(writer.finish(), [0x7f, 0xff, 0xd0, 0x12, 0x34, 0x5f]);
    }
}
