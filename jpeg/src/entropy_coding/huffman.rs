// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Canonical Huffman tables as transmitted in DHT segments.

use std::fmt::Debug;

use crate::bit_reader::{BIT_MASK, BitReader};
use crate::error::{Error, Result};
use crate::source::ByteSource;

/// Codes of at most this many bits are resolved with a single table lookup.
pub const FAST_BITS: usize = 9;
const FAST_SIZE: usize = 1 << FAST_BITS;
const MAX_CODE_LENGTH: usize = 16;
pub const MAX_SYMBOLS: usize = 256;

/// A run/level pair from an AC table that can be decoded with one lookup,
/// magnitude bits included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastAc {
    /// Zero coefficients preceding this one.
    pub run: u8,
    /// The coefficient, already sign-extended.
    pub value: i16,
    /// Code length plus magnitude length.
    pub len: u8,
}

#[derive(Clone)]
pub struct HuffmanTable {
    /// Index of the symbol whose code is a prefix of the 9-bit lookup key.
    fast: [Option<u8>; FAST_SIZE],
    codes: [u16; MAX_SYMBOLS],
    sizes: [u8; MAX_SYMBOLS],
    values: [u8; MAX_SYMBOLS],
    num_symbols: usize,
    /// One past the largest code of each length, left-justified to 16 bits.
    maxcode: [u32; MAX_CODE_LENGTH + 2],
    /// Symbol index minus code, per length.
    delta: [i32; MAX_CODE_LENGTH + 1],
    fast_ac: Option<Box<[Option<FastAc>; FAST_SIZE]>>,
}

impl Debug for HuffmanTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuffmanTable")
            .field("num_symbols", &self.num_symbols)
            .field("sizes", &&self.sizes[..self.num_symbols])
            .field("values", &&self.values[..self.num_symbols])
            .field("has_fast_ac", &self.fast_ac.is_some())
            .finish()
    }
}

impl HuffmanTable {
    /// Builds the canonical code from the 16 per-length counts of a DHT
    /// segment and the symbols in code order.
    pub fn build(counts: &[u8; MAX_CODE_LENGTH], values: &[u8]) -> Result<HuffmanTable> {
        let num_symbols: usize = counts.iter().map(|&c| c as usize).sum();
        if num_symbols > MAX_SYMBOLS {
            return Err(Error::TooManyHuffmanSymbols(num_symbols));
        }
        if values.len() < num_symbols {
            return Err(Error::BadHuffmanLengths);
        }

        let mut sizes = [0u8; MAX_SYMBOLS];
        let mut k = 0;
        for (i, &count) in counts.iter().enumerate() {
            for _ in 0..count {
                sizes[k] = i as u8 + 1;
                k += 1;
            }
        }

        let mut codes = [0u16; MAX_SYMBOLS];
        let mut maxcode = [0u32; MAX_CODE_LENGTH + 2];
        let mut delta = [0i32; MAX_CODE_LENGTH + 1];
        let mut code = 0u32;
        let mut k = 0;
        for len in 1..=MAX_CODE_LENGTH {
            delta[len] = k as i32 - code as i32;
            while k < num_symbols && sizes[k] as usize == len {
                codes[k] = code as u16;
                code += 1;
                k += 1;
            }
            if code > 1 << len {
                return Err(Error::BadHuffmanLengths);
            }
            maxcode[len] = code << (MAX_CODE_LENGTH - len);
            code <<= 1;
        }
        maxcode[MAX_CODE_LENGTH + 1] = u32::MAX;

        let mut fast = [None; FAST_SIZE];
        for i in 0..num_symbols {
            let size = sizes[i] as usize;
            if size <= FAST_BITS {
                let first = (codes[i] as usize) << (FAST_BITS - size);
                let span = 1 << (FAST_BITS - size);
                for entry in &mut fast[first..first + span] {
                    *entry = Some(i as u8);
                }
            }
        }

        let mut table_values = [0u8; MAX_SYMBOLS];
        table_values[..num_symbols].copy_from_slice(&values[..num_symbols]);

        Ok(HuffmanTable {
            fast,
            codes,
            sizes,
            values: table_values,
            num_symbols,
            maxcode,
            delta,
            fast_ac: None,
        })
    }

    /// Adds the combined run/level lookup used by AC tables.
    pub fn with_fast_ac(mut self) -> HuffmanTable {
        let mut fast_ac = Box::new([None; FAST_SIZE]);
        for (i, entry) in fast_ac.iter_mut().enumerate() {
            let Some(index) = self.fast[i] else {
                continue;
            };
            let rs = self.values[index as usize];
            let run = rs >> 4;
            let magnitude_bits = (rs & 15) as usize;
            let len = self.sizes[index as usize] as usize;
            if magnitude_bits == 0 || len + magnitude_bits > FAST_BITS {
                continue;
            }
            let raw = ((i << len) & (FAST_SIZE - 1)) >> (FAST_BITS - magnitude_bits);
            let mut value = raw as i32;
            if value < 1 << (magnitude_bits - 1) {
                value += 1 - (1 << magnitude_bits);
            }
            *entry = Some(FastAc {
                run,
                value: value as i16,
                len: (len + magnitude_bits) as u8,
            });
        }
        self.fast_ac = Some(fast_ac);
        self
    }

    pub fn num_symbols(&self) -> usize {
        self.num_symbols
    }

    /// Code and length of the `index`-th symbol in code order.
    pub fn code(&self, index: usize) -> (u16, u8) {
        (self.codes[index], self.sizes[index])
    }

    /// Symbol values in code order.
    pub fn values(&self) -> &[u8] {
        &self.values[..self.num_symbols]
    }

    /// Looks up the run/level pair starting at the head of `br`, if the
    /// table has one for those bits. Does not consume anything.
    #[inline]
    pub fn peek_fast_ac<S: ByteSource + ?Sized>(&self, br: &mut BitReader<S>) -> Option<FastAc> {
        let fast_ac = self.fast_ac.as_ref()?;
        br.ensure(16);
        let entry = fast_ac[br.peek(FAST_BITS as u32) as usize]?;
        (entry.len as u32 <= br.available_bits()).then_some(entry)
    }

    /// Decodes one symbol.
    pub fn decode<S: ByteSource + ?Sized>(&self, br: &mut BitReader<S>) -> Result<u8> {
        br.ensure(16);

        if let Some(index) = self.fast[br.peek(FAST_BITS as u32) as usize] {
            let size = self.sizes[index as usize] as u32;
            if size > br.available_bits() {
                return Err(Error::BadHuffmanCode);
            }
            br.consume(size);
            return Ok(self.values[index as usize]);
        }

        // Codes longer than FAST_BITS: compare against the per-length limits.
        let head = br.code_buffer() >> 16;
        let mut len = FAST_BITS + 1;
        while head >= self.maxcode[len] {
            len += 1;
        }
        if len == MAX_CODE_LENGTH + 1 {
            br.drain();
            return Err(Error::BadHuffmanCode);
        }
        if len as u32 > br.available_bits() {
            return Err(Error::BadHuffmanCode);
        }
        let code = ((br.code_buffer() >> (32 - len)) & BIT_MASK[len]) as i32;
        let index = code + self.delta[len];
        if index < 0 || index as usize >= self.num_symbols {
            return Err(Error::BadHuffmanCode);
        }
        br.consume(len as u32);
        Ok(self.values[index as usize])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::SliceSource;
    use jpeg_test_utils::BitWriter;
    use test_log::test;

    // Table K.3.
    const LUMA_DC_COUNTS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];
    const LUMA_DC_VALUES: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

    #[test]
    fn luma_dc_codes() {
        let table = HuffmanTable::build(&LUMA_DC_COUNTS, &LUMA_DC_VALUES).unwrap();
        assert_eq!(table.num_symbols(), 12);
        assert_eq!(table.code(0), (0b00, 2));
        assert_eq!(table.code(1), (0b010, 3));
        assert_eq!(table.code(5), (0b110, 3));
        assert_eq!(table.code(6), (0b1110, 4));
        assert_eq!(table.code(11), (0b1_1111_1110, 9));
    }

    #[test]
    fn decodes_every_symbol() {
        let table = HuffmanTable::build(&LUMA_DC_COUNTS, &LUMA_DC_VALUES).unwrap();
        let mut writer = BitWriter::new();
        for i in (0..12).rev() {
            let (code, size) = table.code(i);
            writer.write(code as u32, size as u32);
        }
        let data = writer.finish();
        let mut src = SliceSource::new(&data);
        let mut br = BitReader::new(&mut src);
        for i in (0..12).rev() {
            assert_eq!(table.decode(&mut br).unwrap(), LUMA_DC_VALUES[i]);
        }
    }

    #[test]
    fn long_codes_use_slow_path() {
        // One code of each length 1..=16 except 16 has two.
        let mut counts = [1u8; 16];
        counts[15] = 2;
        let values: Vec<u8> = (0..17).collect();
        let table = HuffmanTable::build(&counts, &values).unwrap();
        assert_eq!(table.code(16), (0xffff, 16));
        assert_eq!(table.code(15), (0xfffe, 16));
        let mut writer = BitWriter::new();
        for i in [16, 12, 3, 15, 9, 10] {
            let (code, size) = table.code(i);
            writer.write(code as u32, size as u32);
        }
        let data = writer.finish();
        let mut src = SliceSource::new(&data);
        let mut br = BitReader::new(&mut src);
        for i in [16, 12, 3, 15, 9, 10] {
            assert_eq!(table.decode(&mut br).unwrap(), i as u8);
        }
    }

    #[test]
    fn unassigned_code_is_rejected() {
        // Single code "0"; "1..." matches nothing.
        let mut counts = [0u8; 16];
        counts[0] = 1;
        let table = HuffmanTable::build(&counts, &[7]).unwrap();
        let data = [0xff, 0x00, 0xff, 0x00, 0xff, 0x00];
        let mut src = SliceSource::new(&data);
        let mut br = BitReader::new(&mut src);
        let err = table.decode(&mut br).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptEntropyStream);
    }

    #[test]
    fn oversubscribed_lengths() {
        let mut counts = [0u8; 16];
        counts[0] = 3;
        let err = HuffmanTable::build(&counts, &[0, 1, 2]).unwrap_err();
        assert!(matches!(err, Error::BadHuffmanLengths));
        assert_eq!(err.kind(), ErrorKind::CorruptHuffmanTable);

        counts = [0; 16];
        counts[1] = 4;
        counts[2] = 1;
        assert!(HuffmanTable::build(&counts, &[0, 1, 2, 3, 4]).is_err());
    }

    #[test]
    fn too_many_symbols() {
        let mut counts = [0u8; 16];
        counts[15] = 255;
        counts[14] = 2;
        let values = vec![0u8; 257];
        assert!(matches!(
            HuffmanTable::build(&counts, &values),
            Err(Error::TooManyHuffmanSymbols(257))
        ));
    }

    #[test]
    fn complete_code_of_length_one() {
        let mut counts = [0u8; 16];
        counts[0] = 2;
        let table = HuffmanTable::build(&counts, &[4, 9]).unwrap();
        assert_eq!(table.code(0), (0, 1));
        assert_eq!(table.code(1), (1, 1));
    }

    #[test]
    fn fast_ac_entries() {
        // Symbol 0x12 (run 1, 2 magnitude bits) with code "00", symbol 0x01
        // with code "01", and 0x00 (end of block) with code "10".
        let mut counts = [0u8; 16];
        counts[1] = 3;
        let table = HuffmanTable::build(&counts, &[0x12, 0x01, 0x00])
            .unwrap()
            .with_fast_ac();
        let fast_ac = table.fast_ac.as_ref().unwrap();
        // 00 10 ..... -> run 1, magnitude bits "10" = 2
        assert_eq!(
            fast_ac[0b0010_00000],
            Some(FastAc {
                run: 1,
                value: 2,
                len: 4
            })
        );
        // 00 01 ..... -> bits "01" = -2
        assert_eq!(fast_ac[0b0001_00000].map(|e| e.value), Some(-2));
        // 01 0 ...... -> -1
        assert_eq!(fast_ac[0b010_000000].map(|e| e.value), Some(-1));
        assert_eq!(fast_ac[0b011_000000].map(|e| e.value), Some(1));
        // End of block has no magnitude.
        assert_eq!(fast_ac[0b10_0000000], None);
        // Unassigned prefix.
        assert_eq!(fast_ac[0b11_0000000], None);
    }

    /// Code lengths satisfying the Kraft inequality.
    fn arbitrary_counts(
        u: &mut arbtest::arbitrary::Unstructured,
    ) -> arbtest::arbitrary::Result<[u8; 16]> {
        let mut counts = [0u8; 16];
        let mut available = 2u32;
        let mut total = 0usize;
        for (i, count) in counts.iter_mut().enumerate() {
            let spare = if i == 15 {
                available.saturating_sub(1)
            } else {
                available
            };
            let max = spare.min(256 - total as u32).min(255);
            let n = u.int_in_range(0..=max)?;
            *count = n as u8;
            total += n as usize;
            available = (available - n) * 2;
        }
        Ok(counts)
    }

    #[test]
    fn prefix_free_round_trip() {
        arbtest::arbtest(|u| {
            let counts = arbitrary_counts(u)?;
            let total: usize = counts.iter().map(|&c| c as usize).sum();
            if total == 0 {
                return Ok(());
            }
            let values: Vec<u8> = (0..total).map(|i| i as u8).collect();
            let table = HuffmanTable::build(&counts, &values).unwrap();

            for a in 0..total {
                let (code_a, len_a) = table.code(a);
                for b in 0..total {
                    if a == b {
                        continue;
                    }
                    let (code_b, len_b) = table.code(b);
                    if len_a <= len_b {
                        assert_ne!(code_b >> (len_b - len_a), code_a, "{a} prefixes {b}");
                    }
                }
            }

            let picks: Vec<usize> = (0..u.int_in_range(1..=40)?)
                .map(|_| u.choose_index(total))
                .collect::<arbtest::arbitrary::Result<_>>()?;
            let mut writer = BitWriter::new();
            for &i in &picks {
                let (code, len) = table.code(i);
                writer.write(code as u32, len as u32);
            }
            let data = writer.finish();
            let mut src = SliceSource::new(&data);
            let mut br = BitReader::new(&mut src);
            for &i in &picks {
                assert_eq!(table.decode(&mut br).unwrap(), i as u8);
            }
            Ok(())
        });
    }
}
