// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Entropy decoding of a single 8x8 block, for sequential scans and for
//! each of the four kinds of progressive scan.

use crate::DEZIGZAG;
use crate::bit_reader::BitReader;
use crate::entropy_coding::huffman::HuffmanTable;
use crate::error::{Error, Result};
use crate::headers::QuantTable;
use crate::image::Block;
use crate::source::ByteSource;

/// Decodes a DC difference and adds it to the running predictor.
fn decode_dc<S: ByteSource + ?Sized>(
    br: &mut BitReader<S>,
    table: &HuffmanTable,
    dc_pred: &mut i32,
) -> Result<i32> {
    let category = table.decode(br)?;
    if category > 15 {
        return Err(Error::BadDcCategory(category));
    }
    let diff = if category == 0 {
        0
    } else {
        br.receive_extend(category as u32)
    };
    let dc = dc_pred.checked_add(diff).ok_or(Error::DcOutOfRange)?;
    if i16::try_from(dc).is_err() {
        return Err(Error::DcOutOfRange);
    }
    *dc_pred = dc;
    Ok(dc)
}

/// Decodes all 64 coefficients of a sequential-mode block and dequantizes
/// them into `block`, which must be zeroed.
pub fn decode_baseline<S: ByteSource + ?Sized>(
    br: &mut BitReader<S>,
    dc_table: &HuffmanTable,
    ac_table: &HuffmanTable,
    quant: &QuantTable,
    dc_pred: &mut i32,
    block: &mut Block,
) -> Result<()> {
    let dc = decode_dc(br, dc_table, dc_pred)?;
    block[0] = i16::try_from(dc * quant[0] as i32).map_err(|_| Error::DcOutOfRange)?;

    let mut k = 1;
    while k < 64 {
        if let Some(fast) = ac_table.peek_fast_ac(br) {
            br.consume(fast.len as u32);
            k += fast.run as usize;
            if k > 63 {
                return Err(Error::BadAcIndex(k));
            }
            let zig = DEZIGZAG[k];
            block[zig] = (fast.value as i32).wrapping_mul(quant[zig] as i32) as i16;
            k += 1;
            continue;
        }
        let rs = ac_table.decode(br)?;
        let run = (rs >> 4) as usize;
        let size = (rs & 15) as u32;
        if size == 0 {
            if rs != 0xf0 {
                // End of block.
                break;
            }
            k += 16;
        } else {
            k += run;
            if k > 63 {
                return Err(Error::BadAcIndex(k));
            }
            let zig = DEZIGZAG[k];
            block[zig] = br.receive_extend(size).wrapping_mul(quant[zig] as i32) as i16;
            k += 1;
        }
    }
    Ok(())
}

/// First DC scan of a progressive frame: stores the DC value scaled by
/// `1 << succ_low` and clears everything else.
pub fn decode_dc_first<S: ByteSource + ?Sized>(
    br: &mut BitReader<S>,
    dc_table: &HuffmanTable,
    dc_pred: &mut i32,
    succ_low: u8,
    block: &mut Block,
) -> Result<()> {
    block.fill(0);
    let dc = decode_dc(br, dc_table, dc_pred)?;
    block[0] = i16::try_from(dc << succ_low).map_err(|_| Error::DcOutOfRange)?;
    Ok(())
}

/// DC refinement: one raw bit per block.
pub fn decode_dc_refine<S: ByteSource + ?Sized>(
    br: &mut BitReader<S>,
    succ_low: u8,
    block: &mut Block,
) {
    if br.get_bit() {
        block[0] |= 1 << succ_low;
    }
}

/// First AC scan over the band `spectral_start..=spectral_end`.
/// `eob_run` counts blocks that remain to be skipped.
pub fn decode_ac_first<S: ByteSource + ?Sized>(
    br: &mut BitReader<S>,
    ac_table: &HuffmanTable,
    spectral_start: u8,
    spectral_end: u8,
    succ_low: u8,
    eob_run: &mut u32,
    block: &mut Block,
) -> Result<()> {
    if *eob_run > 0 {
        *eob_run -= 1;
        return Ok(());
    }
    let end = spectral_end as usize;
    let mut k = spectral_start as usize;
    while k <= end {
        if let Some(fast) = ac_table.peek_fast_ac(br) {
            br.consume(fast.len as u32);
            k += fast.run as usize;
            if k > end {
                return Err(Error::BadAcIndex(k));
            }
            block[DEZIGZAG[k]] = ((fast.value as i32) << succ_low) as i16;
            k += 1;
            continue;
        }
        let rs = ac_table.decode(br)?;
        let run = (rs >> 4) as u32;
        let size = (rs & 15) as u32;
        if size == 0 {
            if run < 15 {
                *eob_run = (1 << run) - 1;
                if run > 0 {
                    *eob_run += br.get_bits(run);
                }
                break;
            }
            k += 16;
        } else {
            k += run as usize;
            if k > end {
                return Err(Error::BadAcIndex(k));
            }
            block[DEZIGZAG[k]] = (br.receive_extend(size) << succ_low) as i16;
            k += 1;
        }
    }
    Ok(())
}

/// Adds one correction bit to an already nonzero coefficient, moving it away
/// from zero.
fn refine<S: ByteSource + ?Sized>(br: &mut BitReader<S>, coefficient: &mut i16, bit: i16) {
    if br.get_bit() && *coefficient & bit == 0 {
        if *coefficient > 0 {
            *coefficient = coefficient.wrapping_add(bit);
        } else {
            *coefficient = coefficient.wrapping_sub(bit);
        }
    }
}

/// AC refinement scan: sends correction bits for coefficients that are
/// already nonzero and places newly significant ones (always +-1 at this
/// bit position).
pub fn decode_ac_refine<S: ByteSource + ?Sized>(
    br: &mut BitReader<S>,
    ac_table: &HuffmanTable,
    spectral_start: u8,
    spectral_end: u8,
    succ_low: u8,
    eob_run: &mut u32,
    block: &mut Block,
) -> Result<()> {
    let bit: i16 = 1 << succ_low;
    let start = spectral_start as usize;
    let end = spectral_end as usize;

    if *eob_run > 0 {
        *eob_run -= 1;
        for &zig in &DEZIGZAG[start..=end] {
            if block[zig] != 0 {
                refine(br, &mut block[zig], bit);
            }
        }
        return Ok(());
    }

    let mut k = start;
    while k <= end {
        let rs = ac_table.decode(br)?;
        let mut run = (rs >> 4) as u32;
        let size = rs & 15;
        let mut value = 0i16;
        if size == 0 {
            if run < 15 {
                *eob_run = (1 << run) - 1;
                if run > 0 {
                    *eob_run += br.get_bits(run);
                }
                // Refine what is left of this block, place nothing.
                run = 64;
            }
            // Otherwise a run of 16 zeros: skip 15, then "place" a zero.
        } else {
            if size != 1 {
                return Err(Error::BadHuffmanCode);
            }
            value = if br.get_bit() { bit } else { -bit };
        }

        while k <= end {
            let zig = DEZIGZAG[k];
            k += 1;
            if block[zig] != 0 {
                refine(br, &mut block[zig], bit);
            } else {
                if run == 0 {
                    block[zig] = value;
                    break;
                }
                run -= 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::SliceSource;
    use jpeg_test_utils::BitWriter;
    use test_log::test;

    /// Codes: symbol i of `values` gets the 4-bit code i.
    fn table(values: &[u8]) -> HuffmanTable {
        let mut counts = [0u8; 16];
        counts[3] = values.len() as u8;
        HuffmanTable::build(&counts, values).unwrap()
    }

    fn ac_table(values: &[u8]) -> HuffmanTable {
        table(values).with_fast_ac()
    }

    fn reader_test(bits: &[(u32, u32)], f: impl FnOnce(&mut BitReader<SliceSource>)) {
        let mut writer = BitWriter::new();
        for &(value, count) in bits {
            writer.write(value, count);
        }
        let data = writer.finish();
        let mut src = SliceSource::new(&data);
        let mut br = BitReader::new(&mut src);
        f(&mut br);
    }

    #[test]
    fn baseline_block() {
        let dc = table(&[0, 1, 2, 3]);
        let ac = ac_table(&[0x00, 0x01, 0x21, 0xf0, 0x12]);
        let mut quant = [1u16; 64];
        quant[0] = 8;
        quant[1] = 2;
        reader_test(
            &[
                (3, 4),      // DC category 3
                (0b101, 3),  // +5
                (1, 4),      // run 0, size 1
                (0, 1),      // -1
                (2, 4),      // run 2, size 1
                (1, 1),      // +1
                (3, 4),      // 16 zeros
                (4, 4),      // run 1, size 2
                (0b01, 2),   // -2
                (0, 4),      // end of block
            ],
            |br| {
                let mut dc_pred = 10;
                let mut block = [0i16; 64];
                decode_baseline(br, &dc, &ac, &quant, &mut dc_pred, &mut block).unwrap();
                assert_eq!(dc_pred, 15);
                assert_eq!(block[0], 120);
                // k = 1 -> natural index 1, quantizer 2.
                assert_eq!(block[DEZIGZAG[1]], -2);
                assert_eq!(block[DEZIGZAG[4]], 1);
                // 16 zeros (5..=20), then run 1 puts the value at k = 22.
                assert_eq!(block[DEZIGZAG[22]], -2);
                assert_eq!(block.iter().filter(|&&c| c != 0).count(), 4);
            },
        );
    }

    #[test]
    fn baseline_rejects_bad_dc_category() {
        let dc = table(&[0, 16]);
        let ac = ac_table(&[0x00]);
        reader_test(&[(1, 4)], |br| {
            let mut dc_pred = 0;
            let mut block = [0i16; 64];
            assert!(matches!(
                decode_baseline(br, &dc, &ac, &[1; 64], &mut dc_pred, &mut block),
                Err(Error::BadDcCategory(16))
            ));
        });
    }

    #[test]
    fn baseline_rejects_run_past_end() {
        let dc = table(&[0]);
        let ac = ac_table(&[0xf0, 0xf1]);
        // 3 x ZRL brings k to 49, then run 15 goes to 64.
        reader_test(&[(0, 4), (0, 4), (0, 4), (0, 4), (1, 4), (1, 1)], |br| {
            let mut dc_pred = 0;
            let mut block = [0i16; 64];
            assert!(matches!(
                decode_baseline(br, &dc, &ac, &[1; 64], &mut dc_pred, &mut block),
                Err(Error::BadAcIndex(64))
            ));
        });
    }

    #[test]
    fn dc_out_of_range() {
        let dc = table(&[15]);
        let ac = ac_table(&[0x00]);
        reader_test(&[(0, 4), (0x7fff, 15), (0, 4)], |br| {
            let mut dc_pred = 0;
            let mut block = [0i16; 64];
            decode_baseline(br, &dc, &ac, &[1; 64], &mut dc_pred, &mut block).unwrap();
            assert_eq!(dc_pred, 32767);
        });
        reader_test(&[(0, 4), (0x7fff, 15), (0, 4)], |br| {
            let mut dc_pred = 1;
            let mut block = [0i16; 64];
            assert!(matches!(
                decode_baseline(br, &dc, &ac, &[1; 64], &mut dc_pred, &mut block),
                Err(Error::DcOutOfRange)
            ));
        });
        reader_test(&[(0, 4), (0x7fff, 15), (0, 4)], |br| {
            let mut dc_pred = 0;
            let mut block = [0i16; 64];
            assert!(matches!(
                decode_baseline(br, &dc, &ac, &[2; 64], &mut dc_pred, &mut block),
                Err(Error::DcOutOfRange)
            ));
        });
    }

    #[test]
    fn dc_first_and_refine() {
        let dc = table(&[0, 2]);
        reader_test(&[(1, 4), (0b01, 2), (1, 1), (0, 1)], |br| {
            let mut dc_pred = 0;
            let mut block = [7i16; 64];
            decode_dc_first(br, &dc, &mut dc_pred, 1, &mut block).unwrap();
            assert_eq!(dc_pred, -2);
            assert_eq!(block[0], -4);
            assert!(block[1..].iter().all(|&c| c == 0));
            decode_dc_refine(br, 0, &mut block);
            assert_eq!(block[0], -3);
            decode_dc_refine(br, 0, &mut block);
            assert_eq!(block[0], -3);
        });
    }

    #[test]
    fn ac_first_with_eob_run() {
        let ac = ac_table(&[0x01, 0x20, 0x11]);
        reader_test(
            &[
                (2, 4),    // run 1, size 1
                (1, 1),    // +1 at k = 2
                (0, 4),    // run 0 size 1
                (0, 1),    // -1 at k = 3
                (1, 4),    // EOBRUN with 2 extra bits
                (0b10, 2), // 4 + 2 = 6 blocks, this one included
            ],
            |br| {
                let mut eob_run = 0;
                let mut block = [0i16; 64];
                decode_ac_first(br, &ac, 1, 5, 2, &mut eob_run, &mut block).unwrap();
                assert_eq!(block[DEZIGZAG[2]], 4);
                assert_eq!(block[DEZIGZAG[3]], -4);
                assert_eq!(eob_run, 5);
                let mut other = [0i16; 64];
                for _ in 0..5 {
                    decode_ac_first(br, &ac, 1, 5, 2, &mut eob_run, &mut other).unwrap();
                }
                assert_eq!(eob_run, 0);
                assert_eq!(other, [0; 64]);
            },
        );
    }

    #[test]
    fn ac_first_rejects_run_past_band() {
        let ac = ac_table(&[0x51]);
        reader_test(&[(0, 4), (1, 1)], |br| {
            let mut eob_run = 0;
            let mut block = [0i16; 64];
            assert!(matches!(
                decode_ac_first(br, &ac, 1, 5, 0, &mut eob_run, &mut block),
                Err(Error::BadAcIndex(6))
            ));
        });
    }

    #[test]
    fn ac_refine() {
        // Symbols: 0 = EOB, 1 = run 1 + new coefficient, 2 = ZRL.
        let ac = ac_table(&[0x00, 0x11, 0xf0]);
        let mut block = [0i16; 64];
        block[DEZIGZAG[1]] = 2;
        block[DEZIGZAG[3]] = -2;
        reader_test(
            &[
                // run 1 size 1, sign +: passes k=1 (nonzero, correction bit 1)
                // and k=2 (zero, run 1 -> 0), places at k=4 after k=3
                // (nonzero, correction 0).
                (1, 4),
                (1, 1),
                (1, 1),
                (0, 1),
            ],
            |br| {
                let mut eob_run = 0;
                decode_ac_refine(br, &ac, 1, 4, 0, &mut eob_run, &mut block).unwrap();
            },
        );
        assert_eq!(block[DEZIGZAG[1]], 3);
        assert_eq!(block[DEZIGZAG[2]], 0);
        assert_eq!(block[DEZIGZAG[3]], -2);
        assert_eq!(block[DEZIGZAG[4]], 1);
    }

    #[test]
    fn ac_refine_eob_run_corrects_remaining() {
        let ac = ac_table(&[0x00, 0x10]);
        let mut block = [0i16; 64];
        block[DEZIGZAG[2]] = -4;
        block[DEZIGZAG[5]] = 4;
        reader_test(
            &[
                (1, 4),
                (0b1, 1),
                // Still inside this block: corrections for k=2 and k=5.
                (1, 1),
                (1, 1),
                // Next block is covered by the run; its correction bits.
                (1, 1),
            ],
            |br| {
                let mut eob_run = 0;
                decode_ac_refine(br, &ac, 1, 63, 1, &mut eob_run, &mut block).unwrap();
                assert_eq!(eob_run, 2);
                assert_eq!(block[DEZIGZAG[2]], -6);
                assert_eq!(block[DEZIGZAG[5]], 6);

                let mut next = [0i16; 64];
                next[DEZIGZAG[63]] = 2;
                decode_ac_refine(br, &ac, 1, 63, 1, &mut eob_run, &mut next).unwrap();
                assert_eq!(eob_run, 1);
                // Bit 1 is already set in 2, so nothing changes.
                assert_eq!(next[DEZIGZAG[63]], 2);
            },
        );
    }

    #[test]
    fn ac_refine_rejects_large_size() {
        let ac = ac_table(&[0x02]);
        reader_test(&[(0, 4), (0, 2)], |br| {
            let mut eob_run = 0;
            let mut block = [0i16; 64];
            assert!(matches!(
                decode_ac_refine(br, &ac, 1, 63, 0, &mut eob_run, &mut block),
                Err(Error::BadHuffmanCode)
            ));
        });
    }
}
