// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Integer 8x8 inverse DCT with level shift.
//!
//! The transform is the separable Loeffler/AAN-style butterfly used by most
//! fixed-point JPEG decoders: constants are scaled by 4096, the column pass
//! keeps 2 extra bits of precision and the row pass removes the remaining
//! `1 << 17` scale while adding the +128 level shift.

pub const BLOCK_DIM: usize = 8;
pub const BLOCK_SIZE: usize = BLOCK_DIM * BLOCK_DIM;

// Multipliers, `round(c * 4096)` computed in single precision.
const C_0_541196100: i64 = 2217;
const C_M1_847759065: i64 = -7567;
const C_0_765366865: i64 = 3135;
const C_1_175875602: i64 = 4816;
const C_0_298631336: i64 = 1223;
const C_2_053119869: i64 = 8410;
const C_3_072711026: i64 = 12586;
const C_1_501321110: i64 = 6149;
const C_M0_899976223: i64 = -3685;
const C_M2_562915447: i64 = -10497;
const C_M1_961570560: i64 = -8034;
const C_M0_390180644: i64 = -1597;

const COLUMN_ROUNDING: i64 = 512;
const COLUMN_SHIFT: u32 = 10;
const ROW_ROUNDING: i64 = 65536 + (128 << 17);
const ROW_SHIFT: u32 = 17;

/// Even (`x`) and odd (`t`) halves of one 8-point pass; output `i` is
/// `x[i] + t[3 - i]` and output `7 - i` is `x[i] - t[3 - i]`.
struct Butterfly {
    x: [i64; 4],
    t: [i64; 4],
}

#[inline(always)]
fn idct_1d(s: [i64; 8]) -> Butterfly {
    let p1 = (s[2] + s[6]) * C_0_541196100;
    let t2 = p1 + s[6] * C_M1_847759065;
    let t3 = p1 + s[2] * C_0_765366865;
    let t0 = (s[0] + s[4]) << 12;
    let t1 = (s[0] - s[4]) << 12;
    let x = [t0 + t3, t1 + t2, t1 - t2, t0 - t3];

    let (o0, o1, o2, o3) = (s[7], s[5], s[3], s[1]);
    let p3 = o0 + o2;
    let p4 = o1 + o3;
    let p1 = o0 + o3;
    let p2 = o1 + o2;
    let p5 = (p3 + p4) * C_1_175875602;
    let p1 = p5 + p1 * C_M0_899976223;
    let p2 = p5 + p2 * C_M2_562915447;
    let p3 = p3 * C_M1_961570560;
    let p4 = p4 * C_M0_390180644;
    let t = [
        o0 * C_0_298631336 + p1 + p3,
        o1 * C_2_053119869 + p2 + p4,
        o2 * C_3_072711026 + p2 + p3,
        o3 * C_1_501321110 + p1 + p4,
    ];
    Butterfly { x, t }
}

#[inline(always)]
fn clamp_to_u8(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}

/// Inverse transforms one dequantized block (row-major) into `BLOCK_DIM` rows
/// of `output`, starting at `output[0]` and advancing by `stride` per row.
///
/// Intermediates are 64-bit; no coefficient block can overflow them.
pub fn idct8x8(coefficients: &[i16; BLOCK_SIZE], output: &mut [u8], stride: usize) {
    assert!(stride >= BLOCK_DIM);
    assert!(output.len() >= stride * (BLOCK_DIM - 1) + BLOCK_DIM);

    let mut tmp = [0i64; BLOCK_SIZE];
    for col in 0..BLOCK_DIM {
        let s: [i64; 8] = std::array::from_fn(|row| coefficients[row * BLOCK_DIM + col] as i64);
        if s[1..].iter().all(|&c| c == 0) {
            // DC-only column.
            let dc = s[0] << 2;
            for row in 0..BLOCK_DIM {
                tmp[row * BLOCK_DIM + col] = dc;
            }
            continue;
        }
        let Butterfly { x, t } = idct_1d(s);
        for i in 0..4 {
            let xi = x[i] + COLUMN_ROUNDING;
            tmp[i * BLOCK_DIM + col] = (xi + t[3 - i]) >> COLUMN_SHIFT;
            tmp[(7 - i) * BLOCK_DIM + col] = (xi - t[3 - i]) >> COLUMN_SHIFT;
        }
    }

    for (row, v) in tmp.chunks_exact(BLOCK_DIM).enumerate() {
        let Butterfly { x, t } = idct_1d(std::array::from_fn(|i| v[i]));
        let out = &mut output[row * stride..row * stride + BLOCK_DIM];
        for i in 0..4 {
            let xi = x[i] + ROW_ROUNDING;
            out[i] = clamp_to_u8((xi + t[3 - i]) >> ROW_SHIFT);
            out[7 - i] = clamp_to_u8((xi - t[3 - i]) >> ROW_SHIFT);
        }
    }
}

/// Value of every sample produced by [`idct8x8`] for a block whose only
/// non-zero coefficient is the dequantized DC term `dc`.
pub fn dc_only_sample(dc: i16) -> u8 {
    clamp_to_u8(((dc as i64) + 4 + 1024) >> 3)
}
