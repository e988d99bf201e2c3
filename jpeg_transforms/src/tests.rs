// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.
use super::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use test_log::test;

use std::f64::consts::FRAC_1_SQRT_2;
use std::f64::consts::PI;

#[inline(always)]
fn alpha(u: usize) -> f64 {
    if u == 0 { FRAC_1_SQRT_2 } else { 1.0 }
}

/// Textbook 2D IDCT (JPEG A.3.3) followed by level shift and clamping.
fn slow_idct(coefficients: &[i16; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    for y in 0..BLOCK_DIM {
        for x in 0..BLOCK_DIM {
            let mut sum = 0.0;
            for v in 0..BLOCK_DIM {
                for u in 0..BLOCK_DIM {
                    sum += alpha(u)
                        * alpha(v)
                        * coefficients[v * BLOCK_DIM + u] as f64
                        * ((2 * x + 1) as f64 * u as f64 * PI / 16.0).cos()
                        * ((2 * y + 1) as f64 * v as f64 * PI / 16.0).cos();
                }
            }
            out[y * BLOCK_DIM + x] = (sum / 4.0 + 128.0).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn run_idct(coefficients: &[i16; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
    let mut out = [0u8; BLOCK_SIZE];
    idct8x8(coefficients, &mut out, BLOCK_DIM);
    out
}

#[test]
fn matches_float_reference() {
    let mut rng = ChaCha12Rng::seed_from_u64(0);
    for _ in 0..100 {
        let mut coefficients = [0i16; BLOCK_SIZE];
        coefficients[0] = rng.random_range(-1024..=1016);
        for c in coefficients[1..].iter_mut() {
            *c = rng.random_range(-128..=128);
        }
        let fast = run_idct(&coefficients);
        let slow = slow_idct(&coefficients);
        for (i, (&a, &b)) in fast.iter().zip(slow.iter()).enumerate() {
            assert!(
                a.abs_diff(b) <= 2,
                "sample {i}: fixed point {a}, reference {b}, block {coefficients:?}"
            );
        }
    }
}

#[test]
fn dc_only_block_is_flat() {
    arbtest::arbtest(|u| {
        let dc: i16 = u.arbitrary()?;
        let mut coefficients = [0i16; BLOCK_SIZE];
        coefficients[0] = dc;
        let expected = dc_only_sample(dc);
        assert!(run_idct(&coefficients).iter().all(|&s| s == expected));
        Ok(())
    });
}

#[test]
fn dc_only_known_value() {
    // Diff of 8 with a DC quantizer of 16.
    let mut coefficients = [0i16; BLOCK_SIZE];
    coefficients[0] = 8 * 16;
    assert_eq!(run_idct(&coefficients), [144; BLOCK_SIZE]);
    coefficients[0] = -2000;
    assert_eq!(run_idct(&coefficients), [0; BLOCK_SIZE]);
    coefficients[0] = 2000;
    assert_eq!(run_idct(&coefficients), [255; BLOCK_SIZE]);
}

#[test]
fn golden_block() {
    let mut coefficients = [0i16; BLOCK_SIZE];
    coefficients[0] = 240;
    coefficients[1] = -36;
    coefficients[8] = 50;
    coefficients[9] = -12;
    coefficients[2] = 7;
    coefficients[16] = -9;
    coefficients[3] = 3;
    coefficients[27] = -5;
    coefficients[63] = 2;
    #[rustfmt::skip]
    let expected: [u8; BLOCK_SIZE] = [
        157, 158, 160, 162, 166, 169, 173, 176,
        158, 158, 158, 162, 166, 170, 173, 174,
        158, 157, 157, 159, 165, 169, 171, 171,
        156, 156, 155, 158, 162, 166, 167, 168,
        153, 153, 155, 155, 158, 160, 163, 165,
        150, 151, 151, 152, 153, 155, 158, 160,
        148, 147, 147, 148, 150, 152, 154, 155,
        147, 145, 144, 145, 148, 151, 151, 151,
    ];
    assert_eq!(run_idct(&coefficients), expected);
}

#[test]
fn writes_with_stride() {
    let mut coefficients = [0i16; BLOCK_SIZE];
    coefficients[0] = 8 * 16;
    let stride = 13;
    let mut out = vec![7u8; stride * BLOCK_DIM];
    idct8x8(&coefficients, &mut out, stride);
    for row in out.chunks_exact(stride) {
        assert_eq!(&row[..BLOCK_DIM], &[144; BLOCK_DIM]);
        assert!(row[BLOCK_DIM..].iter().all(|&s| s == 7));
    }
}

#[test]
fn extreme_coefficients_do_not_overflow() {
    let coefficients = [i16::MIN; BLOCK_SIZE];
    run_idct(&coefficients);
    let coefficients: [i16; BLOCK_SIZE] =
        std::array::from_fn(|i| if i % 3 == 0 { i16::MAX } else { i16::MIN });
    run_idct(&coefficients);
}
