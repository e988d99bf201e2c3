// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Chroma upsampling, one output row at a time.

use crate::image::Image;

#[inline]
fn div4(x: u32) -> u8 {
    (x >> 2) as u8
}

#[inline]
fn div16(x: u32) -> u8 {
    (x >> 4) as u8
}

/// Kernel used to bring a component to full resolution, chosen from the
/// ratio of the maximum sampling factors to the component's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsampler {
    Identity,
    /// 1:2 vertically; triangle filter between the two nearest rows.
    Vertical2,
    /// 2:1 horizontally; triangle filter, edges replicated.
    Horizontal2,
    /// 2:2; separable triangle filter.
    Both2,
    /// Any other ratio: sample replication.
    Replicate { h: usize },
}

impl std::fmt::Display for Upsampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Upsampler::Identity => write!(f, "no upsampling"),
            Upsampler::Vertical2 => write!(f, "1x2 triangle upsampling"),
            Upsampler::Horizontal2 => write!(f, "2x1 triangle upsampling"),
            Upsampler::Both2 => write!(f, "2x2 triangle upsampling"),
            Upsampler::Replicate { h } => write!(f, "{h}x replication upsampling"),
        }
    }
}

impl Upsampler {
    pub fn new(h_ratio: usize, v_ratio: usize) -> Upsampler {
        match (h_ratio, v_ratio) {
            (1, 1) => Upsampler::Identity,
            (1, 2) => Upsampler::Vertical2,
            (2, 1) => Upsampler::Horizontal2,
            (2, 2) => Upsampler::Both2,
            (h, _) => Upsampler::Replicate { h },
        }
    }

    /// Horizontal expansion factor.
    pub fn h_ratio(&self) -> usize {
        match self {
            Upsampler::Identity | Upsampler::Vertical2 => 1,
            Upsampler::Horizontal2 | Upsampler::Both2 => 2,
            Upsampler::Replicate { h } => *h,
        }
    }

    /// Writes `width * h_ratio()` samples computed from the first `width`
    /// samples of the nearer and farther input rows.
    pub fn resample_row(&self, near: &[u8], far: &[u8], width: usize, out: &mut [u8]) {
        let near = &near[..width];
        let far = &far[..width];
        match self {
            Upsampler::Identity => out[..width].copy_from_slice(near),
            Upsampler::Vertical2 => {
                for ((out, &n), &f) in out.iter_mut().zip(near).zip(far) {
                    *out = div4(3 * n as u32 + f as u32 + 2);
                }
            }
            Upsampler::Horizontal2 => resample_h2(near, out),
            Upsampler::Both2 => resample_hv2(near, far, out),
            Upsampler::Replicate { h } => {
                for (chunk, &n) in out.chunks_exact_mut(*h).zip(near) {
                    chunk.fill(n);
                }
            }
        }
    }
}

fn resample_h2(input: &[u8], out: &mut [u8]) {
    let w = input.len();
    if w == 1 {
        out[0] = input[0];
        out[1] = input[0];
        return;
    }
    out[0] = input[0];
    out[1] = div4(input[0] as u32 * 3 + input[1] as u32 + 2);
    for i in 1..w - 1 {
        let n = 3 * input[i] as u32 + 2;
        out[i * 2] = div4(n + input[i - 1] as u32);
        out[i * 2 + 1] = div4(n + input[i + 1] as u32);
    }
    out[(w - 1) * 2] = div4(input[w - 1] as u32 * 3 + input[w - 2] as u32 + 2);
    out[(w - 1) * 2 + 1] = input[w - 1];
}

fn resample_hv2(near: &[u8], far: &[u8], out: &mut [u8]) {
    let w = near.len();
    let mut t1 = 3 * near[0] as u32 + far[0] as u32;
    if w == 1 {
        out[0] = div4(t1 + 2);
        out[1] = out[0];
        return;
    }
    out[0] = div4(t1 + 2);
    for i in 1..w {
        let t0 = t1;
        t1 = 3 * near[i] as u32 + far[i] as u32;
        out[i * 2 - 1] = div16(3 * t0 + t1 + 8);
        out[i * 2] = div16(3 * t1 + t0 + 8);
    }
    out[w * 2 - 1] = div4(t1 + 2);
}

/// Walks the rows of one component plane, producing full-resolution rows.
///
/// Each input row covers `v_ratio` output rows. With a 2:1 vertical ratio,
/// the upper output row of a pair is blended with the row above and the
/// lower one with the row below.
#[derive(Debug)]
pub struct RowResampler {
    upsampler: Upsampler,
    v_ratio: usize,
    /// Number of input samples per row that contribute to the output.
    width: usize,
    /// Rows of the plane that hold image data.
    rows: usize,
    ystep: usize,
    ypos: usize,
    line0: usize,
    line1: usize,
}

impl RowResampler {
    pub fn new(h_ratio: usize, v_ratio: usize, image_width: usize, rows: usize) -> RowResampler {
        RowResampler {
            upsampler: Upsampler::new(h_ratio, v_ratio),
            v_ratio,
            width: image_width.div_ceil(h_ratio),
            rows,
            ystep: v_ratio >> 1,
            ypos: 0,
            line0: 0,
            line1: 0,
        }
    }

    pub fn upsampler(&self) -> Upsampler {
        self.upsampler
    }

    /// Length of the rows written by [`RowResampler::next_row`].
    pub fn output_len(&self) -> usize {
        self.width * self.upsampler.h_ratio()
    }

    pub fn next_row(&mut self, plane: &Image<u8>, out: &mut [u8]) {
        let bottom = self.ystep >= self.v_ratio >> 1;
        let (near, far) = if bottom {
            (self.line1, self.line0)
        } else {
            (self.line0, self.line1)
        };
        self.upsampler
            .resample_row(plane.row(near), plane.row(far), self.width, out);
        self.ystep += 1;
        if self.ystep >= self.v_ratio {
            self.ystep = 0;
            self.line0 = self.line1;
            self.ypos += 1;
            if self.ypos < self.rows {
                self.line1 += 1;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn select() {
        assert_eq!(Upsampler::new(1, 1), Upsampler::Identity);
        assert_eq!(Upsampler::new(2, 2), Upsampler::Both2);
        assert_eq!(Upsampler::new(4, 1), Upsampler::Replicate { h: 4 });
        assert_eq!(Upsampler::new(1, 4), Upsampler::Replicate { h: 1 });
        assert_eq!(Upsampler::new(2, 1).to_string(), "2x1 triangle upsampling");
    }

    #[test]
    fn horizontal() {
        let mut out = [0u8; 6];
        Upsampler::Horizontal2.resample_row(&[0, 100, 200, 7], &[0; 4], 3, &mut out);
        assert_eq!(out, [0, 25, 75, 125, 175, 200]);
        let mut out = [0u8; 2];
        Upsampler::Horizontal2.resample_row(&[9], &[0], 1, &mut out);
        assert_eq!(out, [9, 9]);
    }

    #[test]
    fn vertical() {
        let mut out = [0u8; 2];
        Upsampler::Vertical2.resample_row(&[100, 0], &[0, 100], 2, &mut out);
        assert_eq!(out, [75, 25]);
    }

    #[test]
    fn both() {
        let mut out = [0u8; 4];
        Upsampler::Both2.resample_row(&[160, 0], &[0, 0], 2, &mut out);
        // t = [480, 0]
        assert_eq!(out, [120, 90, 30, 0]);
        let mut out = [0u8; 2];
        Upsampler::Both2.resample_row(&[160], &[0], 1, &mut out);
        assert_eq!(out, [120, 120]);
    }

    #[test]
    fn replicate() {
        let mut out = [0u8; 8];
        Upsampler::Replicate { h: 4 }.resample_row(&[1, 2], &[0, 0], 2, &mut out);
        assert_eq!(out, [1, 1, 1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn flat_input_stays_flat() {
        arbtest::arbtest(|u| {
            let value: u8 = u.arbitrary()?;
            let width = u.int_in_range(1..=20)?;
            let h = u.int_in_range(1..=4)?;
            let v = u.int_in_range(1..=4)?;
            let upsampler = Upsampler::new(h, v);
            let row = vec![value; width];
            let mut out = vec![0; width * upsampler.h_ratio()];
            upsampler.resample_row(&row, &row, width, &mut out);
            assert!(out.iter().all(|&x| x == value));
            Ok(())
        });
    }

    #[test]
    fn vertical_row_walk() {
        // 3 chroma rows at half vertical resolution feed 6 output rows.
        let mut plane = Image::new_filled((1, 8), 0u8).unwrap();
        plane.row_mut(0)[0] = 0;
        plane.row_mut(1)[0] = 80;
        plane.row_mut(2)[0] = 160;
        let mut resampler = RowResampler::new(1, 2, 1, 3);
        let mut rows = vec![];
        for _ in 0..6 {
            let mut out = [0u8; 1];
            resampler.next_row(&plane, &mut out);
            rows.push(out[0]);
        }
        // Row 0 blends row 0 with itself, row 1 leans on row 1 below, and
        // the last row repeats the final input row.
        assert_eq!(rows, vec![0, 20, 60, 100, 140, 160]);
    }
}
