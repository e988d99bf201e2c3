// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::util::tracing_wrappers::*;
use crate::util::try_filled_vec;

/// A row-major 2D buffer.
pub struct Image<T: Copy> {
    size: (usize, usize),
    data: Vec<T>,
}

impl<T: Copy> Debug for Image<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} image of {}",
            self.size.0,
            self.size.1,
            std::any::type_name::<T>()
        )
    }
}

impl<T: Copy> Image<T> {
    pub fn new_filled(size: (usize, usize), value: T) -> Result<Image<T>> {
        let (xsize, ysize) = size;
        if xsize == 0 || ysize == 0 {
            return Err(Error::InvalidImageSize(xsize as u32, ysize as u32));
        }
        let total_size = xsize.checked_mul(ysize).ok_or(Error::ArithmeticOverflow)?;
        debug!(xsize, ysize, "allocating image");
        Ok(Image {
            size,
            data: try_filled_vec(total_size, value)?,
        })
    }

    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    pub fn row(&self, row: usize) -> &[T] {
        let start = row * self.size.0;
        &self.data[start..start + self.size.0]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        let start = row * self.size.0;
        &mut self.data[start..start + self.size.0]
    }

    /// Everything from `(x, y)` to the end of the buffer, for writers that
    /// walk rows with the image width as stride.
    pub fn tail_mut(&mut self, x: usize, y: usize) -> &mut [T] {
        &mut self.data[y * self.size.0 + x..]
    }
}

pub type Block = [i16; BLOCK_SIZE];

/// Quantized DCT coefficients of one component, one natural-order block per
/// position of the MCU-aligned block grid.
pub type CoefficientImage = Image<Block>;

impl CoefficientImage {
    pub fn new_blocks(blocks: (usize, usize)) -> Result<CoefficientImage> {
        Image::new_filled(blocks, [0; BLOCK_SIZE])
    }

    pub fn block_mut(&mut self, bx: usize, by: usize) -> &mut Block {
        &mut self.row_mut(by)[bx]
    }

    pub fn block(&self, bx: usize, by: usize) -> &Block {
        &self.row(by)[bx]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn rows() {
        let mut image = Image::new_filled((3, 2), 7u8).unwrap();
        image.row_mut(1)[2] = 9;
        assert_eq!(image.row(0), &[7, 7, 7]);
        assert_eq!(image.row(1), &[7, 7, 9]);
        assert_eq!(image.tail_mut(1, 1).len(), 2);
    }

    #[test]
    fn blocks() {
        let mut coefficients = CoefficientImage::new_blocks((2, 3)).unwrap();
        coefficients.block_mut(1, 2)[5] = -3;
        assert_eq!(coefficients.block(1, 2)[5], -3);
        assert_eq!(coefficients.block(0, 2)[5], 0);
        assert_eq!(coefficients.size(), (2, 3));
    }

    #[test]
    fn empty_is_rejected() {
        assert!(matches!(
            Image::new_filled((0, 4), 0u8),
            Err(Error::InvalidImageSize(0, 4))
        ));
    }
}
