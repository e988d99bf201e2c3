// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Sequential byte input for the decoder.

use std::io::BufRead;

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};

/// A finite, forward-only byte stream with big-endian reads.
///
/// Reads past the end fail with [`Error::TruncatedStream`].
pub trait ByteSource {
    fn read_byte(&mut self) -> Result<u8>;

    fn read_u16_be(&mut self) -> Result<u16> {
        let hi = self.read_byte()?;
        let lo = self.read_byte()?;
        Ok(BigEndian::read_u16(&[hi, lo]))
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        let hi = self.read_u16_be()?;
        let lo = self.read_u16_be()?;
        Ok(((hi as u32) << 16) | lo as u32)
    }

    /// Advances by `n` bytes.
    fn skip(&mut self, n: usize) -> Result<()>;

    fn at_eof(&mut self) -> bool;
}

/// Reads from an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> SliceSource<'a> {
        SliceSource { data, position: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    fn remaining(&self) -> &'a [u8] {
        &self.data[self.position..]
    }
}

impl ByteSource for SliceSource<'_> {
    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self.remaining().first().ok_or(Error::TruncatedStream)?;
        self.position += 1;
        Ok(byte)
    }

    fn read_u16_be(&mut self) -> Result<u16> {
        let bytes = self.remaining().get(..2).ok_or(Error::TruncatedStream)?;
        self.position += 2;
        Ok(BigEndian::read_u16(bytes))
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.remaining().get(..4).ok_or(Error::TruncatedStream)?;
        self.position += 4;
        Ok(BigEndian::read_u32(bytes))
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        if n > self.remaining().len() {
            self.position = self.data.len();
            return Err(Error::TruncatedStream);
        }
        self.position += n;
        Ok(())
    }

    fn at_eof(&mut self) -> bool {
        self.position >= self.data.len()
    }
}

/// Reads from any buffered reader, e.g. a `BufReader<File>`.
#[derive(Debug)]
pub struct ReaderSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> ReaderSource<R> {
        ReaderSource { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> Result<&[u8]> {
        Ok(self.reader.fill_buf()?)
    }
}

impl<R: BufRead> ByteSource for ReaderSource<R> {
    fn read_byte(&mut self) -> Result<u8> {
        let byte = *self.fill()?.first().ok_or(Error::TruncatedStream)?;
        self.reader.consume(1);
        Ok(byte)
    }

    fn skip(&mut self, mut n: usize) -> Result<()> {
        while n > 0 {
            let available = self.fill()?.len();
            if available == 0 {
                return Err(Error::TruncatedStream);
            }
            let step = available.min(n);
            self.reader.consume(step);
            n -= step;
        }
        Ok(())
    }

    /// A failing reader is not at EOF, so the next read reports the error.
    fn at_eof(&mut self) -> bool {
        self.fill().is_ok_and(|buf| buf.is_empty())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn slice_reads_big_endian() -> Result<()> {
        let mut src = SliceSource::new(&[0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde]);
        assert_eq!(src.read_byte()?, 0x12);
        assert_eq!(src.read_u16_be()?, 0x3456);
        assert_eq!(src.read_u32_be()?, 0x789abcde);
        assert!(src.at_eof());
        assert!(matches!(src.read_byte(), Err(Error::TruncatedStream)));
        Ok(())
    }

    #[test]
    fn slice_skip() -> Result<()> {
        let mut src = SliceSource::new(&[1, 2, 3, 4]);
        src.skip(3)?;
        assert_eq!(src.position(), 3);
        assert_eq!(src.read_byte()?, 4);
        let mut src = SliceSource::new(&[1, 2, 3, 4]);
        assert!(src.skip(5).is_err());
        assert!(src.at_eof());
        Ok(())
    }

    #[test]
    fn reader_matches_slice() -> Result<()> {
        let data: Vec<u8> = (0..=255).collect();
        // A tiny buffer forces reads to straddle refills.
        let mut reader = ReaderSource::new(std::io::BufReader::with_capacity(3, &data[..]));
        let mut slice = SliceSource::new(&data);
        assert_eq!(reader.read_u32_be()?, slice.read_u32_be()?);
        reader.skip(100)?;
        slice.skip(100)?;
        assert_eq!(reader.read_u16_be()?, slice.read_u16_be()?);
        while !slice.at_eof() {
            assert_eq!(reader.read_byte()?, slice.read_byte()?);
        }
        assert!(reader.at_eof());
        assert!(matches!(reader.skip(1), Err(Error::TruncatedStream)));
        Ok(())
    }

    struct BrokenReader;

    impl std::io::Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device gone"))
        }
    }

    #[test]
    fn reader_errors_are_not_eof() {
        let mut reader = ReaderSource::new(std::io::BufReader::new(BrokenReader));
        assert!(!reader.at_eof());
        assert!(matches!(reader.read_byte(), Err(Error::Io(_))));
    }
}
