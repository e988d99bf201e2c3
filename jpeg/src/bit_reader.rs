// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::error::Error;
use crate::source::ByteSource;

/// `(1 << n) - 1`
pub const BIT_MASK: [u32; 17] = {
    let mut masks = [0u32; 17];
    let mut n = 1;
    while n < 17 {
        masks[n] = (1 << n) - 1;
        n += 1;
    }
    masks
};

/// `-(1 << n) + 1`, added to an `n`-bit magnitude whose top bit is clear.
pub const SIGN_BIAS: [i32; 17] = {
    let mut bias = [0i32; 17];
    let mut n = 1;
    while n < 17 {
        bias[n] = -(1 << n) + 1;
        n += 1;
    }
    bias
};

/// Reads bits from the entropy-coded segment of a scan.
///
/// Bits are kept left-justified in a 32-bit buffer. Stuffed `FF 00` pairs are
/// turned back into `FF` data bytes; any other `FF xx` pair ends the segment:
/// the marker code is cached and every later read yields zero bits. A
/// failing source read also ends the segment; the error is kept for
/// [`BitReader::take_error`].
pub struct BitReader<'a, S: ByteSource + ?Sized> {
    source: &'a mut S,
    code_buffer: u32,
    code_bits: u32,
    marker: Option<u8>,
    no_more: bool,
    truncated_marker: bool,
    error: Option<Error>,
}

impl<S: ByteSource + ?Sized> Debug for BitReader<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitReader{{ code_buffer: {:032b}, code_bits: {}, marker: {:?}, no_more: {} }}",
            self.code_buffer, self.code_bits, self.marker, self.no_more
        )
    }
}

impl<'a, S: ByteSource + ?Sized> BitReader<'a, S> {
    /// Starts reading entropy-coded data at the current position of `source`.
    pub fn new(source: &'a mut S) -> BitReader<'a, S> {
        BitReader {
            source,
            code_buffer: 0,
            code_bits: 0,
            marker: None,
            no_more: false,
            truncated_marker: false,
            error: None,
        }
    }

    /// Tops the buffer up to at least 25 bits, unless a marker or the end of
    /// the stream is reached first. After that, zero bytes are appended.
    pub fn refill(&mut self) {
        loop {
            let byte = if self.no_more {
                0
            } else {
                match self.next_data_byte() {
                    Some(byte) => byte,
                    None => return,
                }
            };
            self.code_buffer |= (byte as u32) << (24 - self.code_bits);
            self.code_bits += 8;
            if self.code_bits > 24 {
                return;
            }
        }
    }

    /// Reads one data byte, undoing byte stuffing. Returns `None` (and stops
    /// the segment) at a marker or at the end of the stream.
    fn next_data_byte(&mut self) -> Option<u8> {
        if self.source.at_eof() {
            self.no_more = true;
            return None;
        }
        let byte = self.read_source_byte()?;
        if byte != 0xff {
            return Some(byte);
        }
        loop {
            if self.source.at_eof() {
                self.truncated_marker = true;
                self.no_more = true;
                return None;
            }
            match self.read_source_byte()? {
                0x00 => return Some(0xff),
                0xff => continue,
                code => {
                    self.marker = Some(code);
                    self.no_more = true;
                    return None;
                }
            }
        }
    }

    fn read_source_byte(&mut self) -> Option<u8> {
        match self.source.read_byte() {
            Ok(byte) => Some(byte),
            Err(err) => {
                self.error = Some(err);
                self.no_more = true;
                None
            }
        }
    }

    /// Refills if fewer than `n` bits are buffered.
    #[inline]
    pub fn ensure(&mut self, n: u32) {
        if self.code_bits < n {
            self.refill();
        }
    }

    /// Number of valid bits in the buffer.
    #[inline]
    pub fn available_bits(&self) -> u32 {
        self.code_bits
    }

    /// The raw left-justified buffer.
    #[inline]
    pub fn code_buffer(&self) -> u32 {
        self.code_buffer
    }

    /// Returns the top `n` bits (`n <= 16`) without consuming them.
    #[inline]
    pub fn peek(&self, n: u32) -> u32 {
        (self.code_buffer >> (32 - n)) & BIT_MASK[n as usize]
    }

    /// Drops `n` bits, which must be buffered.
    #[inline]
    pub fn consume(&mut self, n: u32) {
        debug_assert!(n <= self.code_bits);
        self.code_buffer = self.code_buffer.checked_shl(n).unwrap_or(0);
        self.code_bits -= n;
    }

    /// Discards everything buffered.
    pub fn drain(&mut self) {
        self.code_buffer = 0;
        self.code_bits = 0;
    }

    /// Reads `n` bits (`n <= 16`) as an unsigned value.
    /// ```
    /// # use jpeg::bit_reader::BitReader;
    /// # use jpeg::source::SliceSource;
    /// let mut src = SliceSource::new(&[0b1010_1000, 0xff, 0x00, 0xff, 0xd9]);
    /// let mut br = BitReader::new(&mut src);
    /// assert_eq!(br.get_bits(3), 0b101);
    /// assert_eq!(br.receive_extend(3), -5);
    /// assert_eq!(br.get_bits(2), 0);
    /// assert_eq!(br.get_bits(8), 0xff);
    /// assert_eq!(br.marker(), Some(0xd9));
    /// assert_eq!(br.get_bits(16), 0);
    /// ```
    pub fn get_bits(&mut self, n: u32) -> u32 {
        self.ensure(n);
        if self.code_bits < n {
            return 0;
        }
        let k = self.code_buffer.rotate_left(n);
        self.code_buffer = k & !BIT_MASK[n as usize];
        self.code_bits -= n;
        k & BIT_MASK[n as usize]
    }

    pub fn get_bit(&mut self) -> bool {
        self.ensure(1);
        if self.code_bits < 1 {
            return false;
        }
        let bit = self.code_buffer & 0x8000_0000 != 0;
        self.code_buffer <<= 1;
        self.code_bits -= 1;
        bit
    }

    /// Reads an `n`-bit magnitude and applies the JPEG sign convention: a
    /// clear top bit means the value is negative.
    pub fn receive_extend(&mut self, n: u32) -> i32 {
        self.ensure(n);
        if self.code_bits < n {
            return 0;
        }
        let negative = self.code_buffer & 0x8000_0000 == 0;
        let k = self.code_buffer.rotate_left(n);
        self.code_buffer = k & !BIT_MASK[n as usize];
        self.code_bits -= n;
        let magnitude = (k & BIT_MASK[n as usize]) as i32;
        if negative {
            magnitude + SIGN_BIAS[n as usize]
        } else {
            magnitude
        }
    }

    /// The marker that ended the segment, if one was reached.
    pub fn marker(&self) -> Option<u8> {
        self.marker
    }

    /// The source error that ended the segment early, if any.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Whether the stream ended right after one or more `FF` bytes.
    pub fn hit_truncated_marker(&self) -> bool {
        self.truncated_marker
    }

    /// Restarts bit reading after a restart marker has been accepted.
    pub fn reset(&mut self) {
        self.code_buffer = 0;
        self.code_bits = 0;
        self.marker = None;
        self.no_more = false;
    }
}
