// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/cursor.rs - Big-endian byte cursor for decompressed clip streams.
 *  Copyright (C) 2026  Forest Crossman <cyrozap@gmail.com>
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  You should have received a copy of the GNU General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use crate::error::{Error, Result};

/// A read position over an immutable byte buffer.
///
/// All multi-byte values are big-endian. A read either consumes exactly its
/// width or fails with [Error::BufferUnderrun] and leaves the position where
/// it was.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// The whole underlying buffer, independent of the current position.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn tell(&self) -> usize {
        self.position
    }

    /// Moves to an absolute position, clamped to the end of the buffer.
    pub fn seek(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Reads `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .position
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::BufferUnderrun {
                position: self.position,
                wanted: count,
                available: self.remaining(),
            })?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_be_bytes(self.read_array()?))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    /// Reads a string prefixed with its 16-bit byte length.
    ///
    /// The prefix and the body are two separate reads: if the body underruns,
    /// the prefix stays consumed. Invalid UTF-8 is replaced, never rejected.
    pub fn read_utf(&mut self) -> Result<String> {
        let length = self.read_u16()?;
        let bytes = self.read_bytes(length.into())?;
        Ok(String::from_utf8_lossy(bytes).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_big_endian() {
        let data = [
            0x01, 0xFF, 0x12, 0x34, 0xFF, 0xFE, 0xDE, 0xAD, 0xBE, 0xEF, 0xFF, 0xFF, 0xFF, 0xFD,
            0x3F, 0x80, 0x00, 0x00,
        ];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 0x01);
        assert_eq!(cursor.read_i8().unwrap(), -1);
        assert_eq!(cursor.read_u16().unwrap(), 0x1234);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_u32().unwrap(), 0xDEADBEEF);
        assert_eq!(cursor.read_i32().unwrap(), -3);
        assert_eq!(cursor.read_f32().unwrap(), 1.0);
        assert!(cursor.is_at_end());
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_underrun_leaves_position() {
        let data = [0x00, 0x01, 0x02];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u8().unwrap();
        match cursor.read_u32() {
            Err(Error::BufferUnderrun {
                position,
                wanted,
                available,
            }) => {
                assert_eq!(position, 1);
                assert_eq!(wanted, 4);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(cursor.tell(), 1);
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
        assert!(cursor.read_u8().is_err());
        assert_eq!(cursor.tell(), 3);
    }

    #[test]
    fn test_seek_clamps() {
        let data = [0u8; 8];
        let mut cursor = ByteCursor::new(&data);
        cursor.seek(5);
        assert_eq!(cursor.tell(), 5);
        cursor.seek(100);
        assert_eq!(cursor.tell(), 8);
        assert!(cursor.is_at_end());
        cursor.seek(0);
        assert_eq!(cursor.remaining(), 8);
    }

    #[test]
    fn test_read_utf() {
        let data = [0x00, 0x03, b'a', 0xFF, b'c', 0x00, 0x00];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_utf().unwrap(), "a\u{FFFD}c");
        assert_eq!(cursor.read_utf().unwrap(), "");
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_read_utf_underrun_consumes_prefix() {
        let data = [0x00, 0x10, b'a', b'b'];
        let mut cursor = ByteCursor::new(&data);
        assert!(matches!(
            cursor.read_utf(),
            Err(Error::BufferUnderrun { wanted: 16, .. })
        ));
        assert_eq!(cursor.tell(), 2);
    }
}
