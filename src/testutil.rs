// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/testutil.rs - Fixture builders for clip-stream tests.
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

use std::io::prelude::*;

use flate2::Compression;
use flate2::write::{DeflateEncoder, ZlibEncoder};

/// Big-endian writer mirroring [crate::cursor::ByteCursor].
#[derive(Debug, Default)]
pub struct ByteWriter {
    pub bytes: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.bytes.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.bytes.extend(value.to_be_bytes());
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.bytes.extend(value.to_be_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.bytes.extend(value.to_be_bytes());
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.bytes.extend(value.to_be_bytes());
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.bytes.extend(value.to_be_bytes());
        self
    }

    pub fn utf(&mut self, value: &str) -> &mut Self {
        self.u16(value.len() as u16);
        self.bytes.extend(value.as_bytes());
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Clip header with only the sprite-sheet option bit set.
    pub fn clip_header(&mut self, id: &str, frame_count: u16, frame_rate: u8) -> &mut Self {
        self.utf(id)
            .utf(&format!("assets/{}.swf", id))
            .u8(0x02)
            .u16(frame_count)
            .u8(frame_rate)
    }

    /// Frame with no optional fields.
    pub fn plain_frame(&mut self, index: i16) -> &mut Self {
        self.i16(index)
            .u8(0x00)
            .u16(7)
            .f32(0.0)
            .f32(0.0)
            .f32(1.0)
            .f32(1.0)
    }

    /// Frame carrying an offset and an inline sprite-sheet descriptor.
    pub fn sheet_frame(
        &mut self,
        index: i16,
        offset: (f32, f32),
        payload_offset: u32,
        payload_length: i32,
        size: (u16, u16),
    ) -> &mut Self {
        self.i16(index)
            .u8(0x09)
            .f32(offset.0)
            .f32(offset.1)
            .u16(index as u16)
            .u32(payload_offset)
            .i32(payload_length)
            .u16(size.0)
            .u16(size.1)
            .f32(offset.0)
            .f32(offset.1)
            .f32(size.0.into())
            .f32(size.1.into())
    }
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A solid `width`x`height` ARGB pixel buffer.
pub fn solid_argb(width: usize, height: usize, argb: [u8; 4]) -> Vec<u8> {
    argb.repeat(width * height)
}
