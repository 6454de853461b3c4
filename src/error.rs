// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/error.rs - Error type for the clip-stream decoder.
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

use std::io;

use thiserror::Error;

/// Errors produced while decoding a clip stream or exporting its images.
///
/// [Error::BufferUnderrun] aborts the stream when it happens inside a clip
/// header, but only costs a single frame when it happens inside a frame
/// record. The payload and pixel errors never abort anything: the affected
/// frame is left without an image.
#[derive(Debug, Error)]
pub enum Error {
    /// A primitive read needed more bytes than the buffer has left.
    #[error("buffer underrun at {position:#x}: wanted {wanted} bytes, {available} available")]
    BufferUnderrun {
        position: usize,
        wanted: usize,
        available: usize,
    },
    /// A compressed blob could not be inflated.
    #[error("decompression failed: {0}")]
    Decompression(#[source] io::Error),
    /// A sprite descriptor points outside the decompressed stream.
    #[error("payload range at {start:#x} (length {length}) is outside the {available}-byte buffer")]
    PayloadOutOfRange {
        start: usize,
        length: i32,
        available: usize,
    },
    /// Inflated pixel data does not fit the descriptor's dimensions.
    #[error("cannot convert {length} bytes of ARGB data into a {width}x{height} image")]
    PixelConversion {
        length: usize,
        width: u16,
        height: u16,
    },
    /// An image is too large for the target file format.
    #[error("{width}x{height} image exceeds the output format's limits")]
    ImageTooLarge { width: u32, height: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
    #[error("GIF encoding error: {0}")]
    Gif(#[from] gif::EncodingError),
}

pub type Result<T> = std::result::Result<T, Error>;
