// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/sheet.rs - Sprite payload extraction for decoded clips.
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

/*!
 * # `sheet` Module
 *
 * Every fully populated frame with an inline [SheetDescriptor] points at a
 * compressed ARGB bitmap stored after the clip's frame array. This module
 * inflates those bitmaps and converts them to RGBA.
 */

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::decoder::inflate;
use crate::error::{Error, Result};
use crate::parser::{Frame, SheetDescriptor};

/// An 8-bit RGBA raster, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbaImage {
    /// A fully transparent image.
    ///
    /// Fails with [Error::ImageTooLarge] when the pixel buffer size does not
    /// fit in memory addresses.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let size = Self::byte_size(width, height).ok_or(Error::ImageTooLarge { width, height })?;
        Ok(Self {
            width,
            height,
            pixels: vec![0; size],
        })
    }

    /// Bytes needed for a `width` x `height` RGBA buffer.
    pub fn byte_size(width: u32, height: u32) -> Option<usize> {
        usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)?
            .checked_mul(4)
    }

    /// Builds an image from tightly packed ARGB pixels.
    pub fn from_argb(width: u16, height: u16, argb: &[u8]) -> Result<Self> {
        let expected = usize::from(width) * usize::from(height) * 4;
        if argb.len() % 4 != 0 || argb.len() != expected {
            return Err(Error::PixelConversion {
                length: argb.len(),
                width,
                height,
            });
        }
        Ok(Self {
            width: width.into(),
            height: height.into(),
            pixels: argb_to_rgba(argb),
        })
    }

    /// Copies `src` into this image with its top-left corner at `(x, y)`.
    ///
    /// Pixels are replaced, not blended. Parts falling outside are dropped.
    pub fn blit(&mut self, src: &RgbaImage, x: i64, y: i64) {
        let x0 = x.max(0);
        let x1 = (x + i64::from(src.width)).min(i64::from(self.width));
        if x0 >= x1 {
            return;
        }
        let span = (x1 - x0) as usize * 4;
        let src_x = (x0 - x) as usize * 4;
        let src_stride = src.width as usize * 4;
        let dst_stride = self.width as usize * 4;

        for row in 0..i64::from(src.height) {
            let dst_y = y + row;
            if dst_y < 0 || dst_y >= i64::from(self.height) {
                continue;
            }
            let s = row as usize * src_stride + src_x;
            let d = dst_y as usize * dst_stride + x0 as usize * 4;
            self.pixels[d..d + span].copy_from_slice(&src.pixels[s..s + span]);
        }
    }
}

/// Reorders ARGB quadruplets into RGBA. A trailing partial pixel is dropped.
pub fn argb_to_rgba(argb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(argb.len());
    for pixel in argb.chunks_exact(4) {
        rgba.extend([pixel[1], pixel[2], pixel[3], pixel[0]]);
    }
    rgba
}

/// Returns how many payload bytes follow the frame array, measured from the
/// payload base: the furthest end of any valid descriptor on a fully
/// populated frame.
pub fn payload_extent(frames: &[Frame]) -> usize {
    frames
        .iter()
        .filter(|f| !f.is_reference())
        .filter_map(|f| f.sheet())
        .filter_map(SheetDescriptor::end)
        .max()
        .unwrap_or(0)
}

fn decode_sprite(sheet: &SheetDescriptor, payload: &[u8], base: usize) -> Result<RgbaImage> {
    let bytes = sheet
        .end()
        .and_then(|end| payload.get(sheet.offset as usize..end))
        .ok_or(Error::PayloadOutOfRange {
            start: base.saturating_add(sheet.offset as usize),
            length: sheet.length,
            available: base + payload.len(),
        })?;
    let argb = inflate(bytes)?;
    RgbaImage::from_argb(sheet.width, sheet.height, &argb)
}

/// A frame whose sprite could not be extracted.
#[derive(Debug)]
pub struct SpriteFailure {
    pub index: u16,
    pub error: Error,
}

/// The extracted sprites of one clip, keyed by frame slot.
#[derive(Debug, Default)]
pub struct SpriteSheet {
    pub sprites: BTreeMap<u16, RgbaImage>,
    pub failures: Vec<SpriteFailure>,
}

impl SpriteSheet {
    /// Extracts the sprite of every fully populated frame with a descriptor.
    ///
    /// `payload` starts at the clip's payload base, which lies at `base` in
    /// the decompressed stream. Failures are logged and recorded; the
    /// affected frames simply have no sprite.
    pub fn assemble(frames: &[Frame], payload: &[u8], base: usize) -> Self {
        let mut sheet = Self::default();
        for frame in frames.iter().filter(|f| !f.is_reference()) {
            let Some(descriptor) = frame.sheet() else {
                continue;
            };
            match decode_sprite(descriptor, payload, base) {
                Ok(image) => {
                    debug!(
                        "Frame {}: {}x{} sprite from {:#x}",
                        frame.index,
                        image.width,
                        image.height,
                        base + descriptor.offset as usize
                    );
                    sheet.sprites.insert(frame.index, image);
                }
                Err(error) => {
                    warn!("Failed to convert frame {}: {}", frame.index, error);
                    sheet.failures.push(SpriteFailure {
                        index: frame.index,
                        error,
                    });
                }
            }
        }
        sheet
    }

    pub fn get(&self, index: u16) -> Option<&RgbaImage> {
        self.sprites.get(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}
