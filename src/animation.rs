// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/animation.rs - Preview animation compiler for decoded clips.
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
 * # `animation` Module
 *
 * This module lays out the extracted sprites of a clip on equally sized
 * canvases so they can be played back as a single looping animation.
 *
 * ## Usage Example
 *
 * ```no_run
 * use clipextract::animation::compile;
 * use clipextract::decoder::DecodedClipFile;
 * use clipextract::stream::ClipStream;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let decoded = DecodedClipFile::from_filename("example.clips")?;
 *
 *     for clip in ClipStream::new(&decoded.content) {
 *         let clip = clip?;
 *         let sheet = clip.assemble_sprites();
 *         let record = &clip.record;
 *         if let Some(animation) = compile(record.frames(), &sheet, record.frame_rate)? {
 *             println!(
 *                 "{}: {} canvases of {}x{}",
 *                 clip.record.id,
 *                 animation.canvases.len(),
 *                 animation.bounds.width(),
 *                 animation.bounds.height()
 *             );
 *         }
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

use tracing::warn;

use crate::error::{Error, Result};
use crate::parser::{Frame, find_frame};
use crate::sheet::{RgbaImage, SpriteSheet};

/// Largest width or height of a preview canvas.
pub const MAX_CANVAS_SIDE: u32 = u16::MAX as u32;

/// Upper bound on the pixel memory of all canvases of one preview.
pub const MAX_ANIMATION_BYTES: usize = 1 << 30;

/// The smallest box containing every placed sprite of a clip.
///
/// Coordinates are whole pixels; `max_x` and `max_y` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnionBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl UnionBox {
    /// Computes the box over fully populated frames that carry a descriptor.
    ///
    /// Offsets and extents are truncated toward zero. Returns `None` when no
    /// frame contributes.
    pub fn of_frames(frames: &[Frame]) -> Option<Self> {
        frames
            .iter()
            .filter(|f| !f.is_reference())
            .filter_map(|f| {
                let sheet = f.sheet()?;
                let offset = f.offset();
                Some(Self {
                    min_x: offset.x as i32,
                    min_y: offset.y as i32,
                    max_x: (offset.x + f32::from(sheet.width)) as i32,
                    max_y: (offset.y + f32::from(sheet.height)) as i32,
                })
            })
            .reduce(|a, b| Self {
                min_x: a.min_x.min(b.min_x),
                min_y: a.min_y.min(b.min_y),
                max_x: a.max_x.max(b.max_x),
                max_y: a.max_y.max(b.max_y),
            })
    }

    pub fn width(&self) -> u32 {
        (i64::from(self.max_x) - i64::from(self.min_x)).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (i64::from(self.max_y) - i64::from(self.min_y)).max(0) as u32
    }
}

/// A sequence of equally sized canvases played back in a loop.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub bounds: UnionBox,
    /// Display time of each canvas in milliseconds.
    pub delay_ms: u32,
    pub canvases: Vec<RgbaImage>,
}

/// Picks the frame whose sprite and placement an entry is drawn with.
///
/// A reference entry borrows from the fully populated frame at the slot it
/// names. Chains of references are not followed.
fn resolve<'a>(frames: &'a [Frame], frame: &'a Frame) -> Option<&'a Frame> {
    if !frame.is_reference() {
        return Some(frame);
    }
    let target = u16::try_from(frame.frame_num)
        .ok()
        .and_then(|slot| find_frame(frames, slot))
        .filter(|target| !target.is_reference());
    if target.is_none() {
        warn!(
            "Frame {} refers to frame {}, which is unavailable",
            frame.index, frame.frame_num
        );
    }
    target
}

/// Composites every frame entry onto a canvas the size of the clip's union
/// box.
///
/// Returns `Ok(None)` when no sprite was extracted, no frame contributes to
/// the union box, or `frame_rate` is zero. Entries without a usable sprite
/// become blank canvases so the timing of the remaining frames is kept.
///
/// Fails with [Error::ImageTooLarge] before allocating anything when a
/// canvas side exceeds [MAX_CANVAS_SIDE] or the canvases together would
/// exceed [MAX_ANIMATION_BYTES].
pub fn compile(
    frames: &[Frame],
    sheet: &SpriteSheet,
    frame_rate: u8,
) -> Result<Option<Animation>> {
    if sheet.is_empty() {
        return Ok(None);
    }
    if frame_rate == 0 {
        warn!("Clip has a frame rate of 0, not compiling an animation");
        return Ok(None);
    }
    let Some(bounds) = UnionBox::of_frames(frames) else {
        return Ok(None);
    };
    let (width, height) = (bounds.width(), bounds.height());
    if width == 0 || height == 0 {
        warn!("Clip sprites cover an empty area, not compiling an animation");
        return Ok(None);
    }

    let too_large = || Error::ImageTooLarge { width, height };
    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(too_large());
    }
    RgbaImage::byte_size(width, height)
        .and_then(|size| size.checked_mul(frames.len()))
        .filter(|&total| total <= MAX_ANIMATION_BYTES)
        .ok_or_else(too_large)?;

    let canvases = frames
        .iter()
        .map(|frame| {
            let mut canvas = RgbaImage::new(width, height)?;
            if let Some(source) = resolve(frames, frame) {
                if let Some(sprite) = sheet.get(source.index) {
                    let offset = source.offset();
                    let x = (offset.x - bounds.min_x as f32) as i64;
                    let y = (offset.y - bounds.min_y as f32) as i64;
                    canvas.blit(sprite, x, y);
                }
            }
            Ok(canvas)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(Animation {
        bounds,
        delay_ms: 1000 / u32::from(frame_rate),
        canvases,
    }))
}
