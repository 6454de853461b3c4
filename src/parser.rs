// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/parser.rs - Record parser for decompressed clip streams.
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
 * # `parser` Module
 *
 * This module decodes the records of a decompressed clip stream: clip
 * headers, frame sets, frames and their display-list child transforms.
 *
 * The layout is fixed and undocumented. Every optional field is gated by a
 * bit in the flags byte that precedes it, and fields are read strictly in
 * the order listed on each record type.
 *
 * ## Usage Example
 *
 * ```no_run
 * use clipextract::cursor::ByteCursor;
 * use clipextract::decoder::DecodedClipFile;
 * use clipextract::parser::ClipRecord;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Decompress the file
 *     let decoded = DecodedClipFile::from_filename("example.clips")?;
 *
 *     // Parse the first clip
 *     let mut cursor = ByteCursor::new(&decoded.content);
 *     if let Some(clip) = ClipRecord::read(&mut cursor)? {
 *         println!("Clip: {} ({} frames)", clip.id, clip.frame_set.frames.len());
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

use tracing::{debug, info, warn};

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Identifier suffix marking the end of a clip stream.
pub const TERMINAL_SUFFIX: &str = ".clipq";

/// Clips whose url contains this are always looping.
const PORTRAIT_URL_MARKER: &str = ".portrait/";

bitflags::bitflags! {
    /// Option bits of a clip header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClipOptions: u8 {
        const LOOPING = 0x01;
        const HAS_SPRITE_SHEET = 0x02;
        const HIGH_QUALITY = 0x04;
        const PNG_ENCODED = 0x08;
        const HAS_SCALE = 0x10;
        const HAS_OFFSET_X = 0x20;
        const HAS_OFFSET_Y = 0x40;
        const HAS_SHRUNKEN_SCALE = 0x80;
    }
}

bitflags::bitflags! {
    /// Clip-level bits at the start of a frame set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameSetFlags: u8 {
        const HAS_EVENTS = 0x01;
        const HAS_CHILDREN = 0x02;
        const HAS_LOCOMOTIVE = 0x04;
    }
}

bitflags::bitflags! {
    /// Per-frame bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        const HAS_OFFSET = 0x01;
        const SHARED = 0x02;
        const HAS_CHILDREN = 0x04;
        const HAS_SHEET = 0x08;
        const HAS_LOCOMOTIVE = 0x10;
    }
}

bitflags::bitflags! {
    /// Per-child-transform bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChildFlags: u8 {
        const HAS_POSITION = 0x01;
        const HAS_SCALE = 0x02;
        const HAS_ROTATION = 0x04;
        const HAS_ALPHA = 0x08;
        const HAS_BLEND_MODE = 0x10;
        const VISIBLE = 0x20;
        const HAS_COLOR = 0x40;
        const HAS_MATRIX = 0x80;
    }
}

/// Reads a field only when its presence bit is set.
fn read_if<'a, T>(
    cursor: &mut ByteCursor<'a>,
    present: bool,
    read: impl FnOnce(&mut ByteCursor<'a>) -> Result<T>,
) -> Result<Option<T>> {
    if present { read(cursor).map(Some) } else { Ok(None) }
}

/// Reads an 8-bit count followed by that many records.
fn read_list<'a, T>(
    cursor: &mut ByteCursor<'a>,
    read: impl Fn(&mut ByteCursor<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    let count = cursor.read_u8()?;
    let mut items = Vec::with_capacity(count.into());
    for _ in 0..count {
        items.push(read(cursor)?);
    }
    Ok(items)
}

/// Returns `true` if `id` ends the clip stream.
pub fn is_terminal_id(id: &str) -> bool {
    id.is_empty() || id.ends_with(TERMINAL_SUFFIX)
}

/// A 2D point or vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            x: cursor.read_f32()?,
            y: cursor.read_f32()?,
        })
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            x: cursor.read_f32()?,
            y: cursor.read_f32()?,
            w: cursor.read_f32()?,
            h: cursor.read_f32()?,
        })
    }
}

/// Location and size of a frame's compressed pixel payload.
///
/// `offset` is relative to the payload base of the owning clip, i.e. the
/// stream position right after the clip's frame array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetDescriptor {
    pub offset: u32,
    /// Compressed length in bytes. Negative values are invalid.
    pub length: i32,
    /// Width of the decoded sprite in pixels.
    pub width: u16,
    /// Height of the decoded sprite in pixels.
    pub height: u16,
}

impl SheetDescriptor {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            offset: cursor.read_u32()?,
            length: cursor.read_i32()?,
            width: cursor.read_u16()?,
            height: cursor.read_u16()?,
        })
    }

    /// End of the payload relative to the payload base, if the length is valid.
    pub fn end(&self) -> Option<usize> {
        let length = usize::try_from(self.length).ok()?;
        (self.offset as usize).checked_add(length)
    }
}

/// An entry in a frame's display list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildTransform {
    /// Index of the child in the parent's display list.
    pub child_index: u8,
    /// Always negative for a decoded entry.
    pub frame_num: i16,
    pub position: Option<Point>,
    pub scale: Option<Point>,
    /// Rotation, 0 when absent.
    pub rotation: f32,
    /// Opacity, 1 when absent.
    pub alpha: f32,
    pub blend_mode: Option<String>,
    pub visible: bool,
    /// Color transform, 0 when absent.
    pub color: u32,
    /// Affine matrix `[a, b, c, d, tx, ty]`.
    pub matrix: Option<[f32; 6]>,
}

impl ChildTransform {
    /// Reads one child entry.
    ///
    /// Returns `Ok(None)` when the entry is a sentinel (non-negative
    /// `frame_num`), which ends the child list.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Option<Self>> {
        let child_index = cursor.read_u8()?;
        let frame_num = cursor.read_i16()?;
        if frame_num >= 0 {
            return Ok(None);
        }

        let flags = ChildFlags::from_bits_retain(cursor.read_u8()?);
        let position = read_if(cursor, flags.contains(ChildFlags::HAS_POSITION), Point::read)?;
        let scale = read_if(cursor, flags.contains(ChildFlags::HAS_SCALE), Point::read)?;
        let rotation = read_if(cursor, flags.contains(ChildFlags::HAS_ROTATION), |c| {
            c.read_f32()
        })?;
        let alpha = read_if(cursor, flags.contains(ChildFlags::HAS_ALPHA), |c| {
            c.read_f32()
        })?;
        let blend_mode = read_if(cursor, flags.contains(ChildFlags::HAS_BLEND_MODE), |c| {
            c.read_utf()
        })?;
        let color = read_if(cursor, flags.contains(ChildFlags::HAS_COLOR), |c| {
            c.read_u32()
        })?;
        let matrix = read_if(cursor, flags.contains(ChildFlags::HAS_MATRIX), |c| {
            let mut matrix = [0f32; 6];
            for value in &mut matrix {
                *value = c.read_f32()?;
            }
            Ok(matrix)
        })?;

        Ok(Some(Self {
            child_index,
            frame_num,
            position,
            scale,
            rotation: rotation.unwrap_or(0.0),
            alpha: alpha.unwrap_or(1.0),
            blend_mode,
            visible: flags.contains(ChildFlags::VISIBLE),
            color: color.unwrap_or(0),
            matrix,
        }))
    }

    /// Reads an 8-bit count and up to that many entries, stopping at the first
    /// sentinel. Entries after a sentinel are left unread.
    pub fn read_list(cursor: &mut ByteCursor<'_>) -> Result<Vec<Self>> {
        let count = cursor.read_u8()?;
        let mut children = Vec::with_capacity(count.into());
        for _ in 0..count {
            match Self::read(cursor)? {
                Some(child) => children.push(child),
                None => break,
            }
        }
        Ok(children)
    }
}

/// The fields of a fully populated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBody {
    /// Set when the frame reuses the bitmap of the frame at this index.
    pub shared_from: Option<u16>,
    pub locomotive_distance: Option<f32>,
    pub offset: Option<Point>,
    /// Identifier of the bitmap data this frame was rendered from.
    pub bitmap_id: u16,
    /// Inline payload descriptor. Never present on shared frames.
    pub sheet: Option<SheetDescriptor>,
    pub bound: Rect,
    pub children: Vec<ChildTransform>,
}

/// One entry of a frame set.
///
/// An entry whose `frame_num` differs from the slot it was decoded for is a
/// reference record: it carries nothing but `frame_num` and `body` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// The slot this entry was decoded for.
    pub index: u16,
    pub frame_num: i16,
    pub body: Option<FrameBody>,
}

impl Frame {
    /// Reads the frame record expected at slot `index`.
    pub fn read(cursor: &mut ByteCursor<'_>, index: u16) -> Result<Self> {
        let frame_num = cursor.read_i16()?;
        if i32::from(frame_num) != i32::from(index) {
            return Ok(Self {
                index,
                frame_num,
                body: None,
            });
        }

        let flags = FrameFlags::from_bits_retain(cursor.read_u8()?);
        let locomotive_distance = read_if(cursor, flags.contains(FrameFlags::HAS_LOCOMOTIVE), |c| {
            c.read_f32()
        })?;
        let offset = read_if(cursor, flags.contains(FrameFlags::HAS_OFFSET), Point::read)?;
        let bitmap_id = cursor.read_u16()?;
        let (shared_from, sheet) = if flags.contains(FrameFlags::SHARED) {
            (Some(cursor.read_u16()?), None)
        } else {
            let sheet = read_if(
                cursor,
                flags.contains(FrameFlags::HAS_SHEET),
                SheetDescriptor::read,
            )?;
            (None, sheet)
        };
        let bound = Rect::read(cursor)?;
        let children = if flags.contains(FrameFlags::HAS_CHILDREN) {
            ChildTransform::read_list(cursor)?
        } else {
            Vec::new()
        };

        Ok(Self {
            index,
            frame_num,
            body: Some(FrameBody {
                shared_from,
                locomotive_distance,
                offset,
                bitmap_id,
                sheet,
                bound,
                children,
            }),
        })
    }

    /// Returns `true` for a short reference record.
    pub fn is_reference(&self) -> bool {
        self.body.is_none()
    }

    pub fn is_shared(&self) -> bool {
        self.body.as_ref().is_some_and(|b| b.shared_from.is_some())
    }

    pub fn sheet(&self) -> Option<&SheetDescriptor> {
        self.body.as_ref().and_then(|b| b.sheet.as_ref())
    }

    /// The frame's offset, `(0, 0)` when absent.
    pub fn offset(&self) -> Point {
        self.body.as_ref().and_then(|b| b.offset).unwrap_or_default()
    }
}

/// A named event fired at a given frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub frame_number: u16,
}

impl Event {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            name: cursor.read_utf()?,
            frame_number: cursor.read_u16()?,
        })
    }
}

/// A reference to another clip attached to this one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildClipRef {
    pub url: String,
    pub name: String,
    pub class_name: String,
    /// Display-list index of the attached clip.
    pub index: u8,
    /// Whether the clip is drawn in front of its parent.
    pub front: bool,
    pub parent_start_frame: i16,
}

impl ChildClipRef {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        Ok(Self {
            url: cursor.read_utf()?,
            name: cursor.read_utf()?,
            class_name: cursor.read_utf()?,
            index: cursor.read_u8()?,
            front: cursor.read_u8()? != 0,
            parent_start_frame: cursor.read_i16()?,
        })
    }
}

/// A frame index that could not be decoded.
#[derive(Debug)]
pub struct SkippedFrame {
    pub index: u16,
    /// Stream position where the frame record started.
    pub position: usize,
    pub error: Error,
}

/// The frame data of a clip.
#[derive(Debug)]
pub struct FrameSet {
    pub flags: FrameSetFlags,
    pub locomotive_distance: Option<f32>,
    pub events: Vec<Event>,
    pub children: Vec<ChildClipRef>,
    /// The declared number of frames.
    pub frame_count: u16,
    /// Decoded frames in slot order. Slots listed in `skipped` are missing.
    pub frames: Vec<Frame>,
    pub skipped: Vec<SkippedFrame>,
}

impl FrameSet {
    /// Reads a frame set.
    ///
    /// Errors in the clip-level fields are returned. Errors inside a single
    /// frame record are not: that slot is recorded in `skipped` and decoding
    /// moves on to the next slot.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let flags = FrameSetFlags::from_bits_retain(cursor.read_u8()?);
        let locomotive_distance = read_if(
            cursor,
            flags.contains(FrameSetFlags::HAS_LOCOMOTIVE),
            |c| c.read_f32(),
        )?;
        let events = read_if(cursor, flags.contains(FrameSetFlags::HAS_EVENTS), |c| {
            read_list(c, Event::read)
        })?
        .unwrap_or_default();
        let children = read_if(cursor, flags.contains(FrameSetFlags::HAS_CHILDREN), |c| {
            read_list(c, ChildClipRef::read)
        })?
        .unwrap_or_default();

        let frame_count = cursor.read_u16()?;
        let mut frames = Vec::with_capacity(frame_count.into());
        let mut skipped = Vec::new();
        for index in 0..frame_count {
            let position = cursor.tell();
            match Frame::read(cursor, index) {
                Ok(frame) => {
                    debug!(
                        "Frame {} at {:#x}: frame_num {}{}",
                        index,
                        position,
                        frame.frame_num,
                        if frame.is_reference() { " (reference)" } else { "" }
                    );
                    frames.push(frame);
                }
                Err(error) => {
                    // The cursor stays wherever the failing read stopped and
                    // the next slot is decoded from there. Only the rest of
                    // this record is lost, unless the record was longer than
                    // what the failing read assumed.
                    warn!("Skipping frame {} at {:#x}: {}", index, position, error);
                    skipped.push(SkippedFrame {
                        index,
                        position,
                        error,
                    });
                }
            }
        }

        Ok(Self {
            flags,
            locomotive_distance,
            events,
            children,
            frame_count,
            frames,
            skipped,
        })
    }

    /// Looks up a decoded frame by its slot.
    pub fn frame(&self, index: u16) -> Option<&Frame> {
        find_frame(&self.frames, index)
    }
}

/// Looks up a decoded frame by its slot.
pub fn find_frame(frames: &[Frame], index: u16) -> Option<&Frame> {
    frames
        .binary_search_by_key(&index, |f| f.index)
        .ok()
        .map(|i| &frames[i])
}

/// A clip header together with its frame set.
#[derive(Debug)]
pub struct ClipRecord {
    pub id: String,
    pub url: String,
    pub options: ClipOptions,
    /// The declared number of frames.
    pub frame_count: u16,
    /// Playback rate in frames per second.
    pub frame_rate: u8,
    pub scale: Option<f32>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
    pub shrunken_scale: Option<f32>,
    pub frame_set: FrameSet,
}

impl ClipRecord {
    /// Reads a clip header and its frame set.
    ///
    /// Returns `Ok(None)` when the identifier marks the end of the stream; in
    /// that case nothing past the identifier is read.
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Option<Self>> {
        let id = cursor.read_utf()?;
        if is_terminal_id(&id) {
            debug!("Terminal clip identifier {:?} at {:#x}", id, cursor.tell());
            return Ok(None);
        }
        let url = cursor.read_utf()?;
        info!("Found clip: {} ({}) at {:#x}", id, url, cursor.tell());

        let options = ClipOptions::from_bits_retain(cursor.read_u8()?);
        let frame_count = cursor.read_u16()?;
        let frame_rate = cursor.read_u8()?;
        let scale = read_if(cursor, options.contains(ClipOptions::HAS_SCALE), |c| {
            c.read_f32()
        })?;
        let offset_x = read_if(cursor, options.contains(ClipOptions::HAS_OFFSET_X), |c| {
            c.read_f32()
        })?;
        let offset_y = read_if(cursor, options.contains(ClipOptions::HAS_OFFSET_Y), |c| {
            c.read_f32()
        })?;
        let shrunken_scale = read_if(
            cursor,
            options.contains(ClipOptions::HAS_SHRUNKEN_SCALE),
            |c| c.read_f32(),
        )?;

        let frame_set = FrameSet::read(cursor)?;

        Ok(Some(Self {
            id,
            url,
            options,
            frame_count,
            frame_rate,
            scale,
            offset_x,
            offset_y,
            shrunken_scale,
            frame_set,
        }))
    }

    pub fn is_looping(&self) -> bool {
        self.options.contains(ClipOptions::LOOPING) || self.url.contains(PORTRAIT_URL_MARKER)
    }

    pub fn has_sprite_sheet(&self) -> bool {
        self.options.contains(ClipOptions::HAS_SPRITE_SHEET)
    }

    pub fn is_high_quality(&self) -> bool {
        self.options.contains(ClipOptions::HIGH_QUALITY)
    }

    pub fn is_png_encoded(&self) -> bool {
        self.options.contains(ClipOptions::PNG_ENCODED)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frame_set.frames
    }
}
