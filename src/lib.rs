// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/lib.rs - Decoder and sprite extractor for animation clip streams.
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
 * # `clipextract` Crate
 *
 * A library for decoding the compressed sprite-sheet animation clip files of
 * a legacy vector-animation runtime, and for extracting their frames as
 * images.
 *
 * This crate provides a full pipeline for working with these clip files:
 *
 * 1. [decoder]: Decompresses the container.
 * 2. [cursor] and [parser]: Decode clip headers, frame sets, frames and
 *    display-list transforms from the decompressed bytes.
 * 3. [stream]: Walks the clips of a stream and delimits their sprite payloads.
 * 4. [sheet]: Inflates sprite payloads into RGBA images.
 * 5. [animation]: Composites a clip's sprites into a looping preview.
 * 6. [export]: Writes frames and previews to disk.
 *
 * ## Usage Example
 *
 * ```no_run
 * use clipextract::decoder::DecodedClipFile;
 * use clipextract::stream::ClipStream;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     // Decompress the file
 *     let decoded = DecodedClipFile::from_filename("example.clips")?;
 *
 *     // Walk the clips
 *     for clip in ClipStream::new(&decoded.content) {
 *         let clip = clip?;
 *         let sheet = clip.assemble_sprites();
 *         println!("Clip: {} ({})", clip.record.id, clip.record.url);
 *         for (index, image) in &sheet.sprites {
 *             println!("  Frame {}: {}x{}", index, image.width, image.height);
 *         }
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

pub mod animation;
pub mod cursor;
pub mod decoder;
pub mod error;
pub mod export;
pub mod parser;
pub mod sheet;
pub mod stream;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
