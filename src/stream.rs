// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/stream.rs - Clip-stream decoder and extraction driver.
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
 * # `stream` Module
 *
 * A decompressed clip file is a sequence of blocks, each made of a clip
 * header, its frame set, and the compressed sprite payloads of its frames.
 * [ClipStream] walks those blocks; [extract] runs the whole pipeline and
 * hands the results to a [ClipSink].
 *
 * ## Usage Example
 *
 * ```no_run
 * use clipextract::decoder::DecodedClipFile;
 * use clipextract::export::{ExtractOptions, FileExporter};
 * use clipextract::stream::extract;
 *
 * fn main() -> Result<(), Box<dyn std::error::Error>> {
 *     let decoded = DecodedClipFile::from_filename("example.clips")?;
 *     let mut exporter = FileExporter::new("out");
 *
 *     let summary = extract(&decoded.content, &ExtractOptions::default(), &mut exporter)?;
 *     for clip in &summary.clips {
 *         println!("{}: {} sprites", clip.id, clip.sprites);
 *     }
 *
 *     Ok(())
 * }
 * ```
 */

use tracing::{info, warn};

use crate::animation::compile;
use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::export::{ClipSink, ExtractOptions};
use crate::parser::ClipRecord;
use crate::sheet::{SpriteSheet, payload_extent};

/// One clip of the stream with its sprite payload bytes.
#[derive(Debug)]
pub struct DecodedClip<'a> {
    pub record: ClipRecord,
    /// Stream position of the first payload byte. Descriptor offsets are
    /// relative to it.
    pub payload_base: usize,
    pub payload: &'a [u8],
    /// The frame descriptors reach past the end of the stream, so the
    /// payload was cut short and no further clip can be located.
    pub truncated: bool,
}

impl DecodedClip<'_> {
    /// Extracts the sprites of this clip.
    ///
    /// Only the clip's own payload slice is touched, so separate clips can be
    /// assembled independently of each other and of the stream.
    pub fn assemble_sprites(&self) -> SpriteSheet {
        SpriteSheet::assemble(self.record.frames(), self.payload, self.payload_base)
    }
}

/// Iterator over the clips of a decompressed stream.
///
/// Ends at the end of the buffer or at a terminal identifier. A decode error
/// in a clip header is yielded once, after which the iterator is exhausted.
#[derive(Debug)]
pub struct ClipStream<'a> {
    cursor: ByteCursor<'a>,
    finished: bool,
}

impl<'a> ClipStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            finished: false,
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.tell()
    }
}

impl<'a> Iterator for ClipStream<'a> {
    type Item = Result<DecodedClip<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.cursor.is_at_end() {
            self.finished = true;
            return None;
        }

        let record = match ClipRecord::read(&mut self.cursor) {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.finished = true;
                return None;
            }
            Err(error) => {
                self.finished = true;
                return Some(Err(error));
            }
        };

        let payload_base = self.cursor.tell();
        let extent = payload_extent(record.frames());
        let truncated = extent > self.cursor.remaining();
        if truncated {
            warn!(
                "Clip {} declares {} payload bytes at {:#x}, but only {} remain; \
                 any following clips are lost",
                record.id,
                extent,
                payload_base,
                self.cursor.remaining()
            );
        }
        self.cursor.seek(payload_base.saturating_add(extent));
        let payload = &self.cursor.data()[payload_base..self.cursor.tell()];

        Some(Ok(DecodedClip {
            record,
            payload_base,
            payload,
            truncated,
        }))
    }
}

/// What happened to one clip during [extract].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSummary {
    pub id: String,
    pub frames_declared: u16,
    pub frames_decoded: usize,
    pub frames_skipped: usize,
    pub sprites: usize,
    pub sprite_failures: usize,
    pub write_failures: usize,
    pub animated: bool,
    pub payload_truncated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub clips: Vec<ClipSummary>,
}

/// Decodes every clip in `data` and writes its images to `sink`.
///
/// Frame, sprite, preview and image-writing failures are logged, counted in
/// the summary and otherwise ignored. A clip header that cannot be decoded, or a
/// sink that cannot prepare a clip, stops the run with an error; everything
/// already written for earlier clips stays.
pub fn extract<S: ClipSink + ?Sized>(
    data: &[u8],
    options: &ExtractOptions,
    sink: &mut S,
) -> Result<ExtractSummary> {
    let mut summary = ExtractSummary::default();

    for clip in ClipStream::new(data) {
        let clip = clip?;
        let record = &clip.record;
        info!(
            "Parsed clip: {} | frames: {}",
            record.id,
            record.frames().len()
        );

        let sheet = clip.assemble_sprites();
        let mut write_failures = 0;
        let mut animated = false;

        if options.write_frames || options.compile_animations {
            sink.prepare_clip(&record.id)?;
        }

        if options.write_frames {
            for (&index, image) in &sheet.sprites {
                if let Err(error) = sink.write_frame(&record.id, index, image) {
                    warn!("Failed to write frame {}/{}: {}", record.id, index, error);
                    write_failures += 1;
                }
            }
            info!("Decompressed frames for {}", record.id);
        }

        if options.compile_animations {
            match compile(record.frames(), &sheet, record.frame_rate) {
                Ok(Some(animation)) => match sink.write_animation(&record.id, &animation) {
                    Ok(()) => animated = true,
                    Err(error) => {
                        warn!("Failed to write animation for {}: {}", record.id, error);
                        write_failures += 1;
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    warn!("Failed to compile animation for {}: {}", record.id, error);
                    write_failures += 1;
                }
            }
        }

        summary.clips.push(ClipSummary {
            id: record.id.clone(),
            frames_declared: record.frame_set.frame_count,
            frames_decoded: record.frames().len(),
            frames_skipped: record.frame_set.skipped.len(),
            sprites: sheet.sprites.len(),
            sprite_failures: sheet.failures.len(),
            write_failures,
            animated,
            payload_truncated: clip.truncated,
        });
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Animation;
    use crate::error::Error;
    use crate::sheet::RgbaImage;
    use crate::testutil::{ByteWriter, solid_argb, zlib};

    #[derive(Default)]
    struct MemorySink {
        prepared: Vec<String>,
        frames: Vec<(String, u16, RgbaImage)>,
        animations: Vec<(String, Animation)>,
    }

    impl ClipSink for MemorySink {
        fn prepare_clip(&mut self, clip_id: &str) -> Result<()> {
            self.prepared.push(clip_id.to_string());
            Ok(())
        }

        fn write_frame(&mut self, clip_id: &str, index: u16, image: &RgbaImage) -> Result<()> {
            self.frames.push((clip_id.to_string(), index, image.clone()));
            Ok(())
        }

        fn write_animation(&mut self, clip_id: &str, animation: &Animation) -> Result<()> {
            self.animations
                .push((clip_id.to_string(), animation.clone()));
            Ok(())
        }
    }

    /// Appends a clip with two sprite frames and one reference frame.
    fn write_clip(w: &mut ByteWriter, id: &str) {
        let a = zlib(&solid_argb(2, 2, [0xFF, 0x10, 0x20, 0x30]));
        let b = zlib(&solid_argb(1, 1, [0xFF, 0x40, 0x50, 0x60]));
        w.clip_header(id, 3, 12).u8(0x00).u16(3);
        w.sheet_frame(0, (0.0, 0.0), 0, a.len() as i32, (2, 2));
        w.sheet_frame(1, (1.0, 0.0), a.len() as u32, b.len() as i32, (1, 1));
        w.i16(0);
        w.raw(&a).raw(&b);
    }

    #[test]
    fn test_single_clip_to_end_of_buffer() {
        let mut w = ByteWriter::new();
        write_clip(&mut w, "walk");

        let clips: Vec<_> = ClipStream::new(&w.bytes).collect();
        assert_eq!(clips.len(), 1);
        let clip = clips.into_iter().next().unwrap().unwrap();
        assert_eq!(clip.record.id, "walk");
        assert_eq!(clip.payload_base + clip.payload.len(), w.len());
        assert!(!clip.truncated);
    }

    #[test]
    fn test_payload_past_end_of_stream() {
        let a = zlib(&solid_argb(1, 1, [0xFF, 1, 2, 3]));
        let mut w = ByteWriter::new();
        w.clip_header("cut", 2, 12).u8(0x00).u16(2);
        w.sheet_frame(0, (0.0, 0.0), 0, a.len() as i32, (1, 1));
        w.sheet_frame(1, (0.0, 0.0), 0x7FFF_0000, 16, (1, 1));
        w.raw(&a);
        write_clip(&mut w, "lost");

        let clips: Vec<_> = ClipStream::new(&w.bytes).map(|clip| clip.unwrap()).collect();
        assert_eq!(clips.len(), 1);
        assert!(clips[0].truncated);
        assert_eq!(clips[0].payload_base + clips[0].payload.len(), w.len());

        let mut sink = MemorySink::default();
        let summary = extract(&w.bytes, &ExtractOptions::default(), &mut sink).unwrap();
        assert_eq!(summary.clips.len(), 1);
        assert!(summary.clips[0].payload_truncated);
        assert_eq!(summary.clips[0].sprites, 1);
        assert_eq!(summary.clips[0].sprite_failures, 1);
    }

    #[test]
    fn test_oversized_preview_does_not_stop_extraction() {
        let a = zlib(&solid_argb(1, 1, [0xFF, 1, 2, 3]));
        let mut w = ByteWriter::new();
        w.clip_header("scattered", 2, 12).u8(0x00).u16(2);
        w.sheet_frame(0, (-2e9, -2e9), 0, a.len() as i32, (1, 1));
        w.sheet_frame(1, (2e9, 2e9), a.len() as u32, a.len() as i32, (1, 1));
        w.raw(&a).raw(&a);
        write_clip(&mut w, "walk");

        let mut sink = MemorySink::default();
        let summary = extract(&w.bytes, &ExtractOptions::default(), &mut sink).unwrap();
        assert_eq!(summary.clips.len(), 2);

        let scattered = &summary.clips[0];
        assert_eq!(scattered.sprites, 2);
        assert_eq!(scattered.write_failures, 1);
        assert!(!scattered.animated);
        assert!(summary.clips[1].animated);

        let animated: Vec<&str> = sink.animations.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(animated, vec!["walk"]);
        assert_eq!(sink.frames.len(), 4);
    }

    #[test]
    fn test_empty_id_terminates() {
        let mut w = ByteWriter::new();
        w.utf("");
        write_clip(&mut w, "never");

        let mut stream = ClipStream::new(&w.bytes);
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
        assert_eq!(stream.position(), 2);

        let mut sink = MemorySink::default();
        let summary = extract(&w.bytes, &ExtractOptions::default(), &mut sink).unwrap();
        assert!(summary.clips.is_empty());
        assert!(sink.prepared.is_empty());
    }

    #[test]
    fn test_consecutive_clips_and_terminator() {
        let mut w = ByteWriter::new();
        write_clip(&mut w, "walk");
        write_clip(&mut w, "run");
        w.utf("end.clipq");

        let ids: Vec<String> = ClipStream::new(&w.bytes)
            .map(|clip| clip.unwrap().record.id)
            .collect();
        assert_eq!(ids, vec!["walk", "run"]);
    }

    #[test]
    fn test_header_underrun_is_fatal() {
        let mut w = ByteWriter::new();
        write_clip(&mut w, "walk");
        w.utf("broken").utf("assets/broken.swf").u8(0x00);

        let mut stream = ClipStream::new(&w.bytes);
        assert!(stream.next().unwrap().is_ok());
        assert!(matches!(
            stream.next(),
            Some(Err(Error::BufferUnderrun { .. }))
        ));
        assert!(stream.next().is_none());

        let mut sink = MemorySink::default();
        let result = extract(&w.bytes, &ExtractOptions::default(), &mut sink);
        assert!(matches!(result, Err(Error::BufferUnderrun { .. })));
        assert_eq!(sink.prepared, vec!["walk"]);
        assert_eq!(sink.frames.len(), 2);
    }

    #[test]
    fn test_extract_writes_frames_and_animation() {
        let mut w = ByteWriter::new();
        write_clip(&mut w, "walk");

        let mut sink = MemorySink::default();
        let summary = extract(&w.bytes, &ExtractOptions::default(), &mut sink).unwrap();
        assert_eq!(
            summary.clips,
            vec![ClipSummary {
                id: "walk".to_string(),
                frames_declared: 3,
                frames_decoded: 3,
                frames_skipped: 0,
                sprites: 2,
                sprite_failures: 0,
                write_failures: 0,
                animated: true,
                payload_truncated: false,
            }]
        );

        let indices: Vec<u16> = sink.frames.iter().map(|(_, i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(sink.frames[0].2.pixels, [0x10, 0x20, 0x30, 0xFF].repeat(4));

        let (id, animation) = &sink.animations[0];
        assert_eq!(id, "walk");
        assert_eq!(animation.delay_ms, 83);
        assert_eq!(animation.canvases.len(), 3);
        assert_eq!(animation.canvases[2], animation.canvases[0]);
    }

    #[test]
    fn test_extract_options() {
        let mut w = ByteWriter::new();
        write_clip(&mut w, "walk");

        let mut sink = MemorySink::default();
        let options = ExtractOptions {
            write_frames: false,
            compile_animations: true,
        };
        extract(&w.bytes, &options, &mut sink).unwrap();
        assert!(sink.frames.is_empty());
        assert_eq!(sink.animations.len(), 1);

        let mut sink = MemorySink::default();
        let options = ExtractOptions {
            write_frames: false,
            compile_animations: false,
        };
        let summary = extract(&w.bytes, &options, &mut sink).unwrap();
        assert!(sink.prepared.is_empty());
        assert_eq!(summary.clips[0].sprites, 2);
        assert!(!summary.clips[0].animated);
    }
}
