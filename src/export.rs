// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/export.rs - Image output for extracted clips.
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

use std::fs::{File, create_dir_all};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::animation::Animation;
use crate::error::{Error, Result};
use crate::sheet::RgbaImage;

/// What [crate::stream::extract] produces for each clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Write every extracted sprite as a still image.
    pub write_frames: bool,
    /// Compile and write a looping preview animation.
    pub compile_animations: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            write_frames: true,
            compile_animations: true,
        }
    }
}

/// Destination for the images extracted from a clip stream.
pub trait ClipSink {
    /// Called once per clip before any of its images are written.
    fn prepare_clip(&mut self, clip_id: &str) -> Result<()>;

    /// Writes the sprite of the frame at slot `index`.
    fn write_frame(&mut self, clip_id: &str, index: u16, image: &RgbaImage) -> Result<()>;

    /// Writes a clip's preview animation.
    fn write_animation(&mut self, clip_id: &str, animation: &Animation) -> Result<()>;
}

/// Reduces a clip identifier to a single path component.
///
/// Path separators and drive colons become `_`; empty, `.` and `..` segments
/// are dropped. An identifier with nothing left becomes `_`.
pub fn clip_file_name(clip_id: &str) -> String {
    let name = clip_id
        .split(['/', '\\'])
        .filter(|part| !matches!(*part, "" | "." | ".."))
        .map(|part| part.replace(':', "_"))
        .collect::<Vec<_>>()
        .join("_");
    if name.is_empty() { "_".to_string() } else { name }
}

/// Writes PNG frames and GIF previews below a root directory.
///
/// Layout: `<root>/<clip>/frames/<index>.png` and `<root>/<clip>/<clip>.gif`,
/// where `<clip>` is the identifier passed through [clip_file_name], so
/// nothing is ever written outside the root.
#[derive(Debug, Clone)]
pub struct FileExporter {
    root: PathBuf,
}

impl FileExporter {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Exporter rooted at `<output_dir>/<file name of input>`.
    pub fn for_input(output_dir: &Path, input: &Path) -> Self {
        let name = input.file_name().unwrap_or_default();
        Self::new(output_dir.join(name))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn clip_dir(&self, clip_id: &str) -> PathBuf {
        self.root.join(clip_file_name(clip_id))
    }

    pub fn frame_path(&self, clip_id: &str, index: u16) -> PathBuf {
        self.clip_dir(clip_id)
            .join("frames")
            .join(format!("{:03}.png", index))
    }

    pub fn animation_path(&self, clip_id: &str) -> PathBuf {
        self.clip_dir(clip_id)
            .join(format!("{}.gif", clip_file_name(clip_id)))
    }
}

impl ClipSink for FileExporter {
    fn prepare_clip(&mut self, clip_id: &str) -> Result<()> {
        create_dir_all(self.clip_dir(clip_id).join("frames"))?;
        Ok(())
    }

    fn write_frame(&mut self, clip_id: &str, index: u16, image: &RgbaImage) -> Result<()> {
        save_png(&self.frame_path(clip_id, index), image)
    }

    fn write_animation(&mut self, clip_id: &str, animation: &Animation) -> Result<()> {
        let path = self.animation_path(clip_id);
        save_gif(&path, animation)?;
        info!("Compiled GIF for {}: {}", clip_id, path.display());
        Ok(())
    }
}

/// Writes an RGBA image as an 8-bit PNG.
pub fn save_png(path: &Path, image: &RgbaImage) -> Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image.pixels)?;
    png_writer.finish()?;
    Ok(())
}

/// Writes an animation as an endlessly looping GIF.
///
/// Each canvas replaces the previous one (disposal to background), so
/// transparent areas never show earlier frames.
pub fn save_gif(path: &Path, animation: &Animation) -> Result<()> {
    let width = animation.bounds.width();
    let height = animation.bounds.height();
    let too_large = || Error::ImageTooLarge { width, height };
    let gif_width = u16::try_from(width).map_err(|_| too_large())?;
    let gif_height = u16::try_from(height).map_err(|_| too_large())?;

    let file = File::create(path)?;
    let mut encoder = gif::Encoder::new(BufWriter::new(file), gif_width, gif_height, &[])?;
    encoder.set_repeat(gif::Repeat::Infinite)?;

    // GIF delays are in hundredths of a second
    let delay = u16::try_from(animation.delay_ms / 10).unwrap_or(u16::MAX);

    for canvas in &animation.canvases {
        let mut pixels = canvas.pixels.clone();
        let mut frame = gif::Frame::from_rgba_speed(gif_width, gif_height, &mut pixels, 10);
        frame.delay = delay;
        frame.dispose = gif::DisposalMethod::Background;
        encoder.write_frame(&frame)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::UnionBox;

    use std::fs;

    use tempfile::tempdir;

    #[test]
    fn test_paths() {
        let exporter = FileExporter::for_input(Path::new("out"), Path::new("data/hero.clips"));
        assert_eq!(exporter.root(), Path::new("out/hero.clips"));
        assert_eq!(
            exporter.frame_path("walk", 7),
            Path::new("out/hero.clips/walk/frames/007.png")
        );
        assert_eq!(
            exporter.animation_path("walk"),
            Path::new("out/hero.clips/walk/walk.gif")
        );
    }

    #[test]
    fn test_paths_stay_below_root() {
        let exporter = FileExporter::new("/tmp/out/hero.clips");
        assert_eq!(
            exporter.frame_path("/etc/evil", 0),
            Path::new("/tmp/out/hero.clips/etc_evil/frames/000.png")
        );
        assert_eq!(exporter.clip_dir("../../x"), Path::new("/tmp/out/hero.clips/x"));
        assert_eq!(
            exporter.animation_path("chars\\hero/./walk"),
            Path::new("/tmp/out/hero.clips/chars_hero_walk/chars_hero_walk.gif")
        );
        assert_eq!(exporter.clip_dir(".."), Path::new("/tmp/out/hero.clips/_"));
        assert_eq!(clip_file_name("C:\\x"), "C__x");
    }

    #[test]
    fn test_writes_png_and_gif() {
        let dir = tempdir().unwrap();
        let mut exporter = FileExporter::new(dir.path());

        let mut image = RgbaImage::new(2, 2).unwrap();
        image.pixels[..4].copy_from_slice(&[0xFF, 0x00, 0x00, 0xFF]);

        exporter.prepare_clip("walk").unwrap();
        exporter.write_frame("walk", 0, &image).unwrap();

        let png_bytes = fs::read(dir.path().join("walk/frames/000.png")).unwrap();
        assert_eq!(&png_bytes[..8], b"\x89PNG\r\n\x1a\n");

        let animation = Animation {
            bounds: UnionBox {
                min_x: 0,
                min_y: 0,
                max_x: 2,
                max_y: 2,
            },
            delay_ms: 41,
            canvases: vec![image.clone(), RgbaImage::new(2, 2).unwrap()],
        };
        exporter.write_animation("walk", &animation).unwrap();

        let gif_bytes = fs::read(dir.path().join("walk/walk.gif")).unwrap();
        assert_eq!(&gif_bytes[..6], b"GIF89a");
    }

    #[test]
    fn test_gif_size_limit() {
        let dir = tempdir().unwrap();
        let animation = Animation {
            bounds: UnionBox {
                min_x: 0,
                min_y: 0,
                max_x: 70000,
                max_y: 1,
            },
            delay_ms: 100,
            canvases: Vec::new(),
        };
        assert!(matches!(
            save_gif(&dir.path().join("big.gif"), &animation),
            Err(Error::ImageTooLarge { width: 70000, .. })
        ));
    }
}
