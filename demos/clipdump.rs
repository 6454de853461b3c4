// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  clipdump.rs - Record dump demo for animation clip files.
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

use clap::Parser;

use clipextract::decoder::*;
use clipextract::stream::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The file to read.
    file: String,

    /// Also list the frame records of each clip.
    #[arg(short, long)]
    frames: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let decoded = match DecodedClipFile::from_filename(&args.file) {
        Ok(cf) => cf,
        Err(error) => {
            eprintln!("Error opening file {:?}: {:?}", &args.file, error);
            return;
        }
    };

    for clip in ClipStream::new(&decoded.content) {
        let clip = match clip {
            Ok(clip) => clip,
            Err(error) => {
                eprintln!("Error parsing file {:?}: {:?}", &args.file, error);
                return;
            }
        };

        let record = &clip.record;
        println!(
            "{} ({}) options={:?} rate={} frames={}/{} payload={:#x}+{}",
            record.id,
            record.url,
            record.options,
            record.frame_rate,
            record.frames().len(),
            record.frame_count,
            clip.payload_base,
            clip.payload.len()
        );
        for event in &record.frame_set.events {
            println!("  event {:?} at frame {}", event.name, event.frame_number);
        }
        for child in &record.frame_set.children {
            println!("  child {:?}", child);
        }
        for skipped in &record.frame_set.skipped {
            println!(
                "  skipped frame {} at {:#x}: {}",
                skipped.index, skipped.position, skipped.error
            );
        }
        if args.frames {
            for frame in record.frames() {
                println!("  {:?}", frame);
            }
        }
    }
}
