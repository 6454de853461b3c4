// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  clipextract.rs - Frame and preview extraction demo for animation clip files.
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

use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use clipextract::decoder::*;
use clipextract::export::*;
use clipextract::stream::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The clip file to read.
    input_file: PathBuf,

    /// Directory to write the extracted images to.
    output_dir: PathBuf,

    /// Don't write individual frame images.
    #[arg(long)]
    no_frames: bool,

    /// Don't compile preview animations.
    #[arg(long)]
    no_animation: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(error)
            if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
        {
            error.exit()
        }
        Err(error) => {
            let _ = error.print();
            return ExitCode::FAILURE;
        }
    };

    let decoded = match DecodedClipFile::from_filename(&args.input_file) {
        Ok(cf) => cf,
        Err(error) => {
            eprintln!("Error opening file {:?}: {}", &args.input_file, error);
            return ExitCode::FAILURE;
        }
    };

    // Output goes to a directory named after the input file
    let mut exporter = FileExporter::for_input(&args.output_dir, &args.input_file);
    if let Err(e) = create_dir_all(exporter.root()) {
        eprintln!("Failed to create output directory: {}", e);
        return ExitCode::FAILURE;
    }

    let options = ExtractOptions {
        write_frames: !args.no_frames,
        compile_animations: !args.no_animation,
    };

    match extract(&decoded.content, &options, &mut exporter) {
        Ok(summary) => {
            for clip in &summary.clips {
                println!(
                    "{}: {}/{} frames decoded, {} sprites ({} failed){}",
                    clip.id,
                    clip.frames_decoded,
                    clip.frames_declared,
                    clip.sprites,
                    clip.sprite_failures,
                    if clip.animated { ", animated" } else { "" }
                );
            }
            println!("Output in {}", exporter.root().display());
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("Error decoding file {:?}: {}", &args.input_file, error);
            ExitCode::FAILURE
        }
    }
}
