// SPDX-License-Identifier: GPL-3.0-or-later

/*
 *  src/decoder.rs - Decoder for compressed clip container files.
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

use std::fs::File;
use std::io::BufReader;
use std::io::prelude::*;
use std::path::Path;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use tracing::debug;

use crate::error::{Error, Result};

fn has_zlib_header(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => *cmf == 0x78 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}

/// Inflates a zlib-wrapped or raw deflate blob.
///
/// The container and most sprite payloads carry a zlib header; anything
/// without one is treated as a bare deflate stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(data.len().saturating_mul(4));
    let result = if has_zlib_header(data) {
        ZlibDecoder::new(data).read_to_end(&mut buffer)
    } else {
        DeflateDecoder::new(data).read_to_end(&mut buffer)
    };
    result.map_err(Error::Decompression)?;
    Ok(buffer)
}

/// The decompressed contents of a clip container file.
#[derive(Debug)]
pub struct DecodedClipFile {
    pub content: Vec<u8>,
}

impl DecodedClipFile {
    pub fn from_filename<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let file = File::open(filename)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Self::from_compressed(&buffer)
    }

    pub fn from_compressed(data: &[u8]) -> Result<Self> {
        let content = inflate(data)?;
        debug!(
            "Inflated {} container bytes into {} bytes",
            data.len(),
            content.len()
        );
        Ok(Self { content })
    }
}
