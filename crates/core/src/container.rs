//! The `.ahf` container: an extension header followed by the coded body.
//!
//! # Stream Format
//!
//! ```text
//! +--------------------------+
//! | extension (8 bits each)  |  ASCII, e.g. "txt"; may be empty
//! +--------------------------+
//! | 0x00 (8 bits)            |  header terminator
//! +--------------------------+
//! | coded symbols            |  adaptive Huffman body
//! | ...                      |
//! | END_OF_STREAM            |
//! +--------------------------+
//! | 0-7 zero pad bits        |  fills the final byte
//! +--------------------------+
//! ```
//!
//! Header and body share one bit stream. While the header is byte aligned,
//! the body starts right after the terminator and is not.
//!
//! There is no magic number, length field or checksum: a stream is only
//! recognisable by its file name, and corruption surfaces as a decode error
//! or as wrong output.

use std::io::{BufReader, BufWriter, Read, Write};

use crate::bitio::{BitReader, BitWriter};
use crate::codec::{self, Decoder, Encoder, Summary};
use crate::error::{Error, Result};
use crate::progress::{NoProgress, Progress};

/// File extension given to compressed output.
pub const EXTENSION: &str = "ahf";

/// Header terminator.
const TERMINATOR: u8 = 0;

/// Longest extension accepted when reading a header.
const MAX_EXTENSION_LEN: usize = 255;

/// Write the extension header.
///
/// # Errors
/// `Error::Header` if the extension is not printable ASCII, holds a path
/// separator or is too long.
pub fn write_header<W: Write>(writer: &mut BitWriter<W>, extension: &str) -> Result<()> {
    validate_extension(extension)?;

    for &unit in extension.as_bytes() {
        writer.write_bits(u64::from(unit), 8)?;
    }
    writer.write_bits(u64::from(TERMINATOR), 8)?;

    Ok(())
}

/// Read the extension header.
///
/// # Errors
/// - `Error::Header` if the extension is not printable ASCII, holds a path
///   separator or never ends
/// - `BitIoError::UnexpectedEof` if the input ends inside the header
pub fn read_header<R: Read>(reader: &mut BitReader<R>) -> Result<String> {
    let mut extension = Vec::new();

    loop {
        let unit = reader.read_bits(8)? as u8;
        if unit == TERMINATOR {
            break;
        }
        if extension.len() == MAX_EXTENSION_LEN {
            return Err(Error::Header(format!(
                "extension longer than {MAX_EXTENSION_LEN} bytes"
            )));
        }
        extension.push(unit);
    }

    let extension = String::from_utf8(extension)
        .map_err(|_| Error::Header("extension is not valid ASCII".to_string()))?;
    validate_extension(&extension)?;

    Ok(extension)
}

fn validate_extension(extension: &str) -> Result<()> {
    if extension.len() > MAX_EXTENSION_LEN {
        return Err(Error::Header(format!(
            "extension longer than {MAX_EXTENSION_LEN} bytes"
        )));
    }
    // Separators would let a header steer the output path.
    if let Some(bad) = extension
        .chars()
        .find(|c| !c.is_ascii_graphic() || matches!(*c, '/' | '\\'))
    {
        return Err(Error::Header(format!(
            "extension contains unsupported character {bad:?}"
        )));
    }
    Ok(())
}

/// Write a complete container: header, then the compressed `source`.
///
/// `total` is the input size used for progress reporting.
pub fn compress<R, W, P>(
    extension: &str,
    source: R,
    sink: W,
    total: u64,
    progress: &mut P,
) -> Result<Summary>
where
    R: Read,
    W: Write,
    P: Progress + ?Sized,
{
    let mut writer = BitWriter::new(BufWriter::new(sink));
    write_header(&mut writer, extension)?;
    codec::encode_body(Encoder::from_writer(writer), source, total, progress)
}

/// An opened container whose header has been read.
///
/// The extension is available before any output is produced, so callers can
/// name the destination after it.
#[derive(Debug)]
pub struct Archive<R: Read> {
    extension: String,
    decoder: Decoder<BufReader<R>>,
}

/// Read the header of a container and prepare to decode its body.
pub fn open<R: Read>(source: R) -> Result<Archive<R>> {
    let mut reader = BitReader::new(BufReader::new(source));
    let extension = read_header(&mut reader)?;

    Ok(Archive {
        extension,
        decoder: Decoder::from_reader(reader),
    })
}

impl<R: Read> Archive<R> {
    /// Extension of the original file, without a leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Decode the body into `sink`.
    ///
    /// `total` is the container size; progress reports container bytes consumed.
    pub fn decode_into<W, P>(self, sink: W, total: u64, progress: &mut P) -> Result<Summary>
    where
        W: Write,
        P: Progress + ?Sized,
    {
        codec::decode_body(self.decoder, sink, total, progress)
    }
}

/// Compress an in-memory buffer into a container.
pub fn encode_bytes(extension: &str, data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    compress(extension, data, &mut out, data.len() as u64, &mut NoProgress)?;
    Ok(out)
}

/// Decompress an in-memory container, returning the extension and the data.
pub fn decode_bytes(container: &[u8]) -> Result<(String, Vec<u8>)> {
    let archive = open(container)?;
    let extension = archive.extension().to_string();
    let mut out = Vec::new();
    archive.decode_into(&mut out, container.len() as u64, &mut NoProgress)?;
    Ok((extension, out))
}
