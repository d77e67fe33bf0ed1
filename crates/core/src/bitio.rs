//! Bit-level I/O over byte streams.
//!
//! `BitWriter` and `BitReader` wrap any `std::io::Write` / `std::io::Read`
//! and move one byte at a time through a single-byte accumulator. Both
//! operate MSB-first: the first bit written lands in bit 7 of the first byte.
//!
//! Neither side buffers more than one byte; wrap files in `BufWriter` /
//! `BufReader` before handing them over.
//!
//! # Padding Rules
//! - BitWriter: `finish` emits the partial final byte with zeros in the
//!   unused low bits. No padding length is recorded anywhere.
//! - BitReader: cannot tell padding from data. The coded stream is
//!   self-terminating (END_OF_STREAM), so a correct decoder stops first.
//!
//! # Example
//! ```
//! use ahf_core::bitio::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new(Vec::new());
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bits(0b11, 2).unwrap();
//! let bytes = writer.finish().unwrap();
//! assert_eq!(bytes, vec![0b1011_1000]);
//!
//! let mut reader = BitReader::new(&bytes[..]);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(2).unwrap(), 0b11);
//! ```

use std::io::{ErrorKind, Read, Write};

use crate::error::{BitIoError, Result};

/// Mask for the most significant bit; the accumulator starts here.
const FIRST_BIT: u8 = 0x80;

/// Writes bits MSB-first into a byte sink.
///
/// # Invariants
/// - `mask` has exactly one bit set and points at the next free bit of `rack`
/// - `mask == FIRST_BIT` iff `rack` holds no pending bits
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    /// Accumulator for the current partial byte
    rack: u8,
    /// Position of the next bit inside `rack`
    mask: u8,
    /// Complete bytes handed to `inner`
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            rack: 0,
            mask: FIRST_BIT,
            bytes_written: 0,
        }
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if bit {
            self.rack |= self.mask;
        }
        self.mask >>= 1;
        if self.mask == 0 {
            self.emit()?;
        }
        Ok(())
    }

    /// Write the lowest `count` bits of `value`, most significant first.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 64
    /// - `Error::Io` if the sink rejects a completed byte
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 == 1)?;
        }

        Ok(())
    }

    /// Flush the partial byte as-is and return the sink.
    ///
    /// The unused low bits of the final byte are zero. Nothing is written
    /// when the stream already ends on a byte boundary.
    pub fn finish(mut self) -> Result<W> {
        if self.mask != FIRST_BIT {
            self.emit()?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }

    /// Number of complete bytes handed to the sink so far.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_written
    }

    /// Total bits written, including the pending partial byte.
    pub fn bit_len(&self) -> u64 {
        self.bytes_written * 8 + u64::from(self.mask.leading_zeros())
    }

    fn emit(&mut self) -> Result<()> {
        self.inner.write_all(&[self.rack])?;
        self.bytes_written += 1;
        self.rack = 0;
        self.mask = FIRST_BIT;
        Ok(())
    }
}

/// Reads bits MSB-first from a byte source.
///
/// # Invariants
/// - when `mask == FIRST_BIT` the next read pulls a fresh byte from `inner`
#[derive(Debug)]
pub struct BitReader<R: Read> {
    inner: R,
    /// The byte currently being consumed
    rack: u8,
    /// Position of the next bit inside `rack`
    mask: u8,
    /// Bytes pulled from `inner`
    bytes_read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            rack: 0,
            mask: FIRST_BIT,
            bytes_read: 0,
        }
    }

    /// Read a single bit.
    ///
    /// # Errors
    /// - `BitIoError::UnexpectedEof` if the source has no more bytes
    /// - `Error::Io` for any other source failure
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.mask == FIRST_BIT {
            self.refill()?;
        }
        let bit = self.rack & self.mask != 0;
        self.mask >>= 1;
        if self.mask == 0 {
            self.mask = FIRST_BIT;
        }
        Ok(bit)
    }

    /// Read `count` bits, most significant first.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 64
    /// - `BitIoError::UnexpectedEof` if the source runs out part way
    pub fn read_bits(&mut self, count: usize) -> Result<u64> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | u64::from(self.read_bit()?);
        }

        Ok(value)
    }

    /// Number of bytes pulled from the source so far.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_read
    }

    /// Return the source, dropping any unread bits of the current byte.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn refill(&mut self) -> Result<()> {
        let mut byte = [0u8; 1];
        match self.inner.read_exact(&mut byte) {
            Ok(()) => {
                self.rack = byte[0];
                self.bytes_read += 1;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(BitIoError::UnexpectedEof {
                bytes_read: self.bytes_read,
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_write_read_single_byte() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b10110011, 8).unwrap();

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b10110011]);

        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(reader.read_bits(8).unwrap(), 0b10110011);
    }

    #[test]
    fn test_write_read_partial_bits() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(0b11, 2).unwrap();
        writer.write_bits(0b000, 3).unwrap();

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b10111000]);

        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.read_bits(2).unwrap(), 0b11);
        assert_eq!(reader.read_bits(3).unwrap(), 0b000);
    }

    #[test]
    fn test_finish_keeps_partial_byte() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bit(true).unwrap();
        assert_eq!(writer.bytes_processed(), 0);

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b10000000]);
    }

    #[test]
    fn test_finish_on_boundary_adds_nothing() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0xABCD, 16).unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0xAB, 0xCD]);
    }

    #[test]
    fn test_multi_byte() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b1010101111110000, 16).unwrap();

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b10101011, 0b11110000]);

        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(reader.read_bits(16).unwrap(), 0b1010101111110000);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0b10101010u8];
        let mut reader = BitReader::new(&data[..]);

        assert_eq!(reader.read_bits(8).unwrap(), 0b10101010);
        assert!(matches!(
            reader.read_bit(),
            Err(Error::BitIo(BitIoError::UnexpectedEof { bytes_read: 1 }))
        ));
    }

    #[test]
    fn test_invalid_bit_count() {
        let mut writer = BitWriter::new(Vec::new());
        assert!(matches!(
            writer.write_bits(0, 65),
            Err(Error::BitIo(BitIoError::InvalidBitCount(65)))
        ));

        let mut reader = BitReader::new(&[0u8; 16][..]);
        assert!(reader.read_bits(65).is_err());
    }

    #[test]
    fn test_zero_bits() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0xFF, 0).unwrap();
        assert!(writer.finish().unwrap().is_empty());

        let mut reader = BitReader::new(&[0xFFu8][..]);
        assert_eq!(reader.read_bits(0).unwrap(), 0);
        assert_eq!(reader.bytes_processed(), 0);
    }

    #[test]
    fn test_64_bit_values() {
        let mut writer = BitWriter::new(Vec::new());
        let val = 0x123456789ABCDEF0u64;
        writer.write_bits(val, 64).unwrap();

        let bytes = writer.finish().unwrap();
        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(reader.read_bits(64).unwrap(), val);
    }

    #[test]
    fn test_bit_by_bit() {
        let mut writer = BitWriter::new(Vec::new());
        let pattern = [true, false, true, true, false, false, true, false];
        for &bit in &pattern {
            writer.write_bit(bit).unwrap();
        }

        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b10110010]);

        let mut reader = BitReader::new(&bytes[..]);
        for &exp in &pattern {
            assert_eq!(reader.read_bit().unwrap(), exp);
        }
    }

    #[test]
    fn test_counters() {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(0b1, 1).unwrap();
        assert_eq!(writer.bit_len(), 1);
        writer.write_bits(0x7F, 7).unwrap();
        assert_eq!(writer.bit_len(), 8);
        writer.write_bits(0b11, 2).unwrap();
        assert_eq!(writer.bit_len(), 10);
        assert_eq!(writer.bytes_processed(), 1);

        let data = [0xFFu8, 0x00, 0xFF];
        let mut reader = BitReader::new(&data[..]);
        reader.read_bits(9).unwrap();
        assert_eq!(reader.bytes_processed(), 2);
        reader.read_bits(7).unwrap();
        assert_eq!(reader.bytes_processed(), 2);
        reader.read_bit().unwrap();
        assert_eq!(reader.bytes_processed(), 3);
    }

    #[test]
    fn test_sink_failure_is_io_error() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(ErrorKind::Other, "disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = BitWriter::new(Broken);
        writer.write_bits(0x7F, 7).unwrap();
        assert!(matches!(writer.write_bit(true), Err(Error::Io(_))));
    }
}
