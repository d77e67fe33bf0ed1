//! Symbol-level adaptive Huffman encoding and decoding.
//!
//! `Encoder` and `Decoder` each own a fresh `CodeTree` and one end of a bit
//! stream. Both sides apply the same sequence of tree mutations, so the
//! decoder's tree tracks the encoder's exactly:
//!
//! 1. code the symbol with the current tree (an unseen byte is sent as the
//!    ESCAPE code followed by an 8-bit literal, and gets a new leaf)
//! 2. update the model for that byte
//!
//! The stream ends with the END_OF_STREAM code. Whatever bits follow it in
//! the final byte are padding and are never read.

use std::io::{BufReader, BufWriter, Read, Write};

use tracing::info;

use crate::bitio::{BitReader, BitWriter};
use crate::error::{Result, StructuralError};
use crate::progress::Progress;
use crate::tree::{CodeTree, NodeKind, Symbol};

/// Width of the literal that follows an ESCAPE code.
pub const LITERAL_BITS: usize = 8;

/// Counters describing one coding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecStats {
    /// Data symbols coded (END_OF_STREAM excluded)
    pub symbols: u64,
    /// Symbols sent as ESCAPE + literal
    pub escapes: u64,
    /// Tree rebuilds triggered by the weight ceiling
    pub rebuilds: u64,
    /// Bits spent on symbol codes and literals
    pub code_bits: u64,
}

/// Result of a whole-stream encode or decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub stats: CodecStats,
}

/// Adaptive Huffman encoder writing into a bit stream.
#[derive(Debug)]
pub struct Encoder<W: Write> {
    tree: CodeTree,
    writer: BitWriter<W>,
    stats: CodecStats,
}

impl<W: Write> Encoder<W> {
    pub fn new(sink: W) -> Self {
        Self::from_writer(BitWriter::new(sink))
    }

    /// Continue an existing bit stream (e.g., after a header).
    pub fn from_writer(writer: BitWriter<W>) -> Self {
        Self {
            tree: CodeTree::new(),
            writer,
            stats: CodecStats::default(),
        }
    }

    pub fn tree(&self) -> &CodeTree {
        &self.tree
    }

    /// Write the code for `symbol` and return the number of bits spent.
    ///
    /// A byte not yet in the tree is written as the ESCAPE path plus an 8-bit
    /// literal and is inserted into the tree. Weights are not touched; call
    /// `update` afterwards for data symbols.
    ///
    /// # Errors
    /// - `StructuralError::InvalidSymbol` for ESCAPE itself
    /// - bit I/O errors from the sink
    pub fn encode_symbol(&mut self, symbol: Symbol) -> Result<usize> {
        if symbol == Symbol::Escape {
            return Err(StructuralError::InvalidSymbol(symbol.value()).into());
        }

        let (slot, literal) = match (self.tree.leaf(symbol), symbol) {
            (Some(slot), _) => (slot, None),
            (None, Symbol::Byte(byte)) => {
                let escape = self
                    .tree
                    .leaf(Symbol::Escape)
                    .ok_or(StructuralError::MissingLeaf(Symbol::Escape.value()))?;
                (escape, Some(byte))
            }
            (None, _) => return Err(StructuralError::MissingLeaf(symbol.value()).into()),
        };

        let code = self.tree.path(slot)?;
        self.writer.write_bits(code.bits, code.len)?;
        let mut cost = code.len;

        if let Some(byte) = literal {
            self.writer.write_bits(u64::from(byte), LITERAL_BITS)?;
            self.tree.insert(symbol)?;
            self.stats.escapes += 1;
            cost += LITERAL_BITS;
        }

        self.stats.code_bits += cost as u64;
        Ok(cost)
    }

    /// Apply the post-symbol model update.
    pub fn update(&mut self, symbol: Symbol) -> Result<()> {
        self.tree.update(symbol)?;
        self.stats.symbols += 1;
        Ok(())
    }

    /// Encode one data byte and update the model. Returns the bit cost.
    pub fn push(&mut self, byte: u8) -> Result<usize> {
        let symbol = Symbol::Byte(byte);
        let cost = self.encode_symbol(symbol)?;
        self.update(symbol)?;
        Ok(cost)
    }

    /// Bytes fully emitted to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_processed()
    }

    pub fn stats(&self) -> CodecStats {
        CodecStats {
            rebuilds: self.tree.rebuilds(),
            ..self.stats
        }
    }

    /// Terminate the stream with END_OF_STREAM and flush the final byte.
    pub fn finish(mut self) -> Result<(W, Summary)> {
        self.encode_symbol(Symbol::EndOfStream)?;

        let bytes_written = self.writer.bit_len().div_ceil(8);
        let stats = self.stats();
        let sink = self.writer.finish()?;

        Ok((
            sink,
            Summary {
                bytes_read: stats.symbols,
                bytes_written,
                stats,
            },
        ))
    }
}

/// Adaptive Huffman decoder reading from a bit stream.
#[derive(Debug)]
pub struct Decoder<R: Read> {
    tree: CodeTree,
    reader: BitReader<R>,
    stats: CodecStats,
    finished: bool,
}

impl<R: Read> Decoder<R> {
    pub fn new(source: R) -> Self {
        Self::from_reader(BitReader::new(source))
    }

    /// Continue an existing bit stream (e.g., after a header).
    pub fn from_reader(reader: BitReader<R>) -> Self {
        Self {
            tree: CodeTree::new(),
            reader,
            stats: CodecStats::default(),
            finished: false,
        }
    }

    pub fn tree(&self) -> &CodeTree {
        &self.tree
    }

    /// Walk the tree from the root to a leaf and return its symbol.
    ///
    /// An ESCAPE leaf is resolved by reading the 8-bit literal that follows
    /// and inserting it, so the result is never `Symbol::Escape`. Weights
    /// are not touched; call `update` afterwards for data symbols.
    ///
    /// # Errors
    /// - `StructuralError::NodeOutOfRange` if a step leaves the occupied slots
    /// - `StructuralError::DuplicateSymbol` if an escaped literal is known
    /// - `BitIoError::UnexpectedEof` if the input is truncated
    pub fn decode_symbol(&mut self) -> Result<Symbol> {
        let mut current = 0usize;
        let mut cost = 0usize;

        let symbol = loop {
            let node = self
                .tree
                .nodes()
                .get(current)
                .ok_or(StructuralError::NodeOutOfRange {
                    index: current,
                    limit: self.tree.next_free_node(),
                })?;

            match node.kind {
                NodeKind::Leaf(symbol) => break symbol,
                NodeKind::Internal { child } => {
                    let bit = self.reader.read_bit()?;
                    current = child.get() + usize::from(bit);
                    cost += 1;
                }
            }
        };

        let symbol = if symbol == Symbol::Escape {
            let byte = self.reader.read_bits(LITERAL_BITS)? as u8;
            let symbol = Symbol::Byte(byte);
            self.tree.insert(symbol)?;
            self.stats.escapes += 1;
            cost += LITERAL_BITS;
            symbol
        } else {
            symbol
        };

        self.stats.code_bits += cost as u64;
        Ok(symbol)
    }

    /// Apply the post-symbol model update.
    pub fn update(&mut self, symbol: Symbol) -> Result<()> {
        self.tree.update(symbol)?;
        self.stats.symbols += 1;
        Ok(())
    }

    /// Decode the next data byte, or `None` once END_OF_STREAM is seen.
    pub fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.finished {
            return Ok(None);
        }

        match self.decode_symbol()? {
            Symbol::Byte(byte) => {
                self.update(Symbol::Byte(byte))?;
                Ok(Some(byte))
            }
            Symbol::EndOfStream => {
                self.finished = true;
                Ok(None)
            }
            Symbol::Escape => Err(StructuralError::InvalidSymbol(Symbol::Escape.value()).into()),
        }
    }

    /// True once END_OF_STREAM has been decoded.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bytes pulled from the source so far.
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_processed()
    }

    pub fn stats(&self) -> CodecStats {
        CodecStats {
            rebuilds: self.tree.rebuilds(),
            ..self.stats
        }
    }
}

/// Compress everything from `source` into `sink`.
///
/// `total` is the expected input size, passed through to `progress`.
/// Both ends are buffered internally.
pub fn encode<R, W, P>(source: R, sink: W, total: u64, progress: &mut P) -> Result<Summary>
where
    R: Read,
    W: Write,
    P: Progress + ?Sized,
{
    encode_body(Encoder::new(BufWriter::new(sink)), source, total, progress)
}

/// Decompress a stream produced by `encode`.
///
/// `total` is the compressed size; progress reports compressed bytes consumed.
pub fn decode<R, W, P>(source: R, sink: W, total: u64, progress: &mut P) -> Result<Summary>
where
    R: Read,
    W: Write,
    P: Progress + ?Sized,
{
    decode_body(Decoder::new(BufReader::new(source)), sink, total, progress)
}

pub(crate) fn encode_body<R, W, P>(
    mut encoder: Encoder<W>,
    source: R,
    total: u64,
    progress: &mut P,
) -> Result<Summary>
where
    R: Read,
    W: Write,
    P: Progress + ?Sized,
{
    let mut processed = 0u64;
    for byte in BufReader::new(source).bytes() {
        encoder.push(byte?)?;
        processed += 1;
        progress.on_progress(processed, total);
    }

    let (_sink, summary) = encoder.finish()?;
    info!(
        bytes_in = summary.bytes_read,
        bytes_out = summary.bytes_written,
        escapes = summary.stats.escapes,
        rebuilds = summary.stats.rebuilds,
        "encode complete"
    );
    Ok(summary)
}

pub(crate) fn decode_body<R, W, P>(
    mut decoder: Decoder<R>,
    sink: W,
    total: u64,
    progress: &mut P,
) -> Result<Summary>
where
    R: Read,
    W: Write,
    P: Progress + ?Sized,
{
    let mut out = BufWriter::new(sink);
    let mut written = 0u64;
    while let Some(byte) = decoder.next_byte()? {
        out.write_all(&[byte])?;
        written += 1;
        progress.on_progress(decoder.bytes_read(), total);
    }
    out.flush()?;

    let summary = Summary {
        bytes_read: decoder.bytes_read(),
        bytes_written: written,
        stats: decoder.stats(),
    };
    info!(
        bytes_in = summary.bytes_read,
        bytes_out = summary.bytes_written,
        rebuilds = summary.stats.rebuilds,
        "decode complete"
    );
    Ok(summary)
}
