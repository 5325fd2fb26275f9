//! A positioned reader over an in-memory byte buffer.
//!
//! [`ByteStream`] is the cursor shared by every decoding routine in this
//! crate. It reads fixed-width numbers in the configured byte order,
//! tracks the absolute position, and collects warnings about malformed
//! content which did not stop the decoding process.

use byteordered::{ByteOrdered, Endianness};
use snafu::{Backtrace, ResultExt, Snafu};

/// Module-level error type:
/// for attempts to read or move outside of the buffer.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display(
        "Attempted to read {} bytes at position {}, but the stream only has {} bytes",
        requested,
        position,
        len
    ))]
    UnexpectedEnd {
        position: usize,
        requested: usize,
        len: usize,
        backtrace: Backtrace,
    },
    #[snafu(display(
        "Cannot seek {} bytes from position {} in a stream of {} bytes",
        offset,
        position,
        len
    ))]
    SeekOutOfBounds {
        position: usize,
        offset: i64,
        len: usize,
        backtrace: Backtrace,
    },
    #[snafu(display("Could not decode number at position {}", position))]
    DecodeNumber {
        position: usize,
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A cursor over a fully addressable byte buffer.
#[derive(Debug, Clone)]
pub struct ByteStream<'a> {
    data: &'a [u8],
    position: usize,
    endianness: Endianness,
    warnings: Vec<String>,
}

impl<'a> ByteStream<'a> {
    /// Create a little endian stream positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_endianness(data, Endianness::Little)
    }

    /// Create a stream positioned at the start of `data`,
    /// reading numbers in the given byte order.
    pub fn with_endianness(data: &'a [u8], endianness: Endianness) -> Self {
        ByteStream {
            data,
            position: 0,
            endianness,
            warnings: Vec::new(),
        }
    }

    /// Place the cursor at an absolute position,
    /// such as right after a file preamble.
    pub fn starting_at(mut self, position: usize) -> Result<Self> {
        if position > self.data.len() {
            return SeekOutOfBoundsSnafu {
                position: self.position,
                offset: position as i64,
                len: self.data.len(),
            }
            .fail();
        }
        self.position = position;
        Ok(self)
    }

    /// The absolute position of the cursor.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// The total number of addressable bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The number of bytes between the cursor and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether the cursor reached the end of the buffer.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.data.len()
    }

    /// The byte order in which numbers are read.
    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The full underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return UnexpectedEndSnafu {
                position: self.position,
                requested: n,
                len: self.data.len(),
            }
            .fail();
        }
        let bytes = &self.data[self.position..self.position + n];
        self.position += n;
        Ok(bytes)
    }

    /// Read an unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        let position = self.position;
        let bytes = self.read_bytes(2)?;
        ByteOrdered::runtime(bytes, self.endianness)
            .read_u16()
            .context(DecodeNumberSnafu { position })
    }

    /// Read an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        let position = self.position;
        let bytes = self.read_bytes(4)?;
        ByteOrdered::runtime(bytes, self.endianness)
            .read_u32()
            .context(DecodeNumberSnafu { position })
    }

    /// Read a string of `n` single-byte characters.
    ///
    /// The cursor always advances by `n` bytes,
    /// but the string ends at the first NUL character.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        Ok(bytes
            .iter()
            .take_while(|b| **b != 0)
            .map(|b| char::from(*b))
            .collect())
    }

    /// Move the cursor by a relative offset, which may be negative.
    ///
    /// Moving before the start or past the end of the buffer fails
    /// and leaves the cursor where it was.
    pub fn seek(&mut self, offset: i64) -> Result<()> {
        let target = i64::try_from(self.position)
            .ok()
            .and_then(|p| p.checked_add(offset))
            .and_then(|t| usize::try_from(t).ok())
            .filter(|t| *t <= self.data.len());
        match target {
            Some(target) => {
                self.position = target;
                Ok(())
            }
            None => SeekOutOfBoundsSnafu {
                position: self.position,
                offset,
                len: self.data.len(),
            }
            .fail(),
        }
    }

    /// Move the cursor forward by `n` bytes.
    ///
    /// Fails without moving if fewer than `n` bytes remain.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Move the cursor to the end of the buffer.
    #[inline]
    pub fn skip_to_end(&mut self) {
        self.position = self.data.len();
    }

    /// Run a read operation without consuming any input.
    ///
    /// The cursor is restored to its current position
    /// once `f` returns, whether it succeeded or not.
    /// Warnings emitted by `f` are kept.
    pub fn peek<T, E>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        let position = self.position;
        let out = f(self);
        self.position = position;
        out
    }

    /// Record a warning about the content being decoded.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// All warnings recorded so far, in order of emission.
    #[inline]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Remove and return all warnings recorded so far.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}
