//! This module contains all DICOM data element decoding logic.
//!
//! Both encoding modes are handled by a single recursive walk,
//! parameterized by [`EncodingMode`]:
//! sequences recurse back into element decoding for each item,
//! and explicit VR elements of VR UN are decoded as implicit VR elements.

use crate::options::{DecodeOptions, EncodingMode};
use crate::stream::{self, ByteStream};
use dicom_scan_core::{Element, Length, LengthPolicy, Tag, VrLookup, VR};
use snafu::{Backtrace, ResultExt, Snafu};

pub(crate) mod encapsulated;
pub(crate) mod explicit;
pub(crate) mod implicit;
pub(crate) mod sequence;
pub(crate) mod undefined;

/// Module-level error type:
/// for errors which may occur while decoding DICOM data.
///
/// Malformed content which can be recovered from
/// is reported as a warning on the stream instead.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Failed to read the element tag at position {}", position))]
    ReadHeaderTag {
        position: usize,
        source: stream::Error,
    },
    #[snafu(display("Failed to read the value representation at position {}", position))]
    ReadVr {
        position: usize,
        source: stream::Error,
    },
    #[snafu(display("Failed to read the header's reserved bytes at position {}", position))]
    ReadReserved {
        position: usize,
        source: stream::Error,
    },
    #[snafu(display("Failed to read the element length field at position {}", position))]
    ReadLength {
        position: usize,
        source: stream::Error,
    },
    #[snafu(display("Failed to read the item header at position {}", position))]
    ReadItemHeader {
        position: usize,
        source: stream::Error,
    },
    #[snafu(display("Failed to scan the value at position {}", position))]
    ReadValue {
        position: usize,
        source: stream::Error,
    },
    #[snafu(display(
        "Sequence at position {} exceeds the maximum nesting depth of {}",
        position,
        max_depth
    ))]
    MaxDepthExceeded {
        position: usize,
        max_depth: u32,
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Read a data element tag, advancing the cursor by 4 bytes.
pub fn read_tag(stream: &mut ByteStream) -> stream::Result<Tag> {
    let group = stream.read_u16()?;
    let element = stream.read_u16()?;
    Ok(Tag(group, element))
}

/// Read the data element tag at the cursor without consuming it.
pub fn peek_tag(stream: &mut ByteStream) -> stream::Result<Tag> {
    stream.peek(read_tag)
}

/// Decode a single data element at the cursor,
/// following the encoding mode and stop tag in `options`.
///
/// On success, the cursor is placed right after the element,
/// or at its value if the element's tag is the stop tag.
pub fn read_element(
    stream: &mut ByteStream,
    options: &DecodeOptions,
    vr_lookup: Option<&dyn VrLookup>,
) -> Result<Element> {
    Strategy::new(options, vr_lookup).read_element(stream, options.until_tag)
}

/// Decode a single explicit VR data element at the cursor.
pub fn read_element_explicit(
    stream: &mut ByteStream,
    until_tag: Option<Tag>,
    vr_lookup: Option<&dyn VrLookup>,
) -> Result<Element> {
    let options = DecodeOptions::new().explicit();
    Strategy::new(&options, vr_lookup).read_element(stream, until_tag)
}

/// Decode a single implicit VR data element at the cursor.
pub fn read_element_implicit(
    stream: &mut ByteStream,
    until_tag: Option<Tag>,
    vr_lookup: Option<&dyn VrLookup>,
) -> Result<Element> {
    let options = DecodeOptions::new().implicit();
    Strategy::new(&options, vr_lookup).read_element(stream, until_tag)
}

/// The decoding parameters passed down the recursion.
#[derive(Copy, Clone)]
pub(crate) struct Strategy<'d> {
    pub mode: EncodingMode,
    pub length_policy: LengthPolicy,
    pub max_depth: u32,
    /// current sequence nesting depth
    pub depth: u32,
    pub vr_lookup: Option<&'d dyn VrLookup>,
}

impl<'d> Strategy<'d> {
    pub fn new(options: &DecodeOptions, vr_lookup: Option<&'d dyn VrLookup>) -> Self {
        Strategy {
            mode: options.mode,
            length_policy: options.length_policy,
            max_depth: options.max_depth,
            depth: 0,
            vr_lookup,
        }
    }

    /// The same strategy with another encoding mode.
    pub fn with_mode(self, mode: EncodingMode) -> Self {
        Strategy { mode, ..self }
    }

    /// The strategy for the contents of a sequence starting at `position`.
    pub fn nested(self, position: usize) -> Result<Self> {
        if self.depth >= self.max_depth {
            return MaxDepthExceededSnafu {
                position,
                max_depth: self.max_depth,
            }
            .fail();
        }
        Ok(Strategy {
            depth: self.depth + 1,
            ..self
        })
    }

    pub fn lookup(&self, tag: Tag) -> Option<VR> {
        self.vr_lookup.and_then(|lookup| lookup.vr_of(tag))
    }

    pub fn read_element(self, stream: &mut ByteStream, until_tag: Option<Tag>) -> Result<Element> {
        match self.mode {
            EncodingMode::Explicit => explicit::read_element(stream, self, until_tag),
            EncodingMode::Implicit => implicit::read_element(stream, self, until_tag),
        }
    }
}

/// Skip over a primitive value,
/// recovering its length first if it was undefined.
pub(crate) fn skip_value(stream: &mut ByteStream, element: &mut Element) -> Result<()> {
    if element.had_undefined_length {
        element.length = undefined::find_item_delimiter(stream, element.data_offset)?;
        return Ok(());
    }
    skip_bytes(stream, element.length.0 as usize, element.tag);
    Ok(())
}

/// Advance the cursor by `len` bytes of value data.
/// A value running past the end of the stream is cut short with a warning.
pub(crate) fn skip_bytes(stream: &mut ByteStream, len: usize, tag: Tag) {
    let position = stream.position();
    if stream.skip(len).is_err() {
        let remaining = stream.remaining();
        stream.warn(format!(
            "value of {} at position {} has length {} but only {} bytes remain",
            tag, position, len, remaining
        ));
        stream.skip_to_end();
    }
}

/// The length of the byte range `from..to`.
pub(crate) fn span(from: usize, to: usize) -> Length {
    let len = to.saturating_sub(from);
    // never let a recovered length collide with the undefined length
    Length(u32::try_from(len).unwrap_or(u32::MAX - 1).min(u32::MAX - 1))
}

/// Read the 4-byte length field which follows an item or delimiter tag.
pub(crate) fn read_item_length(stream: &mut ByteStream, position: usize) -> Result<u32> {
    stream.read_u32().context(ReadItemHeaderSnafu { position })
}
