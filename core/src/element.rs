//! Decoded data element and item records.
//!
//! An [`Element`] describes where an encoded data element lives in the
//! source buffer: its tag, optional value representation, value length,
//! and the offset of its value. Values themselves are not interpreted.
//! Sequences and encapsulated pixel data additionally own their list of
//! [`Item`]s.

use crate::header::{Length, Tag, VR};
use crate::tags;

/// A trait for a data type containing a DICOM header.
pub trait Header {
    /// Retrieve the element's tag.
    fn tag(&self) -> Tag;

    /// Retrieve the value length, which may be undefined
    /// if it could not be recovered.
    fn length(&self) -> Length;

    /// Check whether this is the header of an item.
    fn is_item(&self) -> bool {
        self.tag() == tags::ITEM
    }

    /// Check whether this is the header of an item delimiter.
    fn is_item_delimiter(&self) -> bool {
        self.tag() == tags::ITEM_DELIMITATION_ITEM
    }

    /// Check whether this is the header of a sequence delimiter.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag() == tags::SEQUENCE_DELIMITATION_ITEM
    }
}

/// A decoded data element.
///
/// Once returned by a decoder, the cursor sits right after the element's
/// encoded extent (or at `data_offset` when decoding stopped at the header).
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// DICOM tag
    pub tag: Tag,
    /// Value representation, present in explicit VR encoding
    /// or when provided by a VR look-up
    pub vr: Option<VR>,
    /// Value length in bytes.
    /// Undefined lengths are replaced by the recovered length
    /// before the element is returned.
    pub length: Length,
    /// Absolute position of the first byte of the value
    pub data_offset: usize,
    /// Whether the raw length field held the undefined length value
    pub had_undefined_length: bool,
    /// Items of a sequence or fragments of encapsulated pixel data
    pub items: Option<Vec<Item>>,
}

impl Element {
    /// Create an element record from its header fields.
    /// `had_undefined_length` is derived from the given length.
    pub fn new(tag: Tag, vr: Option<VR>, length: Length, data_offset: usize) -> Self {
        Element {
            tag,
            vr,
            length,
            data_offset,
            had_undefined_length: length.is_undefined(),
            items: None,
        }
    }

    /// Whether the element was decoded as a sequence or item list.
    #[inline]
    pub fn is_sequence(&self) -> bool {
        self.items.is_some()
    }

    /// Whether this is pixel data encoded as a list of fragments.
    pub fn is_encapsulated_pixel_data(&self) -> bool {
        self.tag == tags::PIXEL_DATA && self.had_undefined_length && self.items.is_some()
    }

    /// The items of this element, empty if it is not a sequence.
    pub fn items(&self) -> &[Item] {
        self.items.as_deref().unwrap_or_default()
    }

    /// The absolute position right after the element's value,
    /// if its length is known.
    pub fn end_offset(&self) -> Option<usize> {
        self.length
            .get()
            .map(|len| self.data_offset + len as usize)
    }

    /// Fetch the raw value bytes from the buffer the element was decoded from.
    ///
    /// Returns `None` if the length is unknown
    /// or the value lies outside of `source`.
    pub fn value<'a>(&self, source: &'a [u8]) -> Option<&'a [u8]> {
        source.get(self.data_offset..self.end_offset()?)
    }

    /// Decode the basic offset table of encapsulated pixel data,
    /// the first item of the fragment list,
    /// as a list of little endian 32-bit offsets.
    pub fn basic_offset_table(&self) -> Option<Vec<u32>> {
        if !self.is_encapsulated_pixel_data() {
            return None;
        }
        let table = self.items().first()?.fragment()?;
        Some(
            table
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    /// Iterate over the compressed fragments of encapsulated pixel data,
    /// excluding the basic offset table.
    pub fn fragments(&self) -> impl Iterator<Item = &[u8]> {
        let skip = usize::from(self.is_encapsulated_pixel_data());
        self.items()
            .iter()
            .skip(skip)
            .filter_map(Item::fragment)
    }
}

impl Header for Element {
    #[inline]
    fn tag(&self) -> Tag {
        self.tag
    }

    #[inline]
    fn length(&self) -> Length {
        self.length
    }
}

/// The content of an item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemContent {
    /// A nested data set, in encoding order
    DataSet(Vec<Element>),
    /// An opaque pixel data fragment
    Fragment(Vec<u8>),
}

/// One entry of a sequence or of an encapsulated pixel data fragment list.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// the item tag as found in the stream, normally (FFFE,E000)
    pub tag: Tag,
    /// the item's value length,
    /// recovered when it was encoded as undefined
    pub length: Length,
    /// absolute position of the first byte of the item's value
    pub data_offset: usize,
    /// whether the raw length field held the undefined length value
    pub had_undefined_length: bool,
    /// nested data set or fragment bytes
    pub content: ItemContent,
}

impl Item {
    /// The nested elements of a data set item.
    pub fn elements(&self) -> &[Element] {
        match &self.content {
            ItemContent::DataSet(elements) => elements,
            ItemContent::Fragment(_) => &[],
        }
    }

    /// The bytes of a pixel data fragment item.
    pub fn fragment(&self) -> Option<&[u8]> {
        match &self.content {
            ItemContent::Fragment(data) => Some(data),
            ItemContent::DataSet(_) => None,
        }
    }
}

impl Header for Item {
    #[inline]
    fn tag(&self) -> Tag {
        self.tag
    }

    #[inline]
    fn length(&self) -> Length {
        self.length
    }
}
