//! Encapsulated pixel data: a list of fragment items
//! ended by a sequence delimitation item.
//!
//! The first fragment is the basic offset table,
//! the others hold compressed frame data.
//! Fragment bytes are copied but never interpreted.

use super::{read_item_length, read_tag, skip_bytes, span, undefined, ReadItemHeaderSnafu, Result};
use crate::stream::ByteStream;
use dicom_scan_core::{tags, Element, Item, ItemContent, Length};
use snafu::ResultExt;
use tracing::debug;

/// Size of an item header: tag plus 4-byte length.
const HEADER_SIZE: usize = 8;

/// Walk the fragments of encapsulated pixel data,
/// the cursor being at the element's data offset.
///
/// The element receives the fragment items and the length of its value,
/// up to and including the sequence delimitation item.
pub(crate) fn read_fragments(stream: &mut ByteStream, element: &mut Element) -> Result<()> {
    debug!("Reading pixel data fragments at {}", element.data_offset);
    let mut items = Vec::new();

    loop {
        let position = stream.position();
        if stream.remaining() < HEADER_SIZE {
            stream.warn(format!(
                "end of stream reached before finding the sequence delimitation item \
                 of the pixel data at position {}",
                element.data_offset
            ));
            stream.skip_to_end();
            break;
        }

        let tag = read_tag(stream).context(ReadItemHeaderSnafu { position })?;
        let length = Length(read_item_length(stream, position)?);

        if tag == tags::SEQUENCE_DELIMITATION_ITEM {
            if length != Length(0) {
                stream.warn(format!(
                    "sequence delimitation item at position {} has non-zero length {}",
                    position, length
                ));
            }
            break;
        }

        if tag != tags::ITEM {
            stream.warn(format!(
                "unexpected tag {} at position {} while reading pixel data fragments",
                tag, position
            ));
            stream.skip_to_end();
            break;
        }

        items.push(read_fragment(stream, length)?);
    }

    element.length = span(element.data_offset, stream.position());
    debug!(
        "Pixel data has {} fragment items over {} bytes",
        items.len(),
        element.length
    );
    element.items = Some(items);
    Ok(())
}

/// Read the value of a fragment item whose header was just read.
fn read_fragment(stream: &mut ByteStream, length: Length) -> Result<Item> {
    let data_offset = stream.position();
    let had_undefined_length = length.is_undefined();

    let length = match length.get() {
        None => {
            stream.warn(format!(
                "pixel data fragment at position {} has undefined length",
                data_offset
            ));
            undefined::find_item_delimiter(stream, data_offset)?
        }
        Some(len) => {
            skip_bytes(stream, len as usize, tags::ITEM);
            Length(len)
        }
    };

    let end = (data_offset + length.0 as usize).min(stream.len());
    let data = stream.data().get(data_offset..end).unwrap_or_default();
    Ok(Item {
        tag: tags::ITEM,
        length,
        data_offset,
        had_undefined_length,
        content: ItemContent::Fragment(data.to_vec()),
    })
}
