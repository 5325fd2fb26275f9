//! Sequence item decoding, shared by both encoding modes.
//!
//! Item contents are decoded with the strategy of the enclosing sequence,
//! so the encoding mode never changes from one item to the next.

use super::{
    peek_tag, read_item_length, read_tag, skip_bytes, span, ReadItemHeaderSnafu, Result, Strategy,
};
use crate::dataset::read_elements;
use crate::stream::ByteStream;
use dicom_scan_core::{tags, Element, Item, ItemContent, Length, Tag};
use snafu::ResultExt;
use tracing::debug;

/// Size of an item header or delimitation item: tag plus 4-byte length.
const HEADER_SIZE: usize = 8;

/// Decode the items of the sequence `element`,
/// the cursor being at its data offset.
///
/// A sequence of undefined length receives the length
/// up to and including its sequence delimitation item.
pub(crate) fn read_sequence(
    stream: &mut ByteStream,
    element: &mut Element,
    strategy: Strategy,
) -> Result<()> {
    let strategy = strategy.nested(element.data_offset)?;
    debug!(
        "Reading sequence {} at {} (depth {})",
        element.tag, element.data_offset, strategy.depth
    );

    let items = if element.had_undefined_length {
        let (items, length) = read_items_undefined(stream, element.data_offset, strategy)?;
        element.length = length;
        items
    } else {
        let end = element.data_offset + element.length.0 as usize;
        read_items_until(stream, end, element.tag, strategy)?
    };

    debug!("Sequence {} has {} items", element.tag, items.len());
    element.items = Some(items);
    Ok(())
}

/// Read items until the sequence delimitation item.
fn read_items_undefined(
    stream: &mut ByteStream,
    data_offset: usize,
    strategy: Strategy,
) -> Result<(Vec<Item>, Length)> {
    let mut items = Vec::new();
    loop {
        if stream.remaining() < HEADER_SIZE {
            stream.warn(format!(
                "end of stream reached before finding the sequence delimitation item \
                 of the sequence at position {}",
                data_offset
            ));
            stream.skip_to_end();
            return Ok((items, span(data_offset, stream.len())));
        }

        let position = stream.position();
        let tag = peek_tag(stream).context(ReadItemHeaderSnafu { position })?;
        if tag == tags::SEQUENCE_DELIMITATION_ITEM {
            read_delimiter(stream)?;
            return Ok((items, span(data_offset, stream.position())));
        }
        items.push(read_item(stream, strategy)?);
    }
}

/// Read items until the cursor reaches `end`.
fn read_items_until(
    stream: &mut ByteStream,
    end: usize,
    tag: Tag,
    strategy: Strategy,
) -> Result<Vec<Item>> {
    let end = if end > stream.len() {
        stream.warn(format!(
            "sequence {} ending at position {} runs past the end of the stream ({} bytes)",
            tag,
            end,
            stream.len()
        ));
        stream.len()
    } else {
        end
    };

    let mut items = Vec::new();
    while stream.position() < end {
        let position = stream.position();
        if end - position < HEADER_SIZE {
            stream.warn(format!(
                "ignoring {} trailing bytes at position {} in sequence {}",
                end - position,
                position,
                tag
            ));
            skip_bytes(stream, end - position, tag);
            break;
        }
        items.push(read_item(stream, strategy)?);
    }

    if stream.position() > end {
        let overrun = stream.position() - end;
        stream.warn(format!(
            "items of sequence {} overran its end at position {} by {} bytes",
            tag, end, overrun
        ));
    }
    Ok(items)
}

/// Read one item along with its nested data set.
fn read_item(stream: &mut ByteStream, strategy: Strategy) -> Result<Item> {
    let position = stream.position();
    let tag = read_tag(stream).context(ReadItemHeaderSnafu { position })?;
    let length = Length(read_item_length(stream, position)?);
    if tag != tags::ITEM {
        stream.warn(format!(
            "item tag (FFFE,E000) not found at position {}, found {} instead",
            position, tag
        ));
    }

    let data_offset = stream.position();
    let mut item = Item {
        tag,
        length,
        data_offset,
        had_undefined_length: length.is_undefined(),
        content: ItemContent::DataSet(Vec::new()),
    };

    let elements = if item.had_undefined_length {
        let (elements, length) = read_item_elements_undefined(stream, data_offset, strategy)?;
        item.length = length;
        elements
    } else {
        read_elements(stream, data_offset + length.0 as usize, strategy, None)?
    };
    item.content = ItemContent::DataSet(elements);
    Ok(item)
}

/// Read the elements of an item of undefined length,
/// up to its item delimitation item.
fn read_item_elements_undefined(
    stream: &mut ByteStream,
    data_offset: usize,
    strategy: Strategy,
) -> Result<(Vec<Element>, Length)> {
    let mut elements = Vec::new();
    loop {
        if stream.remaining() < HEADER_SIZE {
            stream.warn(format!(
                "end of stream reached before finding the item delimitation item \
                 of the item at position {}",
                data_offset
            ));
            stream.skip_to_end();
            return Ok((elements, span(data_offset, stream.len())));
        }

        let position = stream.position();
        let tag = peek_tag(stream).context(ReadItemHeaderSnafu { position })?;
        if tag == tags::ITEM_DELIMITATION_ITEM {
            read_delimiter(stream)?;
            return Ok((elements, span(data_offset, position)));
        }
        if tag == tags::SEQUENCE_DELIMITATION_ITEM {
            // leave it for the enclosing sequence
            stream.warn(format!(
                "sequence delimitation item at position {} ends the item at position {}",
                position, data_offset
            ));
            return Ok((elements, span(data_offset, position)));
        }
        elements.push(strategy.read_element(stream, None)?);
    }
}

/// Consume a delimitation item, warning about a non-zero length.
fn read_delimiter(stream: &mut ByteStream) -> Result<()> {
    let position = stream.position();
    let tag = read_tag(stream).context(ReadItemHeaderSnafu { position })?;
    let length = read_item_length(stream, position)?;
    if length != 0 {
        stream.warn(format!(
            "delimitation item {} at position {} has non-zero length {}",
            tag, position, length
        ));
    }
    Ok(())
}
