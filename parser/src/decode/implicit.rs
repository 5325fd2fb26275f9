//! Implicit VR element decoding,
//! including the heuristic telling sequences apart from other values.

use super::{peek_tag, read_tag, sequence, skip_value, ReadHeaderTagSnafu, ReadLengthSnafu, Result, Strategy};
use crate::stream::ByteStream;
use dicom_scan_core::{tags, Element, Length, Tag, VR};
use snafu::ResultExt;
use tracing::trace;

/// Decode one implicit VR element at the cursor.
pub(crate) fn read_element(
    stream: &mut ByteStream,
    strategy: Strategy,
    until_tag: Option<Tag>,
) -> Result<Element> {
    let position = stream.position();
    let tag = read_tag(stream).context(ReadHeaderTagSnafu { position })?;
    let len = stream
        .read_u32()
        .context(ReadLengthSnafu { position: position + 4 })?;

    let mut element = Element::new(tag, strategy.lookup(tag), Length(len), stream.position());
    trace!("{} {} @ {}", tag, element.length, position);

    if until_tag == Some(tag) {
        return Ok(element);
    }
    read_value(stream, &mut element, strategy)?;
    Ok(element)
}

/// Decode the value of an element with no reliable VR,
/// the cursor being at the element's data offset.
///
/// The element becomes a sequence if it is classified as one,
/// otherwise its value is skipped.
pub(crate) fn read_value(
    stream: &mut ByteStream,
    element: &mut Element,
    strategy: Strategy,
) -> Result<()> {
    // items and delimiters are never sequences
    if element.tag.group() == tags::ITEM_GROUP {
        return skip_value(stream, element);
    }

    if is_sequence(stream, element, &strategy) {
        if element.vr.is_none() {
            element.vr = Some(VR::SQ);
        }
        sequence::read_sequence(stream, element, strategy)
    } else {
        skip_value(stream, element)
    }
}

/// Decide whether an element with no reliable VR holds a sequence.
fn is_sequence(stream: &mut ByteStream, element: &Element, strategy: &Strategy) -> bool {
    if let Some(vr) = strategy.lookup(element.tag) {
        return vr == VR::SQ;
    }

    // private attributes are of unknown structure without a dictionary
    if element.tag.is_private() {
        return false;
    }

    if element.had_undefined_length {
        return true;
    }

    // only an item or an empty sequence's delimiter
    // may follow the header of a sequence
    match peek_tag(stream) {
        Ok(next) => next == tags::ITEM || next == tags::SEQUENCE_DELIMITATION_ITEM,
        Err(_) => {
            stream.warn(format!(
                "end of stream reached before finding a sequence item tag or sequence delimiter tag \
                 while peeking to determine the VR of {} at position {}",
                element.tag, element.data_offset
            ));
            false
        }
    }
}
