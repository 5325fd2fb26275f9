//! Explicit VR element decoding.

use super::{
    encapsulated, implicit, read_item_length, read_tag, sequence, skip_value, ReadHeaderTagSnafu,
    ReadLengthSnafu, ReadReservedSnafu, ReadVrSnafu, Result, Strategy,
};
use crate::options::EncodingMode;
use crate::stream::ByteStream;
use dicom_scan_core::{tags, Element, Length, Tag, VR};
use snafu::ResultExt;
use tracing::trace;

/// Decode one explicit VR element at the cursor.
pub(crate) fn read_element(
    stream: &mut ByteStream,
    strategy: Strategy,
    until_tag: Option<Tag>,
) -> Result<Element> {
    let position = stream.position();
    let tag = read_tag(stream).context(ReadHeaderTagSnafu { position })?;

    // item and delimitation headers have no VR
    if tag.group() == tags::ITEM_GROUP {
        let len = read_item_length(stream, position)?;
        let mut element = Element::new(tag, None, Length(len), stream.position());
        trace!("{} {} @ {}", tag, element.length, position);
        if until_tag != Some(tag) {
            skip_value(stream, &mut element)?;
        }
        return Ok(element);
    }

    let vr_position = stream.position();
    let code = stream
        .read_bytes(2)
        .context(ReadVrSnafu { position: vr_position })?;
    let vr = VR::from_binary([code[0], code[1]]);
    if vr.is_none() {
        stream.warn(format!(
            "unrecognized value representation {:02X}{:02X} for element {} at position {}",
            code[0], code[1], tag, position
        ));
    }

    let width = vr.map_or(2, |vr| vr.length_field_width(strategy.length_policy));
    let len_position = stream.position();
    let len = if width == 4 {
        stream
            .read_u16()
            .context(ReadReservedSnafu { position: len_position })?;
        stream
            .read_u32()
            .context(ReadLengthSnafu { position: len_position + 2 })?
    } else {
        u32::from(
            stream
                .read_u16()
                .context(ReadLengthSnafu { position: len_position })?,
        )
    };

    let mut element = Element::new(tag, vr, Length(len), stream.position());
    trace!(
        "{} {} {} @ {}",
        tag,
        vr.map_or("--", VR::to_str),
        element.length,
        position
    );

    if until_tag == Some(tag) {
        return Ok(element);
    }

    match vr {
        Some(VR::SQ) => {
            sequence::read_sequence(stream, &mut element, strategy)?;
        }
        Some(VR::UN) => {
            implicit::read_value(
                stream,
                &mut element,
                strategy.with_mode(EncodingMode::Implicit),
            )?;
        }
        _ if element.had_undefined_length && tag == tags::PIXEL_DATA => {
            encapsulated::read_fragments(stream, &mut element)?;
        }
        _ => skip_value(stream, &mut element)?,
    }
    Ok(element)
}
