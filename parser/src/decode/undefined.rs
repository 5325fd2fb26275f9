//! Length recovery for primitive values of undefined length.

use super::{span, ReadValueSnafu, Result};
use crate::stream::ByteStream;
use dicom_scan_core::{tags, Length};
use snafu::ResultExt;
use tracing::trace;

/// Size of an item delimitation item: tag plus 4-byte length.
const DELIMITER_SIZE: usize = 8;

/// Scan forward from the cursor for the item delimitation item
/// which ends the value starting at `data_offset`.
///
/// Returns the value length (up to the delimiter, exclusive)
/// and leaves the cursor right after the delimiter.
/// When no delimiter is found,
/// the rest of the stream is taken as the value.
pub(crate) fn find_item_delimiter(stream: &mut ByteStream, data_offset: usize) -> Result<Length> {
    while stream.position() + DELIMITER_SIZE <= stream.len() {
        let position = stream.position();
        let group = stream
            .read_u16()
            .context(ReadValueSnafu { position })?;
        if group != tags::ITEM_GROUP {
            continue;
        }
        let element = stream
            .read_u16()
            .context(ReadValueSnafu { position })?;
        if element != tags::ITEM_DELIMITATION_ITEM.element() {
            // the element number may itself start a delimiter
            stream.seek(-2).context(ReadValueSnafu { position })?;
            continue;
        }

        let delimiter_length = stream
            .read_u32()
            .context(ReadValueSnafu { position })?;
        if delimiter_length != 0 {
            stream.warn(format!(
                "item delimitation item at position {} has non-zero length {}",
                position, delimiter_length
            ));
        }
        trace!("Found item delimiter at {} for value at {}", position, data_offset);
        return Ok(span(data_offset, position));
    }

    stream.warn(format!(
        "end of stream reached before finding the item delimitation item of the value at position {}",
        data_offset
    ));
    stream.skip_to_end();
    Ok(span(data_offset, stream.len()))
}
