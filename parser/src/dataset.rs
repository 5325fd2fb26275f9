//! This module contains the data set loop,
//! which decodes consecutive elements into a [`DataSet`].
//!
//! The same bounded loop decodes the contents of sequence items
//! of defined length.

use crate::decode::{Result, Strategy};
use crate::options::DecodeOptions;
use crate::stream::ByteStream;
use dicom_scan_core::{Element, Header, Tag, VrLookup};
use tracing::debug;

/// An ordered list of decoded data elements,
/// along with the warnings raised while decoding them.
///
/// Elements are kept in encoding order,
/// including any repeated tags.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DataSet {
    elements: Vec<Element>,
    warnings: Vec<String>,
}

impl DataSet {
    /// Create a data set from its parts.
    pub fn new(elements: Vec<Element>, warnings: Vec<String>) -> Self {
        DataSet { elements, warnings }
    }

    /// Retrieve the first element with the given tag.
    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.elements.iter().find(|e| e.tag == tag)
    }

    /// Iterate over all elements with the given tag.
    pub fn get_all(&self, tag: Tag) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.tag == tag)
    }

    /// Iterate over the top-level elements in encoding order.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    #[inline]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The warnings raised while decoding, in order of emission.
    #[inline]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Break the data set apart into its elements and warnings.
    pub fn into_parts(self) -> (Vec<Element>, Vec<String>) {
        (self.elements, self.warnings)
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl IntoIterator for DataSet {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

/// Decode all elements from the cursor to the end of the stream,
/// or up to the element with the stop tag in `options`.
///
/// The stop element is kept as the last element of the data set,
/// and the cursor is left at its data offset.
pub fn read_dataset(
    stream: &mut ByteStream,
    options: &DecodeOptions,
    vr_lookup: Option<&dyn VrLookup>,
) -> Result<DataSet> {
    let end = stream.len();
    read_dataset_until(stream, end, options, vr_lookup)
}

/// Decode all elements from the cursor up to the absolute position `end`,
/// or up to the element with the stop tag in `options`.
pub fn read_dataset_until(
    stream: &mut ByteStream,
    end: usize,
    options: &DecodeOptions,
    vr_lookup: Option<&dyn VrLookup>,
) -> Result<DataSet> {
    debug!(
        "Reading {:?} data set from {} to {}",
        options.mode,
        stream.position(),
        end
    );
    let strategy = Strategy::new(options, vr_lookup);
    let elements = read_elements(stream, end, strategy, options.until_tag)?;
    Ok(DataSet::new(elements, stream.warnings().to_vec()))
}

/// Decode consecutive elements until the cursor reaches `end`.
pub(crate) fn read_elements(
    stream: &mut ByteStream,
    end: usize,
    strategy: Strategy,
    until_tag: Option<Tag>,
) -> Result<Vec<Element>> {
    let end = if end > stream.len() {
        stream.warn(format!(
            "data set ending at position {} runs past the end of the stream ({} bytes)",
            end,
            stream.len()
        ));
        stream.len()
    } else {
        end
    };

    let mut elements = Vec::new();
    while stream.position() < end {
        let position = stream.position();
        let element = strategy.read_element(stream, until_tag)?;

        if until_tag == Some(element.tag) {
            elements.push(element);
            break;
        }

        if element.is_item_delimiter() || element.is_sequence_delimiter() {
            stream.warn(format!(
                "skipping stray delimiter {} at position {}",
                element.tag, position
            ));
            continue;
        }
        elements.push(element);
    }

    if stream.position() > end {
        let overrun = stream.position() - end;
        stream.warn(format!(
            "data set elements overran the end at position {} by {} bytes",
            end, overrun
        ));
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_scan_core::{Length, VR};

    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x08, 0x00, 0x16, 0x00, // (0008,0016)
        b'U', b'I', // VR: UI
        0x04, 0x00, // length: 4
        b'1', b'.', b'2', 0x00,
        // -- 12 --
        0xFE, 0xFF, 0x0D, 0xE0, // (FFFE,E00D), out of place
        0x00, 0x00, 0x00, 0x00,
        // -- 20 --
        0x10, 0x00, 0x10, 0x00, // (0010,0010)
        b'P', b'N', // VR: PN
        0x04, 0x00, // length: 4
        b'D', b'o', b'e', b' ',
        // -- 32 --
        0x10, 0x00, 0x10, 0x00, // (0010,0010) repeated
        b'P', b'N', // VR: PN
        0x02, 0x00, // length: 2
        b'X', b' ',
        // -- 42 --
        0xE0, 0x7F, 0x10, 0x00, // (7FE0,0010)
        b'O', b'W', // VR: OW
        0x00, 0x00, // reserved
        0x04, 0x00, 0x00, 0x00, // length: 4
        0x01, 0x00, 0x02, 0x00,
    ];

    #[test]
    fn read_whole_data_set() {
        let mut stream = ByteStream::new(RAW);
        let dataset = read_dataset(&mut stream, &DecodeOptions::default(), None).unwrap();
        assert!(stream.is_at_end());

        let tags: Vec<_> = dataset.iter().map(|e| e.tag).collect();
        assert_eq!(
            tags,
            vec![
                Tag(0x0008, 0x0016),
                Tag(0x0010, 0x0010),
                Tag(0x0010, 0x0010),
                Tag(0x7FE0, 0x0010),
            ]
        );
        assert_eq!(dataset.get(Tag(0x0010, 0x0010)).map(|e| e.length), Some(Length(4)));
        assert_eq!(dataset.get_all(Tag(0x0010, 0x0010)).count(), 2);
        assert_eq!(dataset.get(Tag(0x7FE0, 0x0010)).and_then(|e| e.vr), Some(VR::OW));
        assert!(dataset.get(Tag(0x0020, 0x000D)).is_none());

        // the stray delimiter
        assert_eq!(dataset.warnings().len(), 1);
    }

    #[test]
    fn stop_before_pixel_data() {
        let mut stream = ByteStream::new(RAW);
        let options = DecodeOptions::new().until_tag(Tag(0x7FE0, 0x0010));
        let dataset = read_dataset(&mut stream, &options, None).unwrap();
        assert_eq!(dataset.len(), 4);
        let last = dataset.elements().last().unwrap();
        assert_eq!(last.tag, Tag(0x7FE0, 0x0010));
        assert_eq!(stream.position(), last.data_offset);
        assert_eq!(stream.position(), 54);
    }

    #[test]
    fn bounded_data_set() {
        let mut stream = ByteStream::new(RAW);
        let dataset =
            read_dataset_until(&mut stream, 12, &DecodeOptions::default(), None).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(stream.position(), 12);
        assert!(dataset.warnings().is_empty());

        // an end past the stream is clamped
        let mut stream = ByteStream::new(RAW);
        stream.seek(20).unwrap();
        let dataset =
            read_dataset_until(&mut stream, 1000, &DecodeOptions::default(), None).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.warnings().len(), 1);
    }

    #[test]
    fn overrun_is_reported() {
        let mut stream = ByteStream::new(RAW);
        let dataset =
            read_dataset_until(&mut stream, 10, &DecodeOptions::default(), None).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(stream.position(), 12);
        assert_eq!(dataset.warnings().len(), 1);
    }

    #[test]
    fn empty_stream() {
        let mut stream = ByteStream::new(&[]);
        let dataset = read_dataset(&mut stream, &DecodeOptions::default(), None).unwrap();
        assert!(dataset.is_empty());
        assert!(dataset.warnings().is_empty());
    }
}
