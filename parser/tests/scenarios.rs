//! Decoding scenarios over hand-crafted data sets,
//! through the public API only.
use byteordered::Endianness;
use dicom_scan_core::{tags, Length, LengthPolicy, Tag, VrLookup, VR};
use dicom_scan_parser::decode::Error;
use dicom_scan_parser::{
    read_dataset, read_element, read_element_explicit, read_element_implicit, ByteStream,
    DecodeOptions,
};

/// An undefined length item holding (0020,0013) IS "1 ",
/// then the sequence delimiter.
#[rustfmt::skip]
const ITEMS_UNDEFINED: &[u8] = &[
    0xFE, 0xFF, 0x00, 0xE0, // (FFFE,E000)
    0xFF, 0xFF, 0xFF, 0xFF, // item length: undefined
    0x20, 0x00, 0x13, 0x00, // (0020,0013)
    0x02, 0x00, 0x00, 0x00, // length: 2
    b'1', b' ',
    0xFE, 0xFF, 0x0D, 0xE0, // (FFFE,E00D)
    0x00, 0x00, 0x00, 0x00,
    0xFE, 0xFF, 0xDD, 0xE0, // (FFFE,E0DD)
    0x00, 0x00, 0x00, 0x00,
];

fn concat(header: &[u8], body: &[u8]) -> Vec<u8> {
    let mut out = header.to_vec();
    out.extend_from_slice(body);
    out
}

#[test]
fn explicit_primitive_element() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0x08, 0x00, 0x16, 0x00, // (0008,0016) SOPClassUID
        b'U', b'I', // VR: UI
        0x0A, 0x00, // length: 10
        b'1', b'.', b'2', b'.', b'8', b'4', b'0', b'.', b'1', 0x00,
    ];
    let mut stream = ByteStream::new(raw);
    let elem = read_element_explicit(&mut stream, None, None).unwrap();
    assert_eq!(elem.tag, Tag(0x0008, 0x0016));
    assert_eq!(elem.vr, Some(VR::UI));
    assert_eq!(elem.length, Length(10));
    assert_eq!(elem.data_offset, 8);
    assert!(elem.items.is_none());
    assert_eq!(stream.position(), 18);
    assert!(stream.warnings().is_empty());
}

#[test]
fn explicit_empty_sequence() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0x08, 0x00, 0x15, 0x11, // (0008,1115)
        b'S', b'Q', // VR: SQ
        0x00, 0x00, // reserved
        0x00, 0x00, 0x00, 0x00, // length: 0
    ];
    let mut stream = ByteStream::new(raw);
    let elem = read_element_explicit(&mut stream, None, None).unwrap();
    assert!(elem.is_sequence());
    assert!(elem.items().is_empty());
    assert_eq!(elem.length, Length(0));
    assert_eq!(stream.position(), 12);
}

#[test]
fn explicit_encapsulated_pixel_data() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0xE0, 0x7F, 0x10, 0x00, // (7FE0,0010) PixelData
        b'O', b'B', // VR: OB
        0x00, 0x00, // reserved
        0xFF, 0xFF, 0xFF, 0xFF, // length: undefined
        // -- 12 --
        0xFE, 0xFF, 0x00, 0xE0, // (FFFE,E000) basic offset table
        0x00, 0x00, 0x00, 0x00, // length: 0
        // -- 20 --
        0xFE, 0xFF, 0x00, 0xE0, // (FFFE,E000) fragment
        0x04, 0x00, 0x00, 0x00, // length: 4
        0x01, 0x02, 0x03, 0x04,
        // -- 32 --
        0xFE, 0xFF, 0xDD, 0xE0, // (FFFE,E0DD)
        0x00, 0x00, 0x00, 0x00,
    ];
    let mut stream = ByteStream::new(raw);
    let elem = read_element_explicit(&mut stream, None, None).unwrap();
    assert!(elem.had_undefined_length);
    assert!(elem.is_encapsulated_pixel_data());
    assert_eq!(elem.items().len(), 2);
    // spans up to and including the delimiter
    assert_eq!(elem.length, Length(28));
    assert_eq!(stream.position(), 40);

    assert_eq!(elem.basic_offset_table(), Some(vec![]));
    let fragments: Vec<_> = elem.fragments().collect();
    assert_eq!(fragments, vec![&[1u8, 2, 3, 4][..]]);
    assert!(stream.warnings().is_empty());
}

#[test]
fn implicit_private_undefined_value_is_scanned() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0x09, 0x00, 0x10, 0x00, // (0009,0010), private
        0xFF, 0xFF, 0xFF, 0xFF, // length: undefined
        b'A', b'B', b'C', b'D',
        // -- 12 --
        0xFE, 0xFF, 0x0D, 0xE0, // (FFFE,E00D)
        0x00, 0x00, 0x00, 0x00,
    ];
    let mut stream = ByteStream::new(raw);
    let elem = read_element_implicit(&mut stream, None, None).unwrap();
    assert!(!elem.is_sequence());
    assert_eq!(elem.vr, None);
    assert!(elem.had_undefined_length);
    assert_eq!(elem.length, Length(4));
    assert_eq!(elem.value(raw), Some(&b"ABCD"[..]));
    // right after the delimiter
    assert_eq!(stream.position(), 12 + 8);
    assert!(stream.warnings().is_empty());
}

#[test]
fn implicit_element_followed_by_item_is_a_sequence() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0x08, 0x00, 0x15, 0x11, // (0008,1115)
        0x14, 0x00, 0x00, 0x00, // length: 20
        0xFE, 0xFF, 0x00, 0xE0, // (FFFE,E000)
        0x0C, 0x00, 0x00, 0x00, // item length: 12
        0x08, 0x00, 0x50, 0x11, // (0008,1150)
        0x04, 0x00, 0x00, 0x00, // length: 4
        b'1', b'.', b'2', 0x00,
        // -- 28 --
        0x10, 0x00, 0x10, 0x00, // (0010,0010)
        0x02, 0x00, 0x00, 0x00, // length: 2
        b'X', b' ',
    ];
    let mut stream = ByteStream::new(raw);
    let elem = read_element_implicit(&mut stream, None, None).unwrap();
    assert_eq!(elem.vr, Some(VR::SQ));
    assert_eq!(elem.length, Length(20));
    assert_eq!(elem.items().len(), 1);
    let item = &elem.items()[0];
    assert_eq!(item.length, Length(12));
    assert_eq!(item.data_offset, 16);
    assert_eq!(item.elements().len(), 1);
    assert_eq!(item.elements()[0].tag, Tag(0x0008, 0x1150));
    assert_eq!(stream.position(), 28);
    assert!(stream.warnings().is_empty());
}

#[test]
fn stop_tag_leaves_cursor_at_value() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0xE0, 0x7F, 0x10, 0x00, // (7FE0,0010) PixelData
        b'O', b'W', // VR: OW
        0x00, 0x00, // reserved
        0x04, 0x00, 0x00, 0x00, // length: 4
        0x01, 0x00, 0x02, 0x00,
    ];
    let mut stream = ByteStream::new(raw);
    let elem = read_element_explicit(&mut stream, Some(tags::PIXEL_DATA), None).unwrap();
    assert_eq!(elem.length, Length(4));
    assert_eq!(stream.position(), elem.data_offset);
    assert_eq!(stream.position(), 12);

    // without the stop tag, the value is skipped
    let mut stream = ByteStream::new(raw);
    let elem = read_element_explicit(&mut stream, None, None).unwrap();
    assert_eq!(Some(stream.position()), elem.end_offset());
}

#[test]
fn explicit_un_decodes_like_implicit() {
    #[rustfmt::skip]
    let explicit_header: &[u8] = &[
        0x08, 0x00, 0x15, 0x11, // (0008,1115)
        b'U', b'N', // VR: UN
        0x00, 0x00, // reserved
        0xFF, 0xFF, 0xFF, 0xFF, // length: undefined
    ];
    #[rustfmt::skip]
    let implicit_header: &[u8] = &[
        0x08, 0x00, 0x15, 0x11, // (0008,1115)
        0xFF, 0xFF, 0xFF, 0xFF, // length: undefined
    ];
    let explicit_raw = concat(explicit_header, ITEMS_UNDEFINED);
    let implicit_raw = concat(implicit_header, ITEMS_UNDEFINED);

    let mut stream = ByteStream::new(&explicit_raw);
    let un = read_element_explicit(&mut stream, None, None).unwrap();
    assert!(stream.is_at_end());
    let mut stream = ByteStream::new(&implicit_raw);
    let sq = read_element_implicit(&mut stream, None, None).unwrap();
    assert!(stream.is_at_end());

    assert_eq!(un.vr, Some(VR::UN));
    assert_eq!(sq.vr, Some(VR::SQ));
    assert_eq!(un.length, sq.length);
    assert_eq!(un.length, Length(34));
    assert_eq!(un.items().len(), sq.items().len());
    for (a, b) in un.items().iter().zip(sq.items()) {
        assert_eq!(a.length, b.length);
        assert_eq!(a.data_offset - un.data_offset, b.data_offset - sq.data_offset);
        let tags_a: Vec<_> = a.elements().iter().map(|e| e.tag).collect();
        let tags_b: Vec<_> = b.elements().iter().map(|e| e.tag).collect();
        assert_eq!(tags_a, tags_b);
    }
}

#[test]
fn look_up_turns_private_element_into_sequence() {
    #[rustfmt::skip]
    let header: &[u8] = &[
        0x09, 0x00, 0x10, 0x10, // (0009,1010), private
        0xFF, 0xFF, 0xFF, 0xFF, // length: undefined
    ];
    let raw = concat(header, ITEMS_UNDEFINED);
    let lookup = |tag: Tag| (tag == Tag(0x0009, 0x1010)).then_some(VR::SQ);

    let mut stream = ByteStream::new(&raw);
    let options = DecodeOptions::new().implicit();
    let elem = read_element(&mut stream, &options, Some(&lookup as &dyn VrLookup)).unwrap();
    assert_eq!(elem.vr, Some(VR::SQ));
    assert_eq!(elem.items().len(), 1);
    assert_eq!(elem.items()[0].length, Length(10));
    assert!(elem.items()[0].had_undefined_length);
    assert!(stream.is_at_end());
    assert!(stream.warnings().is_empty());
}

#[test]
fn big_endian_explicit_data_set() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0x00, 0x08, 0x00, 0x16, // (0008,0016)
        b'U', b'I', // VR: UI
        0x00, 0x04, // length: 4
        b'1', b'.', b'2', 0x00,
        0x7F, 0xE0, 0x00, 0x10, // (7FE0,0010)
        b'O', b'W', // VR: OW
        0x00, 0x00, // reserved
        0x00, 0x00, 0x00, 0x02, // length: 2
        0x12, 0x34,
    ];
    let mut stream = ByteStream::with_endianness(raw, Endianness::Big);
    let dataset = read_dataset(&mut stream, &DecodeOptions::new(), None).unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.elements()[0].length, Length(4));
    assert_eq!(dataset.elements()[1].tag, tags::PIXEL_DATA);
    assert_eq!(dataset.elements()[1].length, Length(2));
    assert!(stream.is_at_end());
}

#[test]
fn extended_length_policy() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0x08, 0x00, 0x19, 0x01, // (0008,0119)
        b'U', b'C', // VR: UC
        0x00, 0x00, // reserved
        0x06, 0x00, 0x00, 0x00, // length: 6
        b'a', b'b', b'c', b'd', b'e', b' ',
    ];
    let options = DecodeOptions::new().length_policy(LengthPolicy::Extended);
    let mut stream = ByteStream::new(raw);
    let elem = read_element(&mut stream, &options, None).unwrap();
    assert_eq!(elem.vr, Some(VR::UC));
    assert_eq!(elem.length, Length(6));
    assert_eq!(elem.data_offset, 12);
    assert!(stream.is_at_end());
}

#[test]
fn truncated_header_is_an_error() {
    let raw: &[u8] = &[0x10, 0x00, 0x10, 0x00, b'P', b'N'];
    let mut stream = ByteStream::new(raw);
    let err = read_element_explicit(&mut stream, None, None).unwrap_err();
    assert!(matches!(err, Error::ReadLength { position: 6, .. }));
}

#[test]
fn nesting_past_the_limit_is_an_error() {
    #[rustfmt::skip]
    let raw: &[u8] = &[
        0x08, 0x00, 0x15, 0x11, // (0008,1115)
        b'S', b'Q', // VR: SQ
        0x00, 0x00, // reserved
        0x00, 0x00, 0x00, 0x00, // length: 0
    ];
    let options = DecodeOptions::new().max_depth(0);
    let mut stream = ByteStream::new(raw);
    let err = read_dataset(&mut stream, &options, None).unwrap_err();
    assert!(matches!(err, Error::MaxDepthExceeded { max_depth: 0, .. }));
}
