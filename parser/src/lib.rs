#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    unused_qualifications,
    unused_import_braces
)]
//! This crate decodes DICOM data elements from an in-memory buffer
//! into a tree of [elements](dicom_scan_core::Element),
//! in either the explicit or the implicit VR encoding.
//!
//! Values are not interpreted:
//! each element records where its value lies in the buffer.
//! Sequences and encapsulated pixel data are decoded into item lists.
//! Element lengths which were encoded as undefined
//! are recovered by scanning for the matching delimiter.
//!
//! Malformed content is tolerated where possible,
//! and reported as a warning on the [`ByteStream`](stream::ByteStream).
//!
//! # Example
//!
//! ```
//! use dicom_scan_parser::{read_dataset, ByteStream, DecodeOptions};
//! use dicom_scan_core::{Tag, VR};
//!
//! let data = b"\x08\x00\x16\x00UI\x04\x001.2\0";
//! let mut stream = ByteStream::new(data);
//! let dataset = read_dataset(&mut stream, &DecodeOptions::new().explicit(), None)?;
//! let sop_class = dataset.get(Tag(0x0008, 0x0016)).unwrap();
//! assert_eq!(sop_class.vr, Some(VR::UI));
//! assert_eq!(sop_class.value(data), Some(&b"1.2\0"[..]));
//! # Ok::<(), dicom_scan_parser::decode::Error>(())
//! ```

pub mod dataset;
pub mod decode;
pub mod options;
pub mod stream;

pub use dataset::{read_dataset, read_dataset_until, DataSet};
pub use decode::{
    peek_tag, read_element, read_element_explicit, read_element_implicit, read_tag,
};
pub use options::{DecodeOptions, EncodingMode};
pub use stream::ByteStream;
