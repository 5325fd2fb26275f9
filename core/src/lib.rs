#![crate_type = "lib"]
#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_import_braces
)]

//! This is the core library of DICOM-scan, containing the data types
//! shared by the element decoder and its consumers.
//!
//! The current structure of this crate is as follows:
//!
//! - [`header`] comprises the DICOM tag, value representation and length
//!   types, plus the explicit VR length field policy.
//! - [`element`] holds the decoded element and item records.
//! - [`tags`] declares the tags with a structural role in the encoding.
//! - [`dictionary`] describes the optional tag to VR look-up.

pub mod dictionary;
pub mod element;
pub mod header;
pub mod tags;

pub use dictionary::{VrLookup, VrTable};
pub use element::{Element, Header, Item, ItemContent};
pub use header::{Length, LengthPolicy, Tag, VR};
