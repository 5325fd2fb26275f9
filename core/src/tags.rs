//! Well-known tags with a structural role in the encoding.
use crate::header::Tag;

/// Item (FFFE,E000): starts an item of a sequence or a pixel data fragment.
pub const ITEM: Tag = Tag(0xFFFE, 0xE000);
/// Item Delimitation Item (FFFE,E00D): ends an item of undefined length.
pub const ITEM_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE00D);
/// Sequence Delimitation Item (FFFE,E0DD): ends a sequence of undefined length.
pub const SEQUENCE_DELIMITATION_ITEM: Tag = Tag(0xFFFE, 0xE0DD);
/// Pixel Data (7FE0,0010)
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

/// The group shared by items and delimiters.
pub const ITEM_GROUP: u16 = 0xFFFE;
