#![allow(clippy::derive_partial_eq_without_eq)]
//! DICOM element tree dumping library
//!
//! This is a helper library
//! for printing the structure of a decoded DICOM data set
//! in a human readable way:
//! one line per element with its tag, VR, length and value offset,
//! nested items indented below their sequence,
//! and the decoding warnings at the end.
//!
//! # Example
//!
//! ```no_run
//! use dicom_scan_dump::{ColorMode, DumpOptions};
//! use dicom_scan_parser::{read_dataset, ByteStream, DecodeOptions};
//!
//! let data = std::fs::read("path/to/file.dcm")?;
//! let mut stream = ByteStream::new(&data).starting_at(132)?;
//! let dataset = read_dataset(&mut stream, &DecodeOptions::new().explicit(), None)?;
//!
//! let mut options = DumpOptions::new();
//! options
//!     // maximum 100 characters per line
//!     .width(100)
//!     // never print colored output
//!     .color_mode(ColorMode::Never)
//!     // dump to stdout
//!     .dump_dataset(&dataset, &data)?;
//! # Result::<(), Box<dyn std::error::Error>>::Ok(())
//! ```
use dicom_scan_core::{Element, Item, ItemContent, VR};
use dicom_scan_parser::DataSet;
use owo_colors::*;
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::io::{stdout, Result as IoResult, Write};
use std::str::FromStr;

/// Options and flags to configure how to dump a decoded data set.
///
/// Once set up,
/// the [`dump_dataset`] or [`dump_dataset_to`] methods
/// print the element tree of a data set
/// along with the bytes it was decoded from.
///
/// [`dump_dataset`]: DumpOptions::dump_dataset
/// [`dump_dataset_to`]: DumpOptions::dump_dataset_to
#[derive(Debug, Default, Clone, PartialEq)]
#[non_exhaustive]
pub struct DumpOptions {
    /// whether to produce colored output
    pub color: ColorMode,
    /// the console width to assume when trimming long values
    pub width: Option<u32>,
    /// never trim out any values
    pub no_limit: bool,
    /// do not print the decoding warnings
    pub no_warnings: bool,
}

impl DumpOptions {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the maximum output width in number of characters.
    ///
    /// The method [`dump_dataset_to`](DumpOptions::dump_dataset_to)
    /// will print everything to the end,
    /// regardless of this option.
    pub fn width(&mut self, width: u32) -> &mut Self {
        self.width = Some(width);
        self
    }

    /// Set the maximum output width to automatic,
    /// based on terminal size.
    ///
    /// This is the default behavior.
    /// If a terminal width could not be determined,
    /// the default width of 120 characters is used.
    pub fn width_auto(&mut self) -> &mut Self {
        self.width = None;
        self
    }

    /// Set whether to remove the maximum width restriction for values.
    pub fn no_limit(&mut self, no_limit: bool) -> &mut Self {
        self.no_limit = no_limit;
        self
    }

    /// Set whether to leave out the decoding warnings.
    pub fn no_warnings(&mut self, no_warnings: bool) -> &mut Self {
        self.no_warnings = no_warnings;
        self
    }

    /// Set the output color mode.
    pub fn color_mode(&mut self, color: ColorMode) -> &mut Self {
        self.color = color;
        self
    }

    /// Dump a data set to standard output.
    ///
    /// `source` is the buffer the data set was decoded from,
    /// used to preview element values.
    pub fn dump_dataset(&self, dataset: &DataSet, source: &[u8]) -> IoResult<()> {
        self.dump_dataset_impl(stdout(), dataset, source, true)
    }

    /// Dump a data set to the given writer.
    pub fn dump_dataset_to(
        &self,
        to: impl Write,
        dataset: &DataSet,
        source: &[u8],
    ) -> IoResult<()> {
        self.dump_dataset_impl(to, dataset, source, false)
    }

    fn dump_dataset_impl(
        &self,
        mut to: impl Write,
        dataset: &DataSet,
        source: &[u8],
        to_stdout: bool,
    ) -> IoResult<()> {
        match (self.color, to_stdout) {
            (ColorMode::Never, _) => owo_colors::set_override(false),
            (ColorMode::Always, _) => owo_colors::set_override(true),
            (ColorMode::Auto, false) => owo_colors::set_override(false),
            (ColorMode::Auto, true) => owo_colors::unset_override(),
        }

        let max_characters = if self.no_limit || !to_stdout {
            None
        } else {
            Some(determine_width(self.width))
        };

        let dumper = Dumper {
            source,
            max_characters,
        };
        for elem in dataset {
            dumper.dump_element(&mut to, elem, 0)?;
        }

        if !self.no_warnings && !dataset.warnings().is_empty() {
            writeln!(to, "{:-<58}", "")?;
            for warning in dataset.warnings() {
                writeln!(to, "{} {}", DumpValue::Invalid("[WARN]"), warning)?;
            }
        }
        Ok(())
    }
}

/// Enumeration of output coloring modes.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ColorMode {
    /// Produce colored output if supported by the destination
    /// (namely, if the destination is a terminal).
    /// When calling [`dump_dataset_to`](DumpOptions::dump_dataset_to),
    /// the output will not be colored.
    ///
    /// This is the default behavior.
    #[default]
    Auto,
    /// Never produce colored output.
    Never,
    /// Always produce colored output.
    Always,
}

impl Display for ColorMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ColorMode::Never => f.write_str("never"),
            ColorMode::Auto => f.write_str("auto"),
            ColorMode::Always => f.write_str("always"),
        }
    }
}

impl FromStr for ColorMode {
    type Err = ColorModeError;
    fn from_str(color: &str) -> Result<Self, Self::Err> {
        match color {
            "never" => Ok(ColorMode::Never),
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            _ => Err(ColorModeError),
        }
    }
}

/// The error raised when providing an invalid color mode.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct ColorModeError;

impl Display for ColorModeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("invalid color mode")
    }
}

impl std::error::Error for ColorModeError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DumpValue<T>
where
    T: ToString,
{
    TagNum(T),
    Alias(T),
    Num(T),
    Str(T),
    Invalid(T),
    Nothing,
}

impl<T> Display for DumpValue<T>
where
    T: Display,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        fn write_value_with_width(value: impl Display, f: &mut Formatter) -> fmt::Result {
            if let Some(width) = f.width() {
                write!(f, "{:width$}", value, width = width)
            } else {
                write!(f, "{}", value)
            }
        }

        match self {
            DumpValue::TagNum(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.dimmed());
                write_value_with_width(value, f)
            }
            DumpValue::Alias(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.bold());
                write_value_with_width(value, f)
            }
            DumpValue::Num(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.cyan());
                write_value_with_width(value, f)
            }
            DumpValue::Str(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.yellow());
                write_value_with_width(value, f)
            }
            DumpValue::Invalid(v) => {
                let value = v.if_supports_color(Stream::Stdout, |v| v.red());
                write_value_with_width(value, f)
            }
            DumpValue::Nothing => {
                let value = "(no value)".if_supports_color(Stream::Stdout, |v| v.italic());
                write_value_with_width(value, f)
            }
        }
    }
}

/// Dump a data set to stdout.
pub fn dump_dataset(dataset: &DataSet, source: &[u8]) -> IoResult<()> {
    DumpOptions::new().dump_dataset(dataset, source)
}

/// Dump a data set to the given writer.
pub fn dump_dataset_to(to: impl Write, dataset: &DataSet, source: &[u8]) -> IoResult<()> {
    DumpOptions::new().dump_dataset_to(to, dataset, source)
}

struct Dumper<'a> {
    source: &'a [u8],
    max_characters: Option<u32>,
}

impl Dumper<'_> {
    fn dump_element<W>(&self, to: &mut W, elem: &Element, depth: u32) -> IoResult<()>
    where
        W: ?Sized + Write,
    {
        let indent = "  ".repeat(depth as usize);
        let vr = elem.vr.map_or("--", VR::to_str);
        let length = if elem.had_undefined_length {
            format!("{} U/L", elem.length)
        } else {
            elem.length.to_string()
        };

        write!(
            to,
            "{}{} {:2} {:>10} @{:<8} ",
            indent,
            DumpValue::TagNum(elem.tag),
            DumpValue::Alias(vr),
            length,
            elem.data_offset,
        )?;

        if elem.is_encapsulated_pixel_data() {
            let fragments = elem.fragments().count();
            writeln!(
                to,
                "(pixel data, {} fragment{})",
                fragments,
                if fragments == 1 { "" } else { "s" },
            )?;
            for (i, item) in elem.items().iter().enumerate() {
                self.dump_fragment(to, item, i, depth + 1)?;
            }
        } else if let Some(items) = &elem.items {
            writeln!(
                to,
                "({} Item{})",
                items.len(),
                if items.len() == 1 { "" } else { "s" },
            )?;
            for item in items {
                self.dump_item(to, item, depth + 1)?;
            }
        } else {
            writeln!(to, "{}", self.value_summary(elem))?;
        }
        Ok(())
    }

    fn dump_item<W>(&self, to: &mut W, item: &Item, depth: u32) -> IoResult<()>
    where
        W: ?Sized + Write,
    {
        let indent = "  ".repeat(depth as usize);
        writeln!(
            to,
            "{}{} {} {}{} @{}",
            indent,
            DumpValue::TagNum(item.tag),
            DumpValue::Alias("Item"),
            item.length,
            if item.had_undefined_length { " U/L" } else { "" },
            item.data_offset,
        )?;
        match &item.content {
            ItemContent::DataSet(elements) => {
                for elem in elements {
                    self.dump_element(to, elem, depth + 1)?;
                }
            }
            ItemContent::Fragment(data) => {
                writeln!(
                    to,
                    "{}  {}",
                    indent,
                    item_value_summary(data, self.max_characters)
                )?;
            }
        }
        Ok(())
    }

    fn dump_fragment<W>(&self, to: &mut W, item: &Item, index: usize, depth: u32) -> IoResult<()>
    where
        W: ?Sized + Write,
    {
        let indent = "  ".repeat(depth as usize);
        let data = item.fragment().unwrap_or_default();
        if index == 0 {
            let table: Vec<u32> = data
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            writeln!(
                to,
                "{}{} {} {} @{}: {}",
                indent,
                DumpValue::TagNum(item.tag),
                DumpValue::Alias("Offset table"),
                item.length,
                item.data_offset,
                offset_table_summary(&table, self.max_characters),
            )?;
        } else {
            writeln!(
                to,
                "{}{} {} #{} {} @{}: {}",
                indent,
                DumpValue::TagNum(item.tag),
                DumpValue::Alias("Fragment"),
                index,
                item.length,
                item.data_offset,
                item_value_summary(data, self.max_characters),
            )?;
        }
        Ok(())
    }

    fn value_summary(&self, elem: &Element) -> DumpValue<String> {
        let data = match elem.value(self.source) {
            Some(data) => data,
            None => {
                let start = elem.data_offset.min(self.source.len());
                let partial = &self.source[start..];
                if partial.is_empty() {
                    return DumpValue::Invalid("(truncated)".to_string());
                }
                partial
            }
        };
        if data.is_empty() {
            return DumpValue::Nothing;
        }

        match elem.vr {
            Some(vr) if is_text(vr) => {
                let txt = format!(
                    "\"{}\"",
                    String::from_utf8_lossy(data)
                        .trim_end_matches(whitespace_or_null)
                        // sanitize input
                        .replace('\n', "␊")
                        .replace('\r', "␍")
                        .replace('\0', "␀")
                        .replace(|c: char| c.is_control(), "�")
                );
                if let Some(max) = self.max_characters {
                    DumpValue::Str(cut_str(&txt, max).into_owned())
                } else {
                    DumpValue::Str(txt)
                }
            }
            _ => item_value_summary(data, self.max_characters),
        }
    }
}

/// Whether values of this VR are character strings.
fn is_text(vr: VR) -> bool {
    matches!(
        vr,
        VR::AE
            | VR::AS
            | VR::CS
            | VR::DA
            | VR::DS
            | VR::DT
            | VR::IS
            | VR::LO
            | VR::LT
            | VR::PN
            | VR::SH
            | VR::ST
            | VR::TM
            | VR::UC
            | VR::UI
            | VR::UR
            | VR::UT
    )
}

#[inline]
fn whitespace_or_null(c: char) -> bool {
    c.is_whitespace() || c == '\0'
}

fn item_value_summary(data: &[u8], max_characters: Option<u32>) -> DumpValue<String> {
    DumpValue::Num(format_value_list(
        data.iter().map(|n| format!("{:02X}", n)),
        max_characters,
    ))
}

fn offset_table_summary(data: &[u32], max_characters: Option<u32>) -> String {
    if data.is_empty() {
        format!("{}", "(empty)".if_supports_color(Stream::Stdout, |v| v.italic()))
    } else {
        format_value_list(data.iter().map(|n| format!("{:04X}", n)), max_characters)
    }
}

fn format_value_list<I>(values: I, max_characters: Option<u32>) -> String
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
    I::Item: Display,
{
    let values = values.into_iter();
    let len = values.len();
    let mut acc_size = 0;
    let mut pieces = String::new();
    if len > 1 {
        pieces.push('[');
    }
    for piece in values {
        let piece = piece.to_string();
        if acc_size > 0 {
            pieces.push_str(", ");
        }
        acc_size += piece.len();
        pieces.push_str(&piece);
        // stop earlier if applicable
        if max_characters
            .filter(|max| (*max as usize) < acc_size)
            .is_some()
        {
            break;
        }
    }
    if len > 1 {
        pieces.push(']');
    }
    if let Some(max_characters) = max_characters {
        cut_str(&pieces, max_characters).into_owned()
    } else {
        pieces
    }
}

fn cut_str(s: &str, max_characters: u32) -> Cow<str> {
    let max = (max_characters.saturating_sub(3)) as usize;
    let len = s.chars().count();

    if len > max {
        s.chars()
            .take(max)
            .chain("...".chars())
            .collect::<String>()
            .into()
    } else {
        s.into()
    }
}

fn determine_width(user_width: Option<u32>) -> u32 {
    user_width
        .or_else(|| terminal_size::terminal_size().map(|(width, _)| u32::from(width.0)))
        .unwrap_or(120)
}

#[cfg(test)]
mod tests {
    use dicom_scan_parser::{read_dataset, ByteStream, DecodeOptions};

    use super::{cut_str, format_value_list, whitespace_or_null};
    use crate::{ColorMode, DumpOptions};

    #[rustfmt::skip]
    const RAW: &[u8] = &[
        0x08, 0x00, 0x16, 0x00, // (0008,0016)
        b'U', b'I', // VR: UI
        0x04, 0x00, // length: 4
        b'1', b'.', b'2', 0x00,
        // -- 12 --
        0x08, 0x00, 0x15, 0x11, // (0008,1115)
        b'S', b'Q', // VR: SQ
        0x00, 0x00, // reserved
        0xFF, 0xFF, 0xFF, 0xFF, // length: undefined
        // -- 24 --
        0xFE, 0xFF, 0x00, 0xE0, // (FFFE,E000)
        0x0A, 0x00, 0x00, 0x00, // item length: 10
        0x08, 0x00, 0x50, 0x11, // (0008,1150)
        b'U', b'I', // VR: UI
        0x02, 0x00, // length: 2
        b'9', 0x00,
        // -- 42 --
        0xFE, 0xFF, 0xDD, 0xE0, // (FFFE,E0DD)
        0x00, 0x00, 0x00, 0x00,
        // -- 50 --
        0xE0, 0x7F, 0x10, 0x00, // (7FE0,0010)
        b'O', b'B', // VR: OB
        0x00, 0x00, // reserved
        0xFF, 0xFF, 0xFF, 0xFF, // length: undefined
        0xFE, 0xFF, 0x00, 0xE0, // offset table
        0x00, 0x00, 0x00, 0x00,
        0xFE, 0xFF, 0x00, 0xE0, // fragment
        0x02, 0x00, 0x00, 0x00,
        0xAB, 0xCD,
        0xFE, 0xFF, 0xDD, 0xE0, // (FFFE,E0DD)
        0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn trims_all_whitespace() {
        assert_eq!("   ".trim_end_matches(whitespace_or_null), "");
        assert_eq!("\0".trim_end_matches(whitespace_or_null), "");
        assert_eq!("1.4.5.6\0".trim_end_matches(whitespace_or_null), "1.4.5.6");
        assert_eq!("AETITLE ".trim_end_matches(whitespace_or_null), "AETITLE");
    }

    #[test]
    fn cuts_long_values() {
        assert_eq!(cut_str("0123456789", 8), "01234...");
        assert_eq!(cut_str("01234", 8), "01234");
        assert_eq!(
            format_value_list(["AB", "CD", "EF"].iter(), None),
            "[AB, CD, EF]"
        );
        assert_eq!(format_value_list(["AB"].iter(), None), "AB");
    }

    #[test]
    fn dump_dataset_to_covers_properties() {
        let mut stream = ByteStream::new(RAW);
        let dataset = read_dataset(&mut stream, &DecodeOptions::new(), None).unwrap();

        let mut out = Vec::new();
        DumpOptions::new()
            .color_mode(ColorMode::Never)
            .dump_dataset_to(&mut out, &dataset, RAW)
            .unwrap();

        let text = std::str::from_utf8(&out).expect("output is not valid UTF-8");
        let lines: Vec<_> = text.lines().collect();

        let parts: Vec<&str> = lines[0].split(' ').filter(|p| !p.is_empty()).collect();
        assert_eq!(&parts[..], &["(0008,0016)", "UI", "4", "@8", "\"1.2\""]);

        let parts: Vec<&str> = lines[1].split(' ').filter(|p| !p.is_empty()).collect();
        assert_eq!(&parts[..], &["(0008,1115)", "SQ", "26", "U/L", "@24", "(1", "Item)"]);

        assert!(lines[2].starts_with("  (FFFE,E000) Item 10 @32"));
        let parts: Vec<&str> = lines[3].split(' ').filter(|p| !p.is_empty()).collect();
        assert_eq!(&parts[..], &["(0008,1150)", "UI", "2", "@40", "\"9\""]);

        assert!(lines[4].starts_with("(7FE0,0010) OB"));
        assert!(lines[4].ends_with("(pixel data, 1 fragment)"));
        assert!(lines[5].starts_with("  (FFFE,E000) Offset table 0 @70"));
        assert_eq!(lines[6], "  (FFFE,E000) Fragment #1 2 @78: [AB, CD]");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn warnings_are_listed_last() {
        // truncated in the middle of the sequence item
        let raw = &RAW[..36];
        let mut stream = ByteStream::new(raw);
        let result = read_dataset(&mut stream, &DecodeOptions::new(), None);
        // the item's nested element header is cut
        assert!(result.is_err());

        let raw = &RAW[..12];
        let mut stream = ByteStream::new(raw);
        stream.warn("something odd");
        let dataset = read_dataset(&mut stream, &DecodeOptions::new(), None).unwrap();

        let mut out = Vec::new();
        DumpOptions::new()
            .color_mode(ColorMode::Never)
            .dump_dataset_to(&mut out, &dataset, raw)
            .unwrap();
        let text = std::str::from_utf8(&out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "[WARN] something odd");

        let mut out = Vec::new();
        DumpOptions::new()
            .color_mode(ColorMode::Never)
            .no_warnings(true)
            .dump_dataset_to(&mut out, &dataset, raw)
            .unwrap();
        assert_eq!(std::str::from_utf8(&out).unwrap().lines().count(), 1);
    }

    #[test]
    fn color_mode_round_trip() {
        for mode in [ColorMode::Auto, ColorMode::Never, ColorMode::Always] {
            assert_eq!(mode.to_string().parse::<ColorMode>(), Ok(mode));
        }
        assert!("sometimes".parse::<ColorMode>().is_err());
    }
}
