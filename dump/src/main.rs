//! A CLI tool for inspecting the element structure of DICOM data
//! by decoding it and printing the element tree in a human readable format.
use byteordered::Endianness;
use clap::Parser;
use dicom_scan_core::{LengthPolicy, Tag, VrTable, VR};
use dicom_scan_dump::{ColorMode, DumpOptions};
use dicom_scan_parser::{read_dataset, ByteStream, DecodeOptions, EncodingMode};
use snafu::{Report, ResultExt, Whatever};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Exit code for when an error emerged while reading the file.
const ERROR_READ: i32 = -2;
/// Exit code for when an error emerged while dumping the file.
const ERROR_PRINT: i32 = -3;

/// Decode DICOM data sets and dump their element trees
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// The DICOM file(s) to read
    #[clap(required = true)]
    files: Vec<PathBuf>,
    /// Decode elements with an implicit VR
    /// (explicit VR by default)
    #[clap(long = "implicit")]
    implicit: bool,
    /// Read numbers in big endian
    #[clap(long = "big-endian")]
    big_endian: bool,
    /// Read OD, OL, OV, SV, UC, UR and UV with a 4-byte length field
    #[clap(long = "extended-vr")]
    extended_vr: bool,
    /// Stop at the element with this tag (e.g. 7FE0,0010)
    #[clap(long = "until")]
    until: Option<Tag>,
    /// Treat the element with this tag as a sequence
    /// (can be given multiple times)
    #[clap(long = "sq")]
    sq: Vec<Tag>,
    /// Start decoding at this byte offset
    /// (132 skips the preamble and magic code of a DICOM file)
    #[clap(long = "skip", default_value = "0")]
    skip: usize,
    /// Print all values to the end
    /// (limited to `width` by default)
    #[clap(long = "no-limit")]
    no_limit: bool,
    /// The width of the display
    /// (default is to check automatically)
    #[clap(short = 'w', long = "width")]
    width: Option<u32>,
    /// The color mode
    #[clap(long = "color", default_value = "auto")]
    color: ColorMode,
    /// Fail if any errors are encountered
    #[clap(long = "fail-first")]
    fail_first: bool,
    /// Print more information about the decoding process
    #[clap(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    run().unwrap_or_else(|e| {
        eprintln!("{}", Report::from_error(e));
        std::process::exit(-2);
    });
}

fn init_logging(verbose: bool) -> Result<(), Whatever> {
    let directive = if verbose {
        "dicom_scan_parser=debug"
    } else {
        "dicom_scan_parser=error"
    };
    let filter = EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .whatever_context::<_, Whatever>("Invalid logging directive")?,
    );
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .whatever_context("Could not set up global logging subscriber")
}

fn run() -> Result<(), Whatever> {
    let App {
        files: filenames,
        implicit,
        big_endian,
        extended_vr,
        until,
        sq,
        skip,
        no_limit,
        width,
        color,
        fail_first,
        verbose,
    } = App::parse();

    init_logging(verbose).unwrap_or_else(|e| {
        eprintln!("[ERROR] {}", Report::from_error(e));
    });

    let decode_options = DecodeOptions::new()
        .mode(if implicit {
            EncodingMode::Implicit
        } else {
            EncodingMode::Explicit
        })
        .until_tag(until)
        .length_policy(if extended_vr {
            LengthPolicy::Extended
        } else {
            LengthPolicy::Legacy
        });
    let endianness = if big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    };
    let vr_table: VrTable = sq.into_iter().map(|tag| (tag, VR::SQ)).collect();

    let mut options = DumpOptions::new();
    options.no_limit(no_limit).color_mode(color);
    if let Some(width) = width {
        options.width(width);
    }
    let fail_first = filenames.len() == 1 || fail_first;
    let mut errors: i32 = 0;

    for filename in &filenames {
        println!("{}: ", filename.display());
        let data = match std::fs::read(filename)
            .whatever_context::<_, Whatever>("Could not read file")
        {
            Ok(data) => data,
            Err(e) => {
                eprintln!("{}", Report::from_error(e));
                if fail_first {
                    std::process::exit(ERROR_READ);
                }
                errors += 1;
                continue;
            }
        };

        let lookup = (!vr_table.is_empty()).then_some(&vr_table);
        let dataset = match decode(&data, skip, endianness, &decode_options, lookup, filename) {
            Ok(dataset) => dataset,
            Err(e) => {
                eprintln!("{}", Report::from_error(e));
                if fail_first {
                    std::process::exit(ERROR_READ);
                }
                errors += 1;
                continue;
            }
        };

        if let Err(ref e) = options.dump_dataset(&dataset, &data) {
            if e.kind() == ErrorKind::BrokenPipe {
                // handle broken pipe separately with a no-op
            } else {
                eprintln!("[ERROR] {}", Report::from_error(e));
                if fail_first {
                    std::process::exit(ERROR_PRINT);
                }
            }
            errors += 1;
        } // else all good
    }

    std::process::exit(errors);
}

fn decode(
    data: &[u8],
    skip: usize,
    endianness: Endianness,
    options: &DecodeOptions,
    lookup: Option<&VrTable>,
    filename: &Path,
) -> Result<dicom_scan_parser::DataSet, Whatever> {
    let mut stream = ByteStream::with_endianness(data, endianness)
        .starting_at(skip)
        .with_whatever_context::<_, _, Whatever>(|_| {
            format!("Offset {} is past the end of {}", skip, filename.display())
        })?;
    read_dataset(
        &mut stream,
        options,
        lookup.map(|table| table as &dyn dicom_scan_core::VrLookup),
    )
    .with_whatever_context(|_| format!("Could not decode {}", filename.display()))
}
