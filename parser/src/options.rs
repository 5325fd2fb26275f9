//! Options controlling how elements are decoded.
use dicom_scan_core::{LengthPolicy, Tag};

/// The maximum sequence nesting depth accepted by default.
pub const DEFAULT_MAX_DEPTH: u32 = 256;

/// Whether value representations are written in the stream.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum EncodingMode {
    /// Each element header carries a two character VR code.
    #[default]
    Explicit,
    /// Element headers only have a tag and a 4-byte length,
    /// the VR must be looked up or inferred.
    Implicit,
}

/// Options for decoding a data set or a single element.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub struct DecodeOptions {
    /// the encoding mode of the whole data set
    pub mode: EncodingMode,
    /// stop decoding as soon as an element with this tag is read,
    /// without consuming its value
    pub until_tag: Option<Tag>,
    /// which VRs have a 4-byte length field in explicit VR headers
    pub length_policy: LengthPolicy,
    /// the maximum sequence nesting depth before decoding fails
    pub max_depth: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            mode: EncodingMode::default(),
            until_tag: None,
            length_policy: LengthPolicy::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Create the default set of options (explicit VR, legacy length policy).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the encoding mode of the options.
    pub fn mode(mut self, mode: EncodingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Decode elements with an explicit VR.
    pub fn explicit(self) -> Self {
        self.mode(EncodingMode::Explicit)
    }

    /// Decode elements with an implicit VR.
    pub fn implicit(self) -> Self {
        self.mode(EncodingMode::Implicit)
    }

    /// Stop at the given tag, keeping only its header.
    pub fn until_tag(mut self, tag: impl Into<Option<Tag>>) -> Self {
        self.until_tag = tag.into();
        self
    }

    /// Replace the length field policy of the options.
    pub fn length_policy(mut self, policy: LengthPolicy) -> Self {
        self.length_policy = policy;
        self
    }

    /// Replace the maximum sequence nesting depth.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }
}
