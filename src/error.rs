//! Error types for this crate.

/// Errors produced while validating or demultiplexing a Matroska/WebM stream.
///
/// Two conceptual families exist, mirroring the original design: an I/O
/// failure (the backing source refused a seek or short-read a required
/// count), and a structural failure (the bytes read were not a valid
/// Matroska/WebM file). The structural family has several variants so call
/// sites can report exactly which constraint failed; callers that only care
/// about the two-way split can match `Error::Io(_)` vs. everything else.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing source failed a read or seek. Corresponds to "Read
    /// failed. File might be broken." in the original design.
    #[error("read failed, file might be broken: {0}")]
    Io(#[from] std::io::Error),

    /// A read was clamped short by a window boundary or a lacing size walk
    /// ran past the end of its buffer, without an underlying `io::Error`.
    #[error("short read: not enough bytes remained in the current element")]
    ShortRead,

    /// A vint's first byte was `0x00`: no length marker is present.
    #[error("invalid variable-length integer: no length marker in leading byte")]
    InvalidVInt,

    /// An element's declared size used the EBML "unknown size" reserved
    /// pattern where this crate requires a concrete length.
    #[error("element {0:#x} has unknown size, which is not supported here")]
    UnknownElementSize(u64),

    /// A required child element was absent.
    #[error("missing required element {0:#x}")]
    MissingElement(u64),

    /// `EBMLReadVersion` exceeded the version this crate understands.
    #[error("unsupported EBML read version: {0}")]
    UnsupportedVersion(u64),

    /// `DocType` was absent, too long, or not "matroska"/"webm".
    #[error("unrecognized or missing DocType")]
    UnrecognizedDocType,

    /// A Block referenced a lacing mode reserved for EBML lacing, which this
    /// crate does not implement.
    #[error("EBML lacing is not implemented")]
    EbmlLacingUnsupported,

    /// The flags byte of a Block encoded a reserved or unrecognized lacing
    /// pattern.
    #[error("invalid lacing bits in block flags: {0:#04b}")]
    InvalidLacing(u8),

    /// Fixed-size lacing's block size did not divide evenly by the
    /// subpacket count.
    #[error("fixed lacing size {block_size} does not divide evenly into {count} subpackets")]
    NonDividingFixedLacing {
        /// Total size of the laced block.
        block_size: usize,
        /// Number of subpackets the lace claims to contain.
        count: usize,
    },

    /// A Xiph lacing size prefix or its subpacket slices ran past the end of
    /// the block buffer.
    #[error("malformed lacing data")]
    MalformedLacingData,
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
