//! EBML/Matroska element IDs, stripped of their vint length markers.

/// `EBML` — the file-type header element.
pub const EBML: u64 = 0xA45DFA3;
/// `EBMLReadVersion` — the minimum EBML reader version required.
pub const EBML_READ_VERSION: u64 = 0x2F7;
/// `DocType` — the document type string ("matroska" or "webm").
pub const DOC_TYPE: u64 = 0x282;

/// `Segment` — the top-level container for everything after the header.
pub const SEGMENT: u64 = 0x8538067;

/// `Tracks` — the list of `TrackEntry` elements.
pub const TRACKS: u64 = 0x654AE6B;
/// `TrackEntry` — describes one track.
pub const TRACK_ENTRY: u64 = 0x2E;
/// `TrackNumber` — the track number referenced by Block headers.
pub const TRACK_NUMBER: u64 = 0x57;
/// `TrackUID` — a file-unique track identifier.
pub const TRACK_UID: u64 = 0x33C5;
/// `CodecID` — the codec identifier string.
pub const CODEC_ID: u64 = 0x06;
/// `CodecPrivate` — codec-specific setup data (e.g. Theora headers).
pub const CODEC_PRIVATE: u64 = 0x23A2;
/// `FlagDefault` — whether this is the default track of its kind.
pub const FLAG_DEFAULT: u64 = 0x08;
/// `FlagEnabled` — whether this track is enabled.
pub const FLAG_ENABLED: u64 = 0x39;
/// `DefaultDuration` — default per-frame duration, in nanoseconds.
pub const DEFAULT_DURATION: u64 = 0x3E383;
/// `TrackTimecodeScale` — per-track timecode scale factor.
pub const TRACK_TIMECODE_SCALE: u64 = 0x3314F;

/// `Cluster` — a time-ordered group of Blocks.
pub const CLUSTER: u64 = 0xF43B675;
/// `Timecode` — the base timecode of a Cluster.
pub const TIMECODE: u64 = 0x67;
/// `SimpleBlock` — a self-contained Block (no extra metadata).
pub const SIMPLE_BLOCK: u64 = 0x23;
/// `BlockGroup` — wraps a Block with extra metadata.
pub const BLOCK_GROUP: u64 = 0x20;
/// `Block` — codec data for one track, nested in a BlockGroup.
pub const BLOCK: u64 = 0x21;
/// `BlockDuration` — the duration of a Block inside a BlockGroup.
pub const BLOCK_DURATION: u64 = 0x1B;

/// CodecID string recognized as VP8.
pub const CODEC_ID_VP8: &[u8] = b"V_VP8";
/// CodecID string recognized as Theora.
pub const CODEC_ID_THEORA: &[u8] = b"V_THEORA";
/// CodecID string recognized as Vorbis.
pub const CODEC_ID_VORBIS: &[u8] = b"A_VORBIS";

/// Accepted `DocType` values.
pub const DOC_TYPE_MATROSKA: &[u8] = b"matroska";
/// Accepted `DocType` values.
pub const DOC_TYPE_WEBM: &[u8] = b"webm";
/// Maximum accepted `DocType` length, in bytes.
pub const DOC_TYPE_MAX_LEN: u64 = 16;
