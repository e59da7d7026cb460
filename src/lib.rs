#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
//! A streaming Matroska/WebM demultiplexer built on a generic EBML reader.
//!
//! [`demux::Parser`] validates a file's `EBML`/`Segment` header, enumerates
//! its tracks, and then pulls packets for one track at a time via
//! [`demux::Parser::read_data`] — walking Clusters and Blocks lazily through
//! a shared, windowed byte source rather than building an in-memory tree.

/// Error types for this crate.
mod error;
pub use error::*;

/// Byte source abstraction and window-bounded reads.
pub mod io;

/// Variable-length integer and fixed-width field decoding.
pub mod vint;

/// EBML/Matroska element id constants.
pub mod ids;

/// A single EBML element and forward-only sibling iteration.
pub mod cursor;

/// Header validation (`EBML`, `DocType`, `Segment`).
pub mod header;

/// Track enumeration (`Tracks`, `TrackEntry`).
pub mod tracks;

/// Lacing (Xiph, fixed-size, reserved EBML) subpacket splitting.
pub mod lacing;

/// The per-track demultiplexer.
pub mod demux;

/// A prelude for common types and traits.
pub mod prelude {
    pub use crate::demux::{Packet, Parser};
    pub use crate::error::{Error, Result};
    pub use crate::tracks::{StreamInfo, StreamType};
}
