//! Enumerates `TrackEntry` elements inside a `Tracks` element into
//! [`StreamInfo`] descriptors, and seeds the lacing state Theora tracks need
//! before any Cluster has been read.

use log::{debug, warn};

use crate::cursor::{EbmlElement, ElementCursor};
use crate::error::{Error, Result};
use crate::ids;
use crate::io::ByteSource;
use crate::lacing::Lacing;
use crate::vint::{read_float, read_uint};

/// The recognized codecs. Anything else is reported as [`StreamType::Unknown`]
/// and its packets are still delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    /// `V_VP8`
    Vp8,
    /// `V_THEORA`
    Theora,
    /// `A_VORBIS`
    Vorbis,
    /// Any other `CodecID`.
    Unknown,
}

impl StreamType {
    fn from_codec_id(bytes: &[u8]) -> Self {
        match bytes {
            ids::CODEC_ID_VP8 => StreamType::Vp8,
            ids::CODEC_ID_THEORA => StreamType::Theora,
            ids::CODEC_ID_VORBIS => StreamType::Vorbis,
            _ => StreamType::Unknown,
        }
    }
}

/// Immutable, per-track metadata resolved once at construction time.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// The recognized codec, or [`StreamType::Unknown`].
    pub stream_type: StreamType,
    /// The track's unique identifier (`TrackUID`).
    pub track_uid: u64,
    /// The track number referenced by Block headers (`TrackNumber`).
    pub track_number: u64,
    /// Default per-frame duration in nanoseconds, or 0 if unspecified.
    pub default_duration: u64,
    /// Whether the track is marked enabled.
    pub is_enabled: bool,
    /// Whether the track is marked default.
    pub is_default: bool,
}

/// Initial lacing state for a freshly enumerated track, returned alongside
/// [`StreamInfo`] so the demultiplexer can seed each track's [`StreamState`].
///
/// [`StreamState`]: crate::demux::StreamState
#[derive(Debug, Clone, Default)]
pub struct InitialLacing {
    /// The lacing mode the pre-seeded buffer (if any) uses.
    pub lacing: Lacing,
    /// Bytes pre-seeded into the track buffer, ready to be split according
    /// to `lacing`. May legitimately be empty even when a preseed is
    /// present (a Theora `CodecPrivate` with a zero trailing remainder after
    /// its frame count byte): `subpacket_count` is the presence sentinel,
    /// not this field.
    pub buffer: Vec<u8>,
    /// Number of subpackets the pre-seeded buffer holds. `0` means no
    /// preseed was produced; any real preseed sets this to at least `1`.
    pub subpacket_count: usize,
}

/// Enumerate every `TrackEntry` under the given `Tracks` element.
///
/// Each `TrackEntry` missing `CodecID`, `TrackUID`, or `TrackNumber` aborts
/// enumeration entirely: a parser is constructed all-or-nothing.
pub fn enumerate_tracks(tracks_element: &EbmlElement) -> Result<Vec<(StreamInfo, InitialLacing)>> {
    let mut entries = ElementCursor::new(tracks_element.children())?;
    let mut out = Vec::new();

    loop {
        entries.until(&[ids::TRACK_ENTRY])?;
        let Some(entry) = entries.current().cloned() else {
            break;
        };
        out.push(read_track_entry(&entry)?);
        entries.advance()?;
    }

    Ok(out)
}

fn read_track_entry(entry: &EbmlElement) -> Result<(StreamInfo, InitialLacing)> {
    let mut codec_id: Option<Vec<u8>> = None;
    let mut track_uid: Option<u64> = None;
    let mut track_number: Option<u64> = None;
    let mut codec_private: Option<Vec<u8>> = None;
    let mut default_duration = 0u64;
    let mut is_enabled = true;
    let mut is_default = true;

    let mut children = ElementCursor::new(entry.children())?;
    while let Some(child) = children.current().cloned() {
        match child.id {
            ids::CODEC_ID => {
                let mut bytes = vec![0u8; child.size as usize];
                child.payload.clone().read_exact(&mut bytes)?;
                codec_id = Some(bytes);
            }
            ids::TRACK_UID => {
                track_uid = Some(read_uint(&mut child.payload.clone(), child.size)?);
            }
            ids::TRACK_NUMBER => {
                track_number = Some(read_uint(&mut child.payload.clone(), child.size)?);
            }
            ids::CODEC_PRIVATE => {
                let mut bytes = vec![0u8; child.size as usize];
                child.payload.clone().read_exact(&mut bytes)?;
                codec_private = Some(bytes);
            }
            ids::FLAG_DEFAULT => {
                is_default = read_uint(&mut child.payload.clone(), child.size)? == 1;
            }
            ids::FLAG_ENABLED => {
                is_enabled = read_uint(&mut child.payload.clone(), child.size)? == 1;
            }
            ids::DEFAULT_DURATION => {
                default_duration = read_uint(&mut child.payload.clone(), child.size)?;
            }
            ids::TRACK_TIMECODE_SCALE => {
                // Decoded here only to confirm it parses; the demultiplexer
                // stores but never applies it (see design notes).
                let _ = read_float(&mut child.payload.clone(), child.size)?;
            }
            _ => {}
        }
        children.advance()?;
    }

    let codec_id = codec_id.ok_or(Error::MissingElement(ids::CODEC_ID))?;
    let track_uid = track_uid.ok_or(Error::MissingElement(ids::TRACK_UID))?;
    let track_number = track_number.ok_or(Error::MissingElement(ids::TRACK_NUMBER))?;

    let stream_type = StreamType::from_codec_id(&codec_id);
    if stream_type == StreamType::Unknown {
        debug!(
            "track {track_number} has unrecognized CodecID {:?}",
            String::from_utf8_lossy(&codec_id)
        );
    } else {
        debug!("track {track_number} resolved to {stream_type:?}");
    }

    let info = StreamInfo {
        stream_type,
        track_uid,
        track_number,
        default_duration,
        is_enabled,
        is_default,
    };

    let initial = match (stream_type, codec_private) {
        (StreamType::Theora, Some(private)) if !private.is_empty() => {
            let frame_count = private[0] as usize;
            InitialLacing {
                lacing: Lacing::Xiph,
                buffer: private[1..].to_vec(),
                subpacket_count: frame_count + 1,
            }
        }
        (StreamType::Theora, Some(_)) => {
            warn!("track {track_number} is Theora but has an empty CodecPrivate");
            InitialLacing::default()
        }
        _ => InitialLacing::default(),
    };

    Ok((info, initial))
}
