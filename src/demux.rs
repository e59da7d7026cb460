//! The per-track demultiplexer: walks Clusters and Blocks in document order
//! and yields codec packets for one track at a time.

use log::trace;

use crate::cursor::ElementCursor;
use crate::error::{Error, Result};
use crate::header::validate;
use crate::ids;
use crate::io::{ByteSource, SharedSource};
use crate::lacing::{self, Lacing};
use crate::tracks::{enumerate_tracks, StreamInfo};
use crate::vint::{read_i16, read_uint, read_vint};

/// A demultiplexed Matroska/WebM stream, opened from a byte source.
///
/// Construction is all-or-nothing: the header is validated and every track
/// is enumerated up front, or `open` fails and no partial `Parser` escapes.
///
/// Not `Send`/`Sync`: every track's cursor reads through the same shared
/// source, so `read_data` must be called for one track at a time, from one
/// thread (see the crate's concurrency notes).
pub struct Parser {
    streams: Vec<StreamInfo>,
    state: Vec<StreamState>,
}

/// One subpacket borrowed from a track's internal buffer, valid until the
/// next call to [`Parser::read_data`] on the *same* track.
#[derive(Debug)]
pub struct Packet<'a> {
    /// Presentation timecode, in the track's native (unscaled) units.
    pub timecode: i64,
    /// Duration, in nanoseconds (from `BlockDuration`, or the track's
    /// `DefaultDuration` if absent).
    pub duration: u64,
    /// The codec payload bytes for this subpacket.
    pub data: &'a [u8],
}

struct StreamState {
    cluster_cursor: Option<ElementCursor>,
    block_cursor: Option<ElementCursor>,
    first_cluster: bool,
    cluster_timecode: i64,
    block_timecode: i64,
    block_duration: u64,
    lacing: Lacing,
    subpacket_index: usize,
    subpacket_count: usize,
    buffer: Vec<u8>,
}

impl StreamState {
    fn fresh() -> Self {
        Self {
            cluster_cursor: None,
            block_cursor: None,
            first_cluster: true,
            cluster_timecode: 0,
            block_timecode: 0,
            block_duration: 0,
            lacing: Lacing::None,
            subpacket_index: 1,
            subpacket_count: 1,
            buffer: Vec::new(),
        }
    }
}

impl Parser {
    /// Validate the header, enumerate tracks, and construct a demultiplexer
    /// ready to read packets.
    pub fn open(source: SharedSource) -> Result<Self> {
        let validated = validate(source.clone())?;
        let segment = validated.segment;

        let mut tracks_cursor = ElementCursor::new(segment.children())?;
        tracks_cursor.until(&[ids::TRACKS])?;
        let tracks_element = tracks_cursor
            .current()
            .cloned()
            .ok_or(Error::MissingElement(ids::TRACKS))?;

        let enumerated = enumerate_tracks(&tracks_element)?;

        let mut streams = Vec::with_capacity(enumerated.len());
        let mut state = Vec::with_capacity(enumerated.len());
        for (info, initial) in enumerated {
            let mut st = StreamState::fresh();
            st.cluster_cursor = Some(ElementCursor::new(segment.children())?);
            if initial.subpacket_count != 0 {
                st.lacing = initial.lacing;
                st.buffer = initial.buffer;
                st.subpacket_count = initial.subpacket_count;
                st.subpacket_index = 0;
            }
            streams.push(info);
            state.push(st);
        }

        Ok(Self { streams, state })
    }

    /// The number of tracks this file declares.
    pub fn num_streams(&self) -> usize {
        self.streams.len()
    }

    /// Metadata for track `i`.
    ///
    /// # Panics
    /// Panics if `i >= num_streams()`, matching the original's "track index
    /// is always in range" calling convention.
    pub fn stream_info(&self, i: usize) -> &StreamInfo {
        &self.streams[i]
    }

    /// Read the next packet for track `i`, or `Ok(None)` at end of stream.
    pub fn read_data(&mut self, i: usize) -> Result<Option<Packet<'_>>> {
        let track_number = self.streams[i].track_number;
        let default_duration = self.streams[i].default_duration;
        let state = &mut self.state[i];

        if state.subpacket_index >= state.subpacket_count {
            if !read_block(state, track_number, default_duration)? {
                return Ok(None);
            }
        }

        let ranges = lacing::offsets(state.lacing, &state.buffer, state.subpacket_count)?;
        let (start, end) = *ranges
            .get(state.subpacket_index)
            .ok_or(Error::MalformedLacingData)?;
        let packet = Packet {
            timecode: state.block_timecode,
            duration: state.block_duration,
            data: &state.buffer[start..end],
        };
        state.subpacket_index += 1;
        Ok(Some(packet))
    }
}

/// Advance `state` to the next Block belonging to `track_number`, filling
/// `state.buffer` with its data section. Returns `false` at end of stream.
///
/// Invariant maintained across calls: whenever `state.block_cursor` is
/// `Some`, it is already positioned (via `until`) on the next candidate
/// `BlockGroup`/`SimpleBlock`, or at the end of the current Cluster. A fresh
/// cursor from `advance_cluster` satisfies this directly; this function
/// re-establishes it before returning or looping, so the top of the loop
/// never needs to guess whether an extra `advance()` is owed.
fn read_block(state: &mut StreamState, track_number: u64, default_duration: u64) -> Result<bool> {
    loop {
        if state.block_cursor.is_none() && !advance_cluster(state)? {
            return Ok(false);
        }

        let block_cursor = state.block_cursor.as_mut().unwrap();
        if block_cursor.is_end() {
            if !advance_cluster(state)? {
                return Ok(false);
            }
            continue;
        }

        let current = block_cursor.current().cloned().unwrap();
        let (block, duration) = if current.id == ids::BLOCK_GROUP {
            let mut children = ElementCursor::new(current.children())?;
            children.until(&[ids::BLOCK_DURATION])?;
            let duration = match children.current() {
                Some(d) => read_uint(&mut d.payload.clone(), d.size)?,
                None => default_duration,
            };
            let mut block_children = ElementCursor::new(current.children())?;
            block_children.until(&[ids::BLOCK])?;
            let block = block_children
                .current()
                .cloned()
                .ok_or(Error::MissingElement(ids::BLOCK))?;
            (block, duration)
        } else {
            (current, default_duration)
        };

        let mut payload = block.payload.clone();
        let (this_track, _) = read_vint(&mut payload)?;

        // Move past this candidate now, so the invariant holds for the next
        // call regardless of whether this one belongs to `track_number`.
        let block_cursor = state.block_cursor.as_mut().unwrap();
        block_cursor.advance()?;
        block_cursor.until(&[ids::BLOCK_GROUP, ids::SIMPLE_BLOCK])?;

        if this_track != track_number {
            trace!("block belongs to track {this_track}, skipping for track {track_number}");
            continue;
        }

        let time_offset = read_i16(&mut payload)?;
        state.block_timecode = state.cluster_timecode + time_offset as i64;
        state.block_duration = duration;

        let flags = payload.read_u8()?;
        state.lacing = Lacing::from_flag_bits((flags & 0b0000_0110) >> 1)?;

        if state.lacing == Lacing::Ebml {
            return Err(Error::EbmlLacingUnsupported);
        }

        if state.lacing != Lacing::None {
            let frame_count = payload.read_u8()? as usize;
            state.subpacket_count = frame_count + 1;
        } else {
            state.subpacket_count = 1;
        }
        state.subpacket_index = 0;

        let remaining = payload.remaining() as usize;
        state.buffer.resize(remaining, 0);
        payload.read_exact(&mut state.buffer)?;

        return Ok(true);
    }
}

/// Move `state` on to the next Cluster, reading its base `Timecode` and
/// seeding the block cursor positioned on the Cluster's first
/// `BlockGroup`/`SimpleBlock` (or at its end, if it has none). Returns
/// `false` once no further Cluster exists.
fn advance_cluster(state: &mut StreamState) -> Result<bool> {
    let cluster_cursor = state.cluster_cursor.as_mut().unwrap();
    if !state.first_cluster {
        cluster_cursor.advance()?;
    }
    state.first_cluster = false;
    cluster_cursor.until(&[ids::CLUSTER])?;

    let Some(cluster) = cluster_cursor.current().cloned() else {
        state.block_cursor = None;
        return Ok(false);
    };

    let mut timecode_cursor = ElementCursor::new(cluster.children())?;
    timecode_cursor.until(&[ids::TIMECODE])?;
    state.cluster_timecode = match timecode_cursor.current() {
        Some(tc) => read_uint(&mut tc.payload.clone(), tc.size)? as i64,
        None => 0,
    };

    let mut block_cursor = ElementCursor::new(cluster.children())?;
    block_cursor.until(&[ids::BLOCK_GROUP, ids::SIMPLE_BLOCK])?;
    state.block_cursor = Some(block_cursor);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ReadSeekSource;

    fn push_size(buf: &mut Vec<u8>, size: usize) {
        assert!(size < 127);
        buf.push(0x80 | size as u8);
    }

    fn ebml_header() -> Vec<u8> {
        let mut read_version = vec![0x42, 0xF7]; // EBMLReadVersion
        push_size(&mut read_version, 1);
        read_version.push(1);

        let mut doc_type = vec![0x42, 0x82];
        push_size(&mut doc_type, 4);
        doc_type.extend_from_slice(b"webm");

        let mut ebml_children = read_version;
        ebml_children.extend_from_slice(&doc_type);

        let mut ebml = vec![0x1A, 0x45, 0xDF, 0xA3];
        push_size(&mut ebml, ebml_children.len());
        ebml.extend_from_slice(&ebml_children);
        ebml
    }

    fn track_entry(codec_id: &[u8], track_number: u8) -> Vec<u8> {
        track_entry_with_private(codec_id, track_number, None)
    }

    fn track_entry_with_private(
        codec_id: &[u8],
        track_number: u8,
        codec_private: Option<&[u8]>,
    ) -> Vec<u8> {
        let mut entry = vec![];
        entry.extend_from_slice(&[0x86]); // CodecID, 1-byte id
        push_size(&mut entry, codec_id.len());
        entry.extend_from_slice(codec_id);

        entry.extend_from_slice(&[0x73, 0xC5]); // TrackUID
        push_size(&mut entry, 1);
        entry.push(track_number);

        entry.extend_from_slice(&[0xD7]); // TrackNumber
        push_size(&mut entry, 1);
        entry.push(track_number);

        if let Some(private) = codec_private {
            entry.extend_from_slice(&[0x20, 0x23, 0xA2]); // CodecPrivate
            push_size(&mut entry, private.len());
            entry.extend_from_slice(private);
        }

        let mut wrapped = vec![0xAE];
        push_size(&mut wrapped, entry.len());
        wrapped.extend_from_slice(&entry);
        wrapped
    }

    fn simple_block(track_number: u8, time_offset: i16, flags: u8, payload: &[u8]) -> Vec<u8> {
        let mut body = vec![0x80 | track_number];
        body.extend_from_slice(&time_offset.to_be_bytes());
        body.push(flags);
        body.extend_from_slice(payload);

        let mut block = vec![0xA3]; // SimpleBlock
        push_size(&mut block, body.len());
        block.extend_from_slice(&body);
        block
    }

    fn cluster(timecode: u64, blocks: &[u8]) -> Vec<u8> {
        let mut tc = vec![0xE7]; // Timecode
        push_size(&mut tc, 1);
        tc.push(timecode as u8);

        let mut body = tc;
        body.extend_from_slice(blocks);

        let mut cluster = vec![0x1F, 0x43, 0xB6, 0x75];
        push_size(&mut cluster, body.len());
        cluster.extend_from_slice(&body);
        cluster
    }

    fn single_track_file(track_number: u8, codec_id: &[u8], blocks: &[u8]) -> Vec<u8> {
        file_with_entry(track_entry(codec_id, track_number), blocks)
    }

    fn file_with_entry(entry: Vec<u8>, blocks: &[u8]) -> Vec<u8> {
        let mut tracks = vec![0x16, 0x54, 0xAE, 0x6B];
        push_size(&mut tracks, entry.len());
        tracks.extend_from_slice(&entry);

        let mut segment_body = tracks;
        segment_body.extend_from_slice(blocks);

        let mut segment = vec![0x18, 0x53, 0x80, 0x67];
        push_size(&mut segment, segment_body.len());
        segment.extend_from_slice(&segment_body);

        let mut file = ebml_header();
        file.extend_from_slice(&segment);
        file
    }

    #[test]
    fn single_track_single_block_roundtrip() {
        let block = simple_block(1, 0, 0x00, &[0x9D, 0x01, 0x2A]);
        let file = single_track_file(1, ids::CODEC_ID_VP8, &cluster(0, &block));

        let src = ReadSeekSource::shared(std::io::Cursor::new(file));
        let mut parser = Parser::open(src).unwrap();
        assert_eq!(parser.num_streams(), 1);
        assert_eq!(parser.stream_info(0).stream_type, crate::tracks::StreamType::Vp8);

        let packet = parser.read_data(0).unwrap().unwrap();
        assert_eq!(packet.data, &[0x9D, 0x01, 0x2A]);
        assert_eq!(packet.timecode, 0);

        assert!(parser.read_data(0).unwrap().is_none());
    }

    #[test]
    fn fixed_lacing_three_frames() {
        let payload: Vec<u8> = (0..12).collect();
        // flags: lacing bits 10 (fixed) at bits 1-2 -> 0b100 = 0x04
        let block = simple_block(1, 0, 0x04, &{
            let mut b = vec![0x02]; // frame count - 1 = 2 => 3 frames
            b.extend_from_slice(&payload);
            b
        });
        let file = single_track_file(1, ids::CODEC_ID_VP8, &cluster(0, &block));
        let src = ReadSeekSource::shared(std::io::Cursor::new(file));
        let mut parser = Parser::open(src).unwrap();

        let p0 = parser.read_data(0).unwrap().unwrap();
        assert_eq!(p0.data, &payload[0..4]);
        let p1 = parser.read_data(0).unwrap().unwrap();
        assert_eq!(p1.data, &payload[4..8]);
        let p2 = parser.read_data(0).unwrap().unwrap();
        assert_eq!(p2.data, &payload[8..12]);
        assert!(parser.read_data(0).unwrap().is_none());
    }

    #[test]
    fn empty_segment_yields_end_of_stream_immediately() {
        let file = single_track_file(1, ids::CODEC_ID_VP8, &[]);
        let src = ReadSeekSource::shared(std::io::Cursor::new(file));
        let mut parser = Parser::open(src).unwrap();
        assert!(parser.read_data(0).unwrap().is_none());
    }

    #[test]
    fn reserved_ebml_lacing_is_rejected() {
        let block = simple_block(1, 0, 0x06, &[0x00]);
        let file = single_track_file(1, ids::CODEC_ID_VP8, &cluster(0, &block));
        let src = ReadSeekSource::shared(std::io::Cursor::new(file));
        let mut parser = Parser::open(src).unwrap();
        assert!(matches!(
            parser.read_data(0),
            Err(Error::EbmlLacingUnsupported)
        ));
    }

    #[test]
    fn cluster_without_timecode_still_yields_its_block() {
        // Timecode is optional (defaults to 0); the Cluster here begins
        // directly with a SimpleBlock and must not be skipped.
        let block = simple_block(1, 7, 0x00, &[0xAB, 0xCD]);
        let mut cluster = vec![0x1F, 0x43, 0xB6, 0x75];
        push_size(&mut cluster, block.len());
        cluster.extend_from_slice(&block);

        let file = single_track_file(1, ids::CODEC_ID_VP8, &cluster);
        let src = ReadSeekSource::shared(std::io::Cursor::new(file));
        let mut parser = Parser::open(src).unwrap();

        let packet = parser.read_data(0).unwrap().unwrap();
        assert_eq!(packet.data, &[0xAB, 0xCD]);
        assert_eq!(packet.timecode, 7);
        assert!(parser.read_data(0).unwrap().is_none());
    }

    #[test]
    fn theora_codec_private_preseed_is_delivered_before_cluster_blocks() {
        // CodecPrivate = [frameCount=0] preseeds one empty Xiph subpacket,
        // which must come out of read_data before anything in the Cluster.
        let entry = track_entry_with_private(ids::CODEC_ID_THEORA, 1, Some(&[0x00]));
        let block = simple_block(1, 0, 0x00, &[0x11, 0x22]);
        let file = file_with_entry(entry, &cluster(5, &block));

        let src = ReadSeekSource::shared(std::io::Cursor::new(file));
        let mut parser = Parser::open(src).unwrap();

        let preseed = parser.read_data(0).unwrap().unwrap();
        assert!(preseed.data.is_empty());

        let real = parser.read_data(0).unwrap().unwrap();
        assert_eq!(real.data, &[0x11, 0x22]);
        assert_eq!(real.timecode, 5);

        assert!(parser.read_data(0).unwrap().is_none());
    }

    #[test]
    fn missing_tracks_element_is_rejected() {
        let mut segment = vec![0x18, 0x53, 0x80, 0x67];
        push_size(&mut segment, 0);
        let mut file = ebml_header();
        file.extend_from_slice(&segment);
        let src = ReadSeekSource::shared(std::io::Cursor::new(file));
        assert!(matches!(
            Parser::open(src),
            Err(Error::MissingElement(id)) if id == ids::TRACKS
        ));
    }
}
