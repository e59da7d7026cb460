//! Splits a laced Block's data section back into individual codec
//! subpackets.

use crate::error::{Error, Result};

/// The three lacing modes a Block's flags byte can encode, plus the reserved
/// EBML mode this crate does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lacing {
    /// No lacing: the whole data section is a single subpacket.
    #[default]
    None,
    /// Xiph lacing: Ogg-style size prefixes summed from runs of `0xFF`.
    Xiph,
    /// Fixed-size lacing: the data section divides evenly by the subpacket
    /// count.
    Fixed,
    /// EBML lacing (reserved, not implemented).
    Ebml,
}

impl Lacing {
    /// Decode the two lacing bits (`(flags & 0x06) >> 1`) from a Block's
    /// flags byte.
    pub fn from_flag_bits(bits: u8) -> Result<Self> {
        match bits & 0b11 {
            0b00 => Ok(Lacing::None),
            0b01 => Ok(Lacing::Xiph),
            0b10 => Ok(Lacing::Fixed),
            0b11 => Ok(Lacing::Ebml),
            _ => unreachable!(),
        }
    }
}

/// Split `data` into `subpacket_count` slices according to `lacing`.
///
/// `Lacing::Ebml` always fails: the reserved mode is not implemented.
/// `Lacing::None` requires `subpacket_count == 1`.
pub fn split(lacing: Lacing, data: &[u8], subpacket_count: usize) -> Result<Vec<&[u8]>> {
    offsets(lacing, data, subpacket_count)
        .map(|offs| offs.into_iter().map(|(s, e)| &data[s..e]).collect())
}

/// Compute `(start, end)` byte ranges within `data` for each subpacket,
/// without borrowing `data` in the result. Callers index into their own
/// buffer with these ranges, which is how the demultiplexer avoids holding a
/// borrow of a track's buffer across the call that would otherwise need to
/// mutate it again next time.
pub fn offsets(lacing: Lacing, data: &[u8], subpacket_count: usize) -> Result<Vec<(usize, usize)>> {
    match lacing {
        Lacing::None => Ok(vec![(0, data.len())]),
        Lacing::Fixed => offsets_fixed(data, subpacket_count),
        Lacing::Xiph => offsets_xiph(data, subpacket_count),
        Lacing::Ebml => Err(Error::EbmlLacingUnsupported),
    }
}

fn offsets_fixed(data: &[u8], count: usize) -> Result<Vec<(usize, usize)>> {
    if count == 0 {
        return Ok(vec![]);
    }
    if data.len() % count != 0 {
        return Err(Error::NonDividingFixedLacing {
            block_size: data.len(),
            count,
        });
    }
    let size = data.len() / count;
    Ok((0..count).map(|i| (i * size, (i + 1) * size)).collect())
}

fn offsets_xiph(data: &[u8], count: usize) -> Result<Vec<(usize, usize)>> {
    if count == 0 {
        return Ok(vec![]);
    }
    if count == 1 {
        return Ok(vec![(0, data.len())]);
    }

    // Walk `count - 1` Xiph-coded sizes: runs of 0xFF summed, terminated by
    // the first byte < 255.
    let mut sizes = Vec::with_capacity(count - 1);
    let mut cursor = 0usize;
    for _ in 0..count - 1 {
        let mut size = 0usize;
        loop {
            let byte = *data.get(cursor).ok_or(Error::MalformedLacingData)?;
            cursor += 1;
            size += byte as usize;
            if byte != 0xFF {
                break;
            }
        }
        sizes.push(size);
    }

    if cursor > data.len() {
        return Err(Error::MalformedLacingData);
    }
    let laced_start = cursor;
    let mut out = Vec::with_capacity(count);
    let mut start = laced_start;
    for size in sizes {
        let end = start.checked_add(size).ok_or(Error::MalformedLacingData)?;
        if end > data.len() {
            return Err(Error::MalformedLacingData);
        }
        out.push((start, end));
        start = end;
    }
    if start > data.len() {
        return Err(Error::MalformedLacingData);
    }
    out.push((start, data.len()));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_lacing_returns_whole_buffer() {
        let data = [1, 2, 3, 4];
        let out = split(Lacing::None, &data, 1).unwrap();
        assert_eq!(out, vec![&data[..]]);
    }

    #[test]
    fn fixed_lacing_divides_evenly() {
        let data = [0u8; 12];
        let out = split(Lacing::Fixed, &data, 3).unwrap();
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|s| s.len() == 4));
    }

    #[test]
    fn fixed_lacing_rejects_remainder() {
        let data = [0u8; 10];
        assert!(matches!(
            split(Lacing::Fixed, &data, 3),
            Err(Error::NonDividingFixedLacing { .. })
        ));
    }

    #[test]
    fn xiph_lacing_three_frames() {
        // sizes 257, 3, remainder; 0xFF 0x02 terminates at 0x03 for size=3
        let mut data = vec![0xFF, 0x02, 0x03];
        data.extend(std::iter::repeat_n(1u8, 257));
        data.extend(std::iter::repeat_n(2u8, 3));
        data.extend(std::iter::repeat_n(3u8, 5));

        let out = split(Lacing::Xiph, &data, 3).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].len(), 257);
        assert_eq!(out[1].len(), 3);
        assert_eq!(out[2].len(), 5);
    }

    #[test]
    fn xiph_lacing_single_frame_is_remainder() {
        let data = [9u8; 10];
        let out = split(Lacing::Xiph, &data, 1).unwrap();
        assert_eq!(out, vec![&data[..]]);
    }

    #[test]
    fn xiph_lacing_truncated_size_prefix_is_malformed() {
        let data = [0xFFu8]; // claims more bytes than present
        assert!(matches!(
            split(Lacing::Xiph, &data, 2),
            Err(Error::MalformedLacingData)
        ));
    }

    #[test]
    fn ebml_lacing_is_unsupported() {
        assert!(matches!(
            split(Lacing::Ebml, &[], 2),
            Err(Error::EbmlLacingUnsupported)
        ));
    }

    #[test]
    fn flag_bits_map_to_modes() {
        assert_eq!(Lacing::from_flag_bits(0b00).unwrap(), Lacing::None);
        assert_eq!(Lacing::from_flag_bits(0b01).unwrap(), Lacing::Xiph);
        assert_eq!(Lacing::from_flag_bits(0b10).unwrap(), Lacing::Fixed);
        assert_eq!(Lacing::from_flag_bits(0b11).unwrap(), Lacing::Ebml);
    }
}
