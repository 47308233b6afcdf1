//! PNG chunk stream reader: signature check and a borrowing chunk walker.
//! See https://www.w3.org/TR/png/#5Chunk-layout

use crate::result::StreamEnd;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Length (4) + type (4) + CRC (4).
pub const CHUNK_OVERHEAD: usize = 12;
/// Length (4) + type (4).
const CHUNK_HEADER_LEN: usize = 8;

pub const IHDR: [u8; 4] = *b"IHDR";
pub const PLTE: [u8; 4] = *b"PLTE";
pub const IDAT: [u8; 4] = *b"IDAT";
pub const IEND: [u8; 4] = *b"IEND";

/// Chunk types needed to decode pixel data. Everything else is ancillary.
pub const RETAINED_CHUNKS: [[u8; 4]; 4] = [IHDR, PLTE, IDAT, IEND];

/// Check if data starts with the PNG signature.
#[inline]
pub fn is_png(data: &[u8]) -> bool {
    data.len() >= PNG_SIGNATURE.len() && data[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
}

/// True for IHDR, PLTE, IDAT and IEND.
#[inline]
pub fn is_retained(tag: &[u8; 4]) -> bool {
    RETAINED_CHUNKS.contains(tag)
}

#[inline]
fn read_u32_be(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// One chunk, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Offset of the length field.
    pub offset: usize,
    pub tag: [u8; 4],
    /// Payload (`length` bytes).
    pub data: &'a [u8],
    pub crc: u32,
    /// Whole chunk as it appears on the wire (12 + length bytes).
    pub raw: &'a [u8],
}

impl Chunk<'_> {
    /// Tag as text (e.g. "tEXt"); non-ASCII bytes are replaced.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }

    /// On-wire size (12 + length).
    #[inline]
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.tag == IEND
    }
}

/// Walks chunks after the signature. Stops after IEND or at the first
/// chunk that does not fit in the remaining input, including a length
/// field too large to address on this target.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    data: &'a [u8],
    pos: usize,
    end: StreamEnd,
}

/// Iterate over chunks starting right after the 8-byte signature.
/// Does not verify the signature; see [`is_png`].
pub fn chunks(data: &[u8]) -> Chunks<'_> {
    Chunks {
        data,
        pos: PNG_SIGNATURE.len(),
        end: StreamEnd::Open,
    }
}

impl<'a> Chunks<'a> {
    /// How the walk ended; [`StreamEnd::Open`] until the iterator is exhausted.
    pub fn end(&self) -> StreamEnd {
        self.end
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn finish(&mut self, end: StreamEnd) -> Option<Chunk<'a>> {
        self.end = end;
        None
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end != StreamEnd::Open {
            return None;
        }
        let pos = self.pos;
        let remaining = self.data.len().saturating_sub(pos);
        if remaining == 0 {
            return self.finish(StreamEnd::Exhausted);
        }
        if remaining < CHUNK_HEADER_LEN {
            return self.finish(StreamEnd::Truncated { offset: pos });
        }
        let Some(length) = read_u32_be(self.data, pos) else {
            return self.finish(StreamEnd::Truncated { offset: pos });
        };
        let tag = [
            self.data[pos + 4],
            self.data[pos + 5],
            self.data[pos + 6],
            self.data[pos + 7],
        ];
        let Some(size) = usize::try_from(length)
            .ok()
            .and_then(|l| l.checked_add(CHUNK_OVERHEAD))
        else {
            return self.finish(StreamEnd::Truncated { offset: pos });
        };
        if size > remaining {
            return self.finish(StreamEnd::Truncated { offset: pos });
        }
        let raw = &self.data[pos..pos + size];
        let data_end = size - 4;
        let crc = u32::from_be_bytes([
            raw[data_end],
            raw[data_end + 1],
            raw[data_end + 2],
            raw[data_end + 3],
        ]);
        let chunk = Chunk {
            offset: pos,
            tag,
            data: &raw[CHUNK_HEADER_LEN..data_end],
            crc,
            raw,
        };
        self.pos = pos + size;
        if chunk.is_terminal() {
            self.end = StreamEnd::Terminal;
        }
        Some(chunk)
    }
}
