//! JPEG marker stream reader. Splits a JFIF/EXIF stream into marker segments,
//! standalone markers and the bytes between them (entropy-coded scan data).
//! See ITU T.81 Annex B.

use crate::result::StreamEnd;

/// Start of Image.
pub const SOI: [u8; 2] = [0xFF, 0xD8];

pub const MARKER_PREFIX: u8 = 0xFF;
pub const MARKER_EOI: u8 = 0xD9;
pub const MARKER_SOS: u8 = 0xDA;
pub const MARKER_COM: u8 = 0xFE;
/// APP0..=APP15.
pub const MARKER_APP0: u8 = 0xE0;
pub const MARKER_APP15: u8 = 0xEF;

/// Check if data starts with SOI.
#[inline]
pub fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= SOI.len() && data[..SOI.len()] == SOI
}

/// Markers that carry no length field: stuffing (0x00), TEM (0x01), RST0-7 and EOI.
#[inline]
pub fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x00 | 0x01 | 0xD0..=0xD7 | MARKER_EOI)
}

/// APPn and COM: the marker classes that carry metadata only.
#[inline]
pub fn is_metadata_marker(marker: u8) -> bool {
    (MARKER_APP0..=MARKER_APP15).contains(&marker) || marker == MARKER_COM
}

/// Short mnemonic for a marker byte (e.g. 0xE1 -> "APP1").
pub fn marker_name(marker: u8) -> String {
    match marker {
        0x00 => "STUFF".to_string(),
        0x01 => "TEM".to_string(),
        0xC4 => "DHT".to_string(),
        0xC8 => "JPG".to_string(),
        0xCC => "DAC".to_string(),
        0xC0..=0xCF => format!("SOF{}", marker - 0xC0),
        0xD0..=0xD7 => format!("RST{}", marker - 0xD0),
        0xD8 => "SOI".to_string(),
        MARKER_EOI => "EOI".to_string(),
        MARKER_SOS => "SOS".to_string(),
        0xDB => "DQT".to_string(),
        0xDC => "DNL".to_string(),
        0xDD => "DRI".to_string(),
        0xDE => "DHP".to_string(),
        0xDF => "EXP".to_string(),
        MARKER_APP0..=MARKER_APP15 => format!("APP{}", marker - MARKER_APP0),
        MARKER_COM => "COM".to_string(),
        _ => format!("0x{:02X}", marker),
    }
}

/// A length-prefixed marker segment, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Offset of the 0xFF prefix.
    pub offset: usize,
    pub marker: u8,
    /// Length field value (includes its own 2 bytes).
    pub length: u16,
    /// Marker, length field and payload (2 + length bytes).
    pub raw: &'a [u8],
}

impl Segment<'_> {
    /// Payload after the length field.
    pub fn payload(&self) -> &[u8] {
        &self.raw[4..]
    }

    /// On-wire size (2 + length).
    #[inline]
    pub fn size(&self) -> usize {
        self.raw.len()
    }

    pub fn name(&self) -> String {
        marker_name(self.marker)
    }
}

/// One piece of a JPEG stream after SOI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Bytes that do not start a marker: entropy-coded data with its stuffed
    /// 0xFF 0x00 pairs, or 0xFF fill bytes before a marker.
    Data { offset: usize, bytes: &'a [u8] },
    /// Marker without a length field (RSTn, TEM, EOI).
    Standalone { offset: usize, marker: u8 },
    Segment(Segment<'a>),
}

/// Walks a JPEG stream from just after SOI. Stops after EOI or at the first
/// segment that does not fit in the remaining input.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    data: &'a [u8],
    pos: usize,
    end: StreamEnd,
}

/// Iterate over tokens starting right after the 2-byte SOI.
/// Does not verify SOI; see [`is_jpeg`].
pub fn segments(data: &[u8]) -> Segments<'_> {
    Segments {
        data,
        pos: SOI.len(),
        end: StreamEnd::Open,
    }
}

impl<'a> Segments<'a> {
    /// How the walk ended; [`StreamEnd::Open`] until the iterator is exhausted.
    pub fn end(&self) -> StreamEnd {
        self.end
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn finish(&mut self, end: StreamEnd) -> Option<Token<'a>> {
        self.end = end;
        None
    }

    /// Advance over bytes that are not a marker. Returns the end of the run.
    fn scan_data(&self, mut pos: usize) -> usize {
        let data = self.data;
        while pos < data.len() {
            if data[pos] != MARKER_PREFIX {
                pos += 1;
                continue;
            }
            match data.get(pos + 1).copied() {
                // Stuffed 0xFF: literal data byte, never a marker.
                Some(0x00) => pos += 2,
                // Fill byte; the marker starts at the next 0xFF.
                Some(MARKER_PREFIX) => pos += 1,
                _ => break,
            }
        }
        pos
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end != StreamEnd::Open {
            return None;
        }
        let data = self.data;
        let pos = self.pos;

        let run_end = self.scan_data(pos);
        if run_end > pos {
            self.pos = run_end;
            return Some(Token::Data {
                offset: pos,
                bytes: &data[pos..run_end],
            });
        }

        if pos >= data.len() {
            return self.finish(StreamEnd::Exhausted);
        }
        // scan_data stops only on 0xFF followed by a marker byte, or a lone trailing 0xFF.
        let Some(&marker) = data.get(pos + 1) else {
            return self.finish(StreamEnd::Truncated { offset: pos });
        };

        if is_standalone(marker) {
            self.pos = pos + 2;
            if marker == MARKER_EOI {
                self.end = StreamEnd::Terminal;
            }
            return Some(Token::Standalone {
                offset: pos,
                marker,
            });
        }

        if pos + 4 > data.len() {
            return self.finish(StreamEnd::Truncated { offset: pos });
        }
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]);
        let seg_end = pos + 2 + length as usize;
        if length < 2 || seg_end > data.len() {
            return self.finish(StreamEnd::Truncated { offset: pos });
        }
        self.pos = seg_end;
        Some(Token::Segment(Segment {
            offset: pos,
            marker,
            length,
            raw: &data[pos..seg_end],
        }))
    }
}
