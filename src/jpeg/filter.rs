//! JPEG segment filter.

use crate::jpeg::parser::{is_jpeg, is_metadata_marker, segments, Token, SOI};
use crate::result::{Action, StreamEnd, StripError, StripReport};
use crate::ImageFormat;

/// Copy SOI and every non-metadata part of `data` into `out`, in input order.
///
/// APPn and COM segments are skipped whole (marker, length and payload). Everything
/// else, including scan data and its stuffed 0xFF 0x00 pairs, is copied verbatim.
/// The walk stops after EOI. A truncated trailing segment ends the walk without error.
pub(crate) fn filter_jpeg(
    data: &[u8],
    out: &mut Vec<u8>,
    report: &mut StripReport,
) -> Result<(), StripError> {
    if !is_jpeg(data) {
        return Err(StripError::InvalidContainer {
            format: "JPEG",
            reason: "missing SOI marker".to_string(),
        });
    }
    let start = out.len();
    out.extend_from_slice(&SOI);

    let mut walker = segments(data);
    for token in walker.by_ref() {
        match token {
            Token::Data { bytes, .. } => out.extend_from_slice(bytes),
            Token::Standalone { offset, .. } => out.extend_from_slice(&data[offset..offset + 2]),
            Token::Segment(seg) if is_metadata_marker(seg.marker) => {
                tracing::debug!(marker = %seg.name(), offset = seg.offset, size = seg.size(), "dropping JPEG segment");
                report.record(seg.name(), seg.offset, seg.size(), Action::Dropped);
            }
            Token::Segment(seg) => {
                out.extend_from_slice(seg.raw);
                report.record(seg.name(), seg.offset, seg.size(), Action::Kept);
            }
        }
    }

    match walker.end() {
        StreamEnd::Terminal | StreamEnd::Open => {}
        StreamEnd::Exhausted => report.warn("No EOI marker before end of input".to_string()),
        StreamEnd::Truncated { offset } => report.warn(format!(
            "Truncated or malformed segment at offset {}; {} trailing bytes ignored",
            offset,
            data.len() - offset
        )),
    }
    report.bytes_out = out.len() - start;
    Ok(())
}

/// Strip APPn (EXIF, JFIF, XMP, ICC, ...) and COM segments from a JPEG.
///
/// # Errors
/// * `InvalidContainer` - if `data` does not start with SOI
pub fn strip_jpeg(data: &[u8]) -> Result<Vec<u8>, StripError> {
    let mut out = Vec::with_capacity(data.len());
    let mut report = StripReport::new(ImageFormat::Jpeg, data.len());
    filter_jpeg(data, &mut out, &mut report)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_exif_and_comment() {
        let data = [
            0xFF, 0xD8, // SOI
            0xFF, 0xE1, 0x00, 0x06, b'E', b'x', b'i', b'f', // APP1
            0xFF, 0xDB, 0x00, 0x03, 0x01, // DQT
            0xFF, 0xFE, 0x00, 0x04, b'h', b'i', // COM
            0xFF, 0xD9, // EOI
        ];
        let mut out = Vec::new();
        let mut report = StripReport::new(ImageFormat::Jpeg, data.len());
        filter_jpeg(&data, &mut out, &mut report).unwrap();
        assert_eq!(out, vec![0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x03, 0x01, 0xFF, 0xD9]);
        let dropped: Vec<&str> = report.dropped().map(|r| r.name.as_str()).collect();
        assert_eq!(dropped, vec!["APP1", "COM"]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn rejects_missing_soi() {
        let err = strip_jpeg(&[0xFF, 0xD9]).unwrap_err();
        assert!(matches!(err, StripError::InvalidContainer { format: "JPEG", .. }));
    }

    #[test]
    fn missing_eoi_warns() {
        let data = [0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x03, 0x01];
        let mut out = Vec::new();
        let mut report = StripReport::new(ImageFormat::Jpeg, data.len());
        filter_jpeg(&data, &mut out, &mut report).unwrap();
        assert_eq!(out, data);
        assert_eq!(report.warnings.len(), 1);
    }
}
