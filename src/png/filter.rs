//! PNG chunk filter.

use crate::png::parser::{chunks, is_png, is_retained, IHDR, PNG_SIGNATURE};
use crate::result::{Action, StreamEnd, StripError, StripReport};
use crate::ImageFormat;

/// Copy the signature and every retained chunk of `data` into `out`, in input order.
///
/// Ancillary chunks are skipped; retained chunks are copied byte for byte, CRC included.
/// The walk stops after IEND. A truncated trailing chunk ends the walk without error.
pub(crate) fn filter_png(
    data: &[u8],
    out: &mut Vec<u8>,
    report: &mut StripReport,
) -> Result<(), StripError> {
    if !is_png(data) {
        return Err(StripError::InvalidContainer {
            format: "PNG",
            reason: "missing PNG signature".to_string(),
        });
    }
    let start = out.len();
    out.extend_from_slice(&data[..PNG_SIGNATURE.len()]);

    let mut walker = chunks(data);
    let mut first = true;
    for chunk in walker.by_ref() {
        if first && chunk.tag != IHDR {
            report.warn(format!("First chunk is {} instead of IHDR", chunk.name()));
        }
        first = false;
        if is_retained(&chunk.tag) {
            out.extend_from_slice(chunk.raw);
            report.record(chunk.name(), chunk.offset, chunk.size(), Action::Kept);
        } else {
            tracing::debug!(chunk = %chunk.name(), offset = chunk.offset, size = chunk.size(), "dropping PNG chunk");
            report.record(chunk.name(), chunk.offset, chunk.size(), Action::Dropped);
        }
    }

    match walker.end() {
        StreamEnd::Terminal | StreamEnd::Open => {}
        StreamEnd::Exhausted => report.warn("No IEND chunk before end of input".to_string()),
        StreamEnd::Truncated { offset } => report.warn(format!(
            "Truncated chunk at offset {}; {} trailing bytes ignored",
            offset,
            data.len() - offset
        )),
    }
    report.bytes_out = out.len() - start;
    Ok(())
}

/// Strip all ancillary chunks from a PNG.
///
/// # Errors
/// * `InvalidContainer` - if `data` does not start with the PNG signature
pub fn strip_png(data: &[u8]) -> Result<Vec<u8>, StripError> {
    let mut out = Vec::with_capacity(data.len());
    let mut report = StripReport::new(ImageFormat::Png, data.len());
    filter_png(data, &mut out, &mut report)?;
    Ok(out)
}
