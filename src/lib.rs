//! # metastrip
//!
//! Library to remove metadata from PNG and JPEG files without re-encoding them.
//! The output is a byte-exact copy of the input minus the records that carry
//! metadata only; pixel data is never decompressed or recompressed.
//!
//! Designed for **request paths**: a single pass over an in-memory slice, one
//! output allocation sized to the input, no I/O and no shared state.
//!
//! ## Supported formats
//!
//! - **PNG**
//!   Keeps `IHDR`, `PLTE`, every `IDAT` and `IEND`. Every ancillary chunk (`tEXt`, `zTXt`,
//!   `iTXt`, `eXIf`, `tIME`, `iCCP`, `gAMA`, `tRNS`, ...) is dropped. Nothing after `IEND`
//!   is kept. CRCs are copied, not recomputed.
//!
//! - **JPEG**
//!   Drops APP0-APP15 (JFIF, EXIF, XMP, ICC, MPF, Photoshop IRB, ...) and COM segments.
//!   Frame, table and scan segments are kept, along with the entropy-coded data and its
//!   stuffed `0xFF 0x00` pairs. Nothing after EOI is kept.
//!
//! Truncated input is not an error: the walk stops at the last complete record and the
//! partial result is returned, with a warning in the [`StripReport`].
//!
//! ## Example
//!
//! ```no_run
//! use metastrip::{strip, ErrorKind};
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! match strip(&bytes, Some("image/jpeg"), Some("photo.jpg")) {
//!     Ok(cleaned) => std::fs::write(&cleaned.file_name, &cleaned.data).unwrap(),
//!     Err(e) if e.kind() == ErrorKind::UnsupportedFormat => eprintln!("{}", e),
//!     Err(e) => eprintln!("failed: {}", e),
//! }
//! ```
//!
//! ## Throughput
//!
//! - Use `strip(&[u8], ..)` on in-memory buffers; impose a size ceiling with
//!   [`StripOptions::max_input_size`].
//! - For many files, use [`strip_batch`], or enable the `parallel` feature and use
//!   `strip_batch_parallel` to spread the work over the rayon pool.

#[cfg(feature = "serde")]
pub mod http;
pub mod jpeg;
pub mod png;
mod result;

pub use jpeg::strip_jpeg;
pub use png::strip_png;
pub use result::{
    Action, Cleaned, ErrorKind, RecordEntry, StreamEnd, StripError, StripOptions, StripReport,
    CLEANED_PREFIX, DEFAULT_FILE_NAME, MAX_INPUT_SIZE,
};

/// Canonical media type for PNG output.
pub const PNG_MEDIA_TYPE: &str = "image/png";
/// Canonical media type for JPEG output.
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// Container format, decided once from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ImageFormat {
    Png,
    Jpeg,
    Unrecognized,
}

impl ImageFormat {
    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Unrecognized => "unknown",
        }
    }

    /// True if the leading bytes of `data` carry this format's signature.
    #[inline]
    pub fn matches(self, data: &[u8]) -> bool {
        match self {
            ImageFormat::Png => png::is_png(data),
            ImageFormat::Jpeg => jpeg::is_jpeg(data),
            ImageFormat::Unrecognized => false,
        }
    }
}

/// Detect the format from magic bytes only.
#[inline]
pub fn detect_format(data: &[u8]) -> ImageFormat {
    if png::is_png(data) {
        return ImageFormat::Png;
    }
    if jpeg::is_jpeg(data) {
        return ImageFormat::Jpeg;
    }
    ImageFormat::Unrecognized
}

/// Map a declared media type to a format. Case, surrounding whitespace and
/// parameters (`; charset=...`) are ignored; "image/jpg" is accepted as JPEG.
pub fn format_for_media_type(media_type: &str) -> Option<ImageFormat> {
    let normalized = media_type.trim().to_ascii_lowercase();
    let canonical = normalized.split(';').next().unwrap_or_default().trim();
    match canonical {
        PNG_MEDIA_TYPE => Some(ImageFormat::Png),
        JPEG_MEDIA_TYPE | "image/jpg" => Some(ImageFormat::Jpeg),
        _ => None,
    }
}

/// Classify `data`, taking a declared media type into account only when the
/// signature agrees with it. Never fails; unknown input is `Unrecognized`.
pub fn sniff(data: &[u8], declared: Option<&str>) -> ImageFormat {
    if let Some(claimed) = declared.and_then(format_for_media_type) {
        if claimed.matches(data) {
            return claimed;
        }
        tracing::debug!(
            declared = declared.unwrap_or_default(),
            "declared media type does not match signature, detecting from content"
        );
    }
    detect_format(data)
}

/// Suggested name for the cleaned file: prefix + last path component of `original`.
pub fn suggested_file_name(original: Option<&str>, prefix: &str) -> String {
    let base = original
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .map(|name| name.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
    format!("{}{}", prefix, base)
}

/// Strip metadata with default options.
///
/// See [`strip_with_options`].
#[inline]
pub fn strip(
    data: &[u8],
    media_type: Option<&str>,
    file_name: Option<&str>,
) -> Result<Cleaned, StripError> {
    strip_with_options(data, media_type, file_name, &StripOptions::default())
}

/// Sniff the container and strip its metadata records.
///
/// `media_type` is a hint only; the signature decides. `file_name` is used for
/// the suggested output name and nothing else.
///
/// # Errors
/// * `InputEmpty` - `data` is empty
/// * `InputTooLarge` - `data` exceeds `options.max_input_size`
/// * `UnsupportedFormat` - neither a PNG nor a JPEG signature
/// * `InvalidContainer` - signature check failed inside a filter
/// * `Internal` - part of the taxonomy for adapters; the PNG and JPEG filters never return it
pub fn strip_with_options(
    data: &[u8],
    media_type: Option<&str>,
    file_name: Option<&str>,
    options: &StripOptions,
) -> Result<Cleaned, StripError> {
    if data.is_empty() {
        return Err(StripError::InputEmpty);
    }
    if let Some(max_size) = options.max_input_size {
        if data.len() > max_size {
            return Err(StripError::InputTooLarge {
                size: data.len(),
                max_size,
            });
        }
    }

    let format = sniff(data, media_type);
    let mut out = Vec::with_capacity(data.len());
    let mut report = StripReport::new(format, data.len());
    let media_type = match format {
        ImageFormat::Png => {
            png::filter_png(data, &mut out, &mut report)?;
            PNG_MEDIA_TYPE
        }
        ImageFormat::Jpeg => {
            jpeg::filter_jpeg(data, &mut out, &mut report)?;
            JPEG_MEDIA_TYPE
        }
        ImageFormat::Unrecognized => {
            tracing::debug!(size = data.len(), "no PNG or JPEG signature");
            return Err(StripError::UnsupportedFormat);
        }
    };

    tracing::debug!(
        format = format.label(),
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        dropped = report.dropped().count(),
        "stripped metadata"
    );

    Ok(Cleaned {
        data: out,
        format,
        media_type,
        file_name: suggested_file_name(file_name, &options.file_name_prefix),
        report,
    })
}

/// Result of stripping one item in a batch.
#[derive(Debug, Clone)]
pub struct BatchItem<T> {
    pub id: T,
    pub result: Result<Cleaned, StripError>,
}

/// Strip many buffers in sequence. `id` is passed through and also used as the file name.
pub fn strip_batch<I, B>(items: I, options: &StripOptions) -> Vec<BatchItem<B>>
where
    I: IntoIterator<Item = (B, Vec<u8>)>,
    B: AsRef<str>,
{
    items
        .into_iter()
        .map(|(id, bytes)| {
            let result = strip_with_options(&bytes, None, Some(id.as_ref()), options);
            BatchItem { id, result }
        })
        .collect()
}

/// Strip many buffers on the rayon thread pool. Output order matches input order.
#[cfg(feature = "parallel")]
pub fn strip_batch_parallel<B>(items: Vec<(B, Vec<u8>)>, options: &StripOptions) -> Vec<BatchItem<B>>
where
    B: AsRef<str> + Send,
{
    use rayon::prelude::*;

    items
        .into_par_iter()
        .map(|(id, bytes)| {
            let result = strip_with_options(&bytes, None, Some(id.as_ref()), options);
            BatchItem { id, result }
        })
        .collect()
}
