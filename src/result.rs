//! Strip result types: cleaned output, per-record report, options and the error taxonomy.

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::ImageFormat;

/// Default ceiling on input size (100 MiB).
pub const MAX_INPUT_SIZE: usize = 100 * 1024 * 1024;

/// Prefix added to the original filename of a cleaned image.
pub const CLEANED_PREFIX: &str = "cleaned_";

/// Name used when the caller supplies no filename.
pub const DEFAULT_FILE_NAME: &str = "image";

/// Options for a strip call.
#[derive(Debug, Clone)]
pub struct StripOptions {
    /// Reject inputs larger than this (default: [`MAX_INPUT_SIZE`]). `None` disables the check.
    pub max_input_size: Option<usize>,
    /// Prefix for the suggested output filename (default: [`CLEANED_PREFIX`]).
    pub file_name_prefix: String,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            max_input_size: Some(MAX_INPUT_SIZE),
            file_name_prefix: CLEANED_PREFIX.to_string(),
        }
    }
}

impl StripOptions {
    /// Options with no input size limit.
    pub fn unbounded() -> Self {
        Self {
            max_input_size: None,
            ..Default::default()
        }
    }
}

/// What happened to one chunk or segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Action {
    Kept,
    Dropped,
}

/// How a chunk or segment walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum StreamEnd {
    /// Walk still in progress.
    Open,
    /// Terminal record reached (IEND / EOI).
    Terminal,
    /// Input ran out on a record boundary without a terminal record.
    Exhausted,
    /// A record header or body at this offset extends past the input.
    Truncated { offset: usize },
}

/// One chunk (PNG) or marker segment (JPEG) seen during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RecordEntry {
    /// Chunk tag (e.g. "tEXt") or marker name (e.g. "APP1").
    pub name: String,
    /// Offset of the record in the input.
    pub offset: usize,
    /// On-wire size in bytes (12 + length for PNG, 2 + length for JPEG).
    pub size: usize,
    pub action: Action,
}

/// Per-call summary of the container walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StripReport {
    /// Format label ("PNG" or "JPEG").
    pub format: String,
    /// Records in input order. Scan data and standalone markers are not listed.
    pub records: Vec<RecordEntry>,
    /// Structural anomalies tolerated during the walk (truncation, missing terminator).
    pub warnings: Vec<String>,
    pub bytes_in: usize,
    pub bytes_out: usize,
}

impl StripReport {
    pub(crate) fn new(format: ImageFormat, bytes_in: usize) -> Self {
        Self {
            format: format.label().to_string(),
            bytes_in,
            ..Default::default()
        }
    }

    pub(crate) fn record(&mut self, name: impl Into<String>, offset: usize, size: usize, action: Action) {
        self.records.push(RecordEntry {
            name: name.into(),
            offset,
            size,
            action,
        });
    }

    pub(crate) fn warn(&mut self, message: String) {
        tracing::warn!(format = %self.format, "{}", message);
        self.warnings.push(message);
    }

    /// Records that were dropped.
    pub fn dropped(&self) -> impl Iterator<Item = &RecordEntry> {
        self.records.iter().filter(|r| r.action == Action::Dropped)
    }

    /// Records that were kept.
    pub fn kept(&self) -> impl Iterator<Item = &RecordEntry> {
        self.records.iter().filter(|r| r.action == Action::Kept)
    }

    /// Total bytes removed from the input.
    pub fn bytes_removed(&self) -> usize {
        self.bytes_in.saturating_sub(self.bytes_out)
    }
}

/// A successfully cleaned image.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Cleaned {
    /// Cleaned container bytes.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: Vec<u8>,
    pub format: ImageFormat,
    /// Canonical media type ("image/png" or "image/jpeg").
    pub media_type: &'static str,
    /// Suggested filename for the cleaned file.
    pub file_name: String,
    pub report: StripReport,
}

/// Error category, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ErrorKind {
    InputEmpty,
    InputTooLarge,
    InvalidContainer,
    UnsupportedFormat,
    Internal,
}

impl ErrorKind {
    /// Wire name (e.g. "InvalidContainer").
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InputEmpty => "InputEmpty",
            ErrorKind::InputTooLarge => "InputTooLarge",
            ErrorKind::InvalidContainer => "InvalidContainer",
            ErrorKind::UnsupportedFormat => "UnsupportedFormat",
            ErrorKind::Internal => "Internal",
        }
    }
}

/// Errors returned by the strip entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StripError {
    /// No bytes supplied.
    #[error("No image data supplied")]
    InputEmpty,

    /// Input exceeds the configured ceiling.
    #[error("Input size {size} exceeds maximum allowed size {max_size}")]
    InputTooLarge { size: usize, max_size: usize },

    /// Leading signature does not match the container.
    #[error("Not a valid {format} file: {reason}")]
    InvalidContainer { format: &'static str, reason: String },

    /// Sniffing found neither PNG nor JPEG.
    #[error("Unsupported format: only PNG and JPEG images can be processed")]
    UnsupportedFormat,

    /// Unexpected failure during traversal.
    #[error("Internal error while processing image: {reason}")]
    Internal { reason: String },
}

impl StripError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StripError::InputEmpty => ErrorKind::InputEmpty,
            StripError::InputTooLarge { .. } => ErrorKind::InputTooLarge,
            StripError::InvalidContainer { .. } => ErrorKind::InvalidContainer,
            StripError::UnsupportedFormat => ErrorKind::UnsupportedFormat,
            StripError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default() {
        let o = StripOptions::default();
        assert_eq!(o.max_input_size, Some(MAX_INPUT_SIZE));
        assert_eq!(o.file_name_prefix, "cleaned_");
    }

    #[test]
    fn options_unbounded() {
        let o = StripOptions::unbounded();
        assert_eq!(o.max_input_size, None);
        assert_eq!(o.file_name_prefix, "cleaned_");
    }

    #[test]
    fn unsupported_message_names_formats() {
        let msg = StripError::UnsupportedFormat.to_string();
        assert!(msg.contains("PNG") && msg.contains("JPEG"));
        assert_eq!(StripError::UnsupportedFormat.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn report_bytes_removed() {
        let mut r = StripReport::new(ImageFormat::Png, 100);
        r.bytes_out = 60;
        r.record("tEXt", 33, 40, Action::Dropped);
        r.record("IHDR", 8, 25, Action::Kept);
        assert_eq!(r.bytes_removed(), 40);
        assert_eq!(r.dropped().count(), 1);
        assert_eq!(r.kept().next().map(|e| e.name.as_str()), Some("IHDR"));
    }
}
