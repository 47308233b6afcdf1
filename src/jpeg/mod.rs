//! JPEG metadata stripping: drops APP0-APP15 and COM segments, keeps every other
//! segment plus the entropy-coded scan data byte for byte.

mod filter;
mod parser;

pub use filter::strip_jpeg;
pub(crate) use filter::filter_jpeg;
pub use parser::{
    is_jpeg, is_metadata_marker, is_standalone, marker_name, segments, Segment, Segments, Token,
    MARKER_APP0, MARKER_APP15, MARKER_COM, MARKER_EOI, MARKER_SOS, SOI,
};
