//! PNG metadata stripping: keeps IHDR, PLTE, IDAT and IEND, drops every ancillary chunk.
//! See https://www.w3.org/TR/png/#11Chunks

mod filter;
mod parser;

pub use filter::strip_png;
pub(crate) use filter::filter_png;
pub use parser::{
    chunks, is_png, is_retained, Chunk, Chunks, CHUNK_OVERHEAD, IDAT, IEND, IHDR, PLTE,
    PNG_SIGNATURE, RETAINED_CHUNKS,
};
