mod format;
mod input;
mod output;

pub use format::DocumentFormat;
pub use input::{decode_document_str, parse_document_str};
pub use output::{OutputDestination, OutputOptions, emit, serialize_document};
