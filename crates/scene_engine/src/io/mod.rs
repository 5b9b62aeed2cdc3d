//! Binary serialization primitives
//!
//! Scene files and component payloads are written through [`FileStream`],
//! a little-endian record stream buffered in memory and committed to disk
//! in one write.

mod file_stream;

pub use file_stream::{FileStream, StreamError, StreamResult, MAX_SEQUENCE_LENGTH, MAX_STRING_LENGTH};
