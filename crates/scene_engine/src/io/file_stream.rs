//! Little-endian binary record stream
//!
//! Writing appends to an in-memory buffer that [`FileStream::save`] commits
//! to disk. Reading loads the whole file up front so a truncated or corrupt
//! record is reported as a [`StreamError`] before any caller state changes.

use std::path::Path;
use thiserror::Error;

use crate::foundation::math::{Quat, Quaternion, Vec3, Vec4};

/// Upper bound on a single string record, in bytes
pub const MAX_STRING_LENGTH: u32 = 64 * 1024;

/// Upper bound on the element count of any length-prefixed sequence
pub const MAX_SEQUENCE_LENGTH: u32 = 1 << 20;

/// Errors produced while reading or writing a [`FileStream`]
#[derive(Error, Debug)]
pub enum StreamError {
    /// Underlying file access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of a record
    #[error("Unexpected end of stream: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the record required
        needed: usize,
        /// Bytes left in the stream
        remaining: usize,
    },

    /// A string record was not valid UTF-8
    #[error("Invalid UTF-8 in string record")]
    InvalidUtf8,

    /// A length prefix exceeded its sanity bound
    #[error("Length prefix {length} exceeds limit {limit}")]
    LengthOutOfRange {
        /// Length read from the stream
        length: u32,
        /// Largest accepted value
        limit: u32,
    },

    /// A value was decoded but is not meaningful for its field
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;

/// Binary reader / writer used for scene files and component payloads
#[derive(Debug, Default, Clone)]
pub struct FileStream {
    buffer: Vec<u8>,
    cursor: usize,
}

impl FileStream {
    /// Create an empty stream for writing
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a file and buffer its whole contents for reading
    pub fn open(path: impl AsRef<Path>) -> StreamResult<Self> {
        let buffer = std::fs::read(path.as_ref())?;
        Ok(Self::from_bytes(buffer))
    }

    /// Wrap raw bytes for reading
    pub fn from_bytes(buffer: Vec<u8>) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Commit everything written so far to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> StreamResult<()> {
        std::fs::write(path.as_ref(), &self.buffer)?;
        Ok(())
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consume the stream, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Bytes not yet consumed by reads
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Whether every byte has been read
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    // Writing

    /// Write raw bytes with no length prefix
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Write a boolean as one byte
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    /// Write a signed 32-bit integer
    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write an unsigned 32-bit integer
    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write a 32-bit float
    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write a length-prefixed UTF-8 string
    pub fn write_str(&mut self, value: &str) {
        self.write_len(value.len());
        self.write_bytes(value.as_bytes());
    }

    /// Write a count followed by each string
    pub fn write_strings(&mut self, values: &[String]) {
        self.write_len(values.len());
        for value in values {
            self.write_str(value);
        }
    }

    /// Write a 3-component vector
    pub fn write_vec3(&mut self, value: &Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    /// Write a 4-component vector
    pub fn write_vec4(&mut self, value: &Vec4) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
        self.write_f32(value.w);
    }

    /// Write a rotation as (x, y, z, w)
    pub fn write_quat(&mut self, value: &Quat) {
        let q = value.quaternion();
        self.write_f32(q.i);
        self.write_f32(q.j);
        self.write_f32(q.k);
        self.write_f32(q.w);
    }

    fn write_len(&mut self, len: usize) {
        // Lengths above u32 are rejected on read by the sanity bound anyway
        self.write_u32(u32::try_from(len).unwrap_or(u32::MAX));
    }

    // Reading

    /// Read exactly `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> StreamResult<&[u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(StreamError::UnexpectedEof { needed: len, remaining });
        }
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.buffer[start..self.cursor])
    }

    fn read_array<const N: usize>(&mut self) -> StreamResult<[u8; N]> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.read_bytes(N)?);
        Ok(bytes)
    }

    /// Read a boolean
    pub fn read_bool(&mut self) -> StreamResult<bool> {
        match self.read_array::<1>()?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StreamError::InvalidValue(format!("boolean byte {other}"))),
        }
    }

    /// Read a signed 32-bit integer
    pub fn read_i32(&mut self) -> StreamResult<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Read an unsigned 32-bit integer
    pub fn read_u32(&mut self) -> StreamResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Read a 32-bit float
    pub fn read_f32(&mut self) -> StreamResult<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a count written by a sequence writer, checked against `limit`
    pub fn read_count(&mut self, limit: u32) -> StreamResult<usize> {
        let length = self.read_u32()?;
        if length > limit {
            return Err(StreamError::LengthOutOfRange { length, limit });
        }
        Ok(length as usize)
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_str(&mut self) -> StreamResult<String> {
        let len = self.read_count(MAX_STRING_LENGTH)?;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| StreamError::InvalidUtf8)
    }

    /// Read a count followed by that many strings
    pub fn read_strings(&mut self) -> StreamResult<Vec<String>> {
        let count = self.read_count(MAX_SEQUENCE_LENGTH)?;
        // Each string needs at least its 4-byte prefix
        let mut values = Vec::with_capacity(count.min(self.remaining() / 4));
        for _ in 0..count {
            values.push(self.read_str()?);
        }
        Ok(values)
    }

    /// Read a 3-component vector
    pub fn read_vec3(&mut self) -> StreamResult<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Read a 4-component vector
    pub fn read_vec4(&mut self) -> StreamResult<Vec4> {
        Ok(Vec4::new(self.read_f32()?, self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Read a rotation written by [`FileStream::write_quat`]
    pub fn read_quat(&mut self) -> StreamResult<Quat> {
        let (x, y, z, w) = (self.read_f32()?, self.read_f32()?, self.read_f32()?, self.read_f32()?);
        let q = Quaternion::new(w, x, y, z);
        if !q.norm().is_finite() || q.norm() < f32::EPSILON {
            return Err(StreamError::InvalidValue("degenerate rotation".to_string()));
        }
        Ok(Quat::from_quaternion(q))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mixed_records_read_back_in_order() {
        let mut stream = FileStream::new();
        stream.write_bool(true);
        stream.write_i32(-7);
        stream.write_str("Camera");
        stream.write_strings(&["a.obj".to_string(), "b.ron".to_string()]);
        stream.write_vec3(&Vec3::new(0.0, 1.0, -5.0));
        stream.write_quat(&Quat::from_axis_angle(&Vec3::x_axis(), 0.5));

        let mut reader = FileStream::from_bytes(stream.into_bytes());
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_i32().unwrap(), -7);
        assert_eq!(reader.read_str().unwrap(), "Camera");
        assert_eq!(reader.read_strings().unwrap(), vec!["a.obj", "b.ron"]);
        assert_relative_eq!(reader.read_vec3().unwrap(), Vec3::new(0.0, 1.0, -5.0));
        let rotation = reader.read_quat().unwrap();
        assert_relative_eq!(rotation.angle(), 0.5, epsilon = 1e-5);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_truncated_string_is_reported() {
        let mut stream = FileStream::new();
        stream.write_str("truncated");
        let mut bytes = stream.into_bytes();
        bytes.truncate(6);

        let mut reader = FileStream::from_bytes(bytes);
        assert!(matches!(reader.read_str(), Err(StreamError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_oversized_length_prefix_is_rejected() {
        let mut stream = FileStream::new();
        stream.write_u32(MAX_STRING_LENGTH + 1);
        let mut reader = FileStream::from_bytes(stream.into_bytes());
        assert!(matches!(reader.read_str(), Err(StreamError::LengthOutOfRange { .. })));
    }

    #[test]
    fn test_save_and_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.bin");

        let mut stream = FileStream::new();
        stream.write_f32(2.5);
        stream.save(&path).unwrap();

        let mut reader = FileStream::open(&path).unwrap();
        assert_relative_eq!(reader.read_f32().unwrap(), 2.5);
    }
}
