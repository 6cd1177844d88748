//! `Range` header parsing
//!
//! Supports `bytes=<start>-<end>` and `bytes=<start>-`. Only the first range
//! of a multi-range request is honoured. Suffix ranges (`bytes=-500`) are
//! rejected like any other malformed value.

use crate::error::{Result, ShelfError};

/// Inclusive byte window within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` header
    pub fn content_range(&self, file_size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, file_size)
    }
}

fn parse_bound(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Validate a `Range` header against the file size.
pub fn parse_range(header: &str, file_size: u64) -> Result<ByteRange> {
    let unsatisfiable = || ShelfError::RangeNotSatisfiable {
        header: header.to_string(),
        file_size,
    };

    let ranges = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or_else(unsatisfiable)?;
    let first = ranges.split(',').next().unwrap_or("");
    let (start, end) = first.split_once('-').ok_or_else(unsatisfiable)?;

    let start = parse_bound(start).ok_or_else(unsatisfiable)?;
    if start >= file_size {
        return Err(unsatisfiable());
    }

    let end = if end.trim().is_empty() {
        file_size - 1
    } else {
        parse_bound(end).ok_or_else(unsatisfiable)?
    };
    if start > end || end >= file_size {
        return Err(unsatisfiable());
    }

    Ok(ByteRange { start, end })
}
