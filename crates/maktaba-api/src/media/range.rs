//! HTTP Range header parsing for media serving.
//!
//! Only the single-range `bytes=<start>-[<end>]` shape is supported; anything
//! else (suffix ranges, multiple ranges, garbage) is range-not-satisfiable,
//! which clients handle by re-requesting the whole file.

/// An inclusive, validated byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes the range covers (`Content-Length` of a 206).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// The requested range cannot be satisfied; respond 416 with
/// `Content-Range: bytes */<file_size>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeUnsatisfiable;

/// Parse `bytes=<start>-[<end>]` against a file of `file_size` bytes.
///
/// A missing end means "through the last byte". Unparsable bounds,
/// `start > end`, or `end >= file_size` are unsatisfiable.
pub fn parse_range(header: &str, file_size: u64) -> Result<ByteRange, RangeUnsatisfiable> {
    let spec = header.strip_prefix("bytes=").ok_or(RangeUnsatisfiable)?;

    let (start_str, end_str) = spec.split_once('-').ok_or(RangeUnsatisfiable)?;

    let start: u64 = start_str.trim().parse().map_err(|_| RangeUnsatisfiable)?;
    let end: u64 = if end_str.trim().is_empty() {
        file_size.checked_sub(1).ok_or(RangeUnsatisfiable)?
    } else {
        end_str.trim().parse().map_err(|_| RangeUnsatisfiable)?
    };

    if start > end || end >= file_size {
        return Err(RangeUnsatisfiable);
    }

    Ok(ByteRange { start, end })
}
