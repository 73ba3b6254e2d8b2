//! Byte-slice utilities for bounds-oriented parsing.
//!
//! Every reader in this crate works on the fully resident file buffer, so all reads are
//! plain slice accesses at absolute offsets. There are two layers:
//! - **Option layer** (`read_*`): helpers that return `Option<T>`.
//! - **Result layer** (`*_r`): wrappers that map `None` to `FcsError::Truncated`.
//!
//! Offsets are `usize` and are interpreted relative to the slice you pass in.
//!
//! ```ignore
//! use crate::utils::bytes;
//!
//! let version = bytes::read_array_r::<6>(buf, 0, "version tag")?;
//! let field = bytes::slice_r(buf, 10, 8, "text start offset")?;
//! ```

use crate::err::FcsError;

/// Read `N` raw bytes at `offset`.
///
/// Returns `None` if the range is out of bounds.
pub(crate) fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    let bytes: [u8; N] = buf.get(offset..end)?.try_into().ok()?;
    Some(bytes)
}

#[inline]
fn truncated(what: &'static str, offset: usize, need: usize, len: usize) -> FcsError {
    FcsError::Truncated {
        what,
        offset: offset as u64,
        need,
        have: len.saturating_sub(offset),
    }
}

pub(crate) fn slice_r<'a>(
    buf: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], FcsError> {
    let end = offset
        .checked_add(len)
        .ok_or_else(|| truncated(what, offset, len, buf.len()))?;
    buf.get(offset..end)
        .ok_or_else(|| truncated(what, offset, len, buf.len()))
}

/// Read `N` raw bytes at `offset`, or return `FcsError::Truncated`.
pub(crate) fn read_array_r<const N: usize>(
    buf: &[u8],
    offset: usize,
    what: &'static str,
) -> Result<[u8; N], FcsError> {
    read_array::<N>(buf, offset).ok_or_else(|| truncated(what, offset, N, buf.len()))
}

/// Convert a file offset taken from HEADER or TEXT into a slice index.
pub(crate) fn offset_to_usize(offset: u64, what: &'static str) -> Result<usize, FcsError> {
    usize::try_from(offset).map_err(|_| FcsError::Truncated {
        what,
        offset,
        need: 0,
        have: 0,
    })
}
