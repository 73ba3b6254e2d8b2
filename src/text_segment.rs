use crate::err::{FcsError, Result};
use crate::keywords::KeywordRegistry;
use crate::utils::bytes;

use log::{debug, trace};

/// Tokenizes the TEXT region `[lower, upper]` (inclusive) and merges its keyword/value pairs
/// into `registry`, returning the number of pairs merged.
///
/// The byte at `lower` is the delimiter. A delimiter byte separates tokens unless one of its
/// neighbours is also a delimiter; a doubled delimiter inside a token stands for one literal
/// delimiter character. A trailing unpaired token is dropped.
pub(crate) fn parse_text_region(
    buf: &[u8],
    lower: u64,
    upper: u64,
    registry: &mut KeywordRegistry,
) -> Result<usize> {
    let out_of_bounds = || FcsError::SegmentOutOfBounds {
        segment: "TEXT",
        start: lower,
        end: upper,
        len: buf.len(),
    };

    let lower = bytes::offset_to_usize(lower, "TEXT start").map_err(|_| out_of_bounds())?;
    let upper = bytes::offset_to_usize(upper, "TEXT end").map_err(|_| out_of_bounds())?;
    if lower >= buf.len() || upper >= buf.len() {
        return Err(out_of_bounds());
    }

    let delimiter = buf[lower];
    let tokens = split_tokens(buf, lower, upper, delimiter);

    if tokens.len() % 2 != 0 {
        debug!(
            "TEXT region [{lower}, {upper}] has an odd number of tokens ({}), dropping the last one",
            tokens.len()
        );
    }

    let mut merged = 0;
    for pair in tokens.chunks_exact(2) {
        let key = decode_token(pair[0], delimiter);
        let value = decode_token(pair[1], delimiter);
        trace!("keyword {key:?} => {value:?}");
        registry.set(&key, value);
        merged += 1;
    }

    debug!("TEXT region [{lower}, {upper}] (delimiter {delimiter:#04x}): {merged} keywords");
    Ok(merged)
}

fn split_tokens(buf: &[u8], lower: usize, upper: usize, delimiter: u8) -> Vec<&[u8]> {
    let is_delimiter = |i: usize| buf.get(i) == Some(&delimiter);

    let mut tokens = Vec::new();
    let mut token_start = lower + 1;

    for i in lower + 1..=upper {
        if buf[i] == delimiter && !is_delimiter(i - 1) && !is_delimiter(i + 1) {
            tokens.push(&buf[token_start..i]);
            token_start = i + 1;
        }
    }

    tokens
}

fn decode_token(raw: &[u8], delimiter: u8) -> String {
    if !raw.windows(2).any(|w| w[0] == delimiter && w[1] == delimiter) {
        return String::from_utf8_lossy(raw).into_owned();
    }

    let mut collapsed = Vec::with_capacity(raw.len());
    let mut iter = raw.iter().copied().peekable();
    while let Some(b) = iter.next() {
        collapsed.push(b);
        if b == delimiter && iter.peek() == Some(&delimiter) {
            iter.next();
        }
    }

    String::from_utf8_lossy(&collapsed).into_owned()
}
