use crate::err::{FcsError, Result};
use crate::utils::bytes;

use serde::Serialize;
use std::fmt;

pub const FCS_VERSION_SIZE: usize = 6;
pub const FCS_OFFSET_FIELD_SIZE: usize = 8;

const TEXT_START_OFFSET: usize = 10;
const TEXT_END_OFFSET: usize = 18;
const DATA_START_OFFSET: usize = 26;
const DATA_END_OFFSET: usize = 34;
const ANALYSIS_START_OFFSET: usize = 42;
const ANALYSIS_END_OFFSET: usize = 50;

/// Size of the fixed part of the HEADER (version, padding and six offset fields).
pub const FCS_HEADER_SIZE: usize = ANALYSIS_END_OFFSET + FCS_OFFSET_FIELD_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FcsVersion {
    #[serde(rename = "FCS3.0")]
    V3_0,
    #[serde(rename = "FCS3.1")]
    V3_1,
}

impl FcsVersion {
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"FCS3.0" => Some(FcsVersion::V3_0),
            b"FCS3.1" => Some(FcsVersion::V3_1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FcsVersion::V3_0 => "FCS3.0",
            FcsVersion::V3_1 => "FCS3.1",
        }
    }
}

impl fmt::Display for FcsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An inclusive `[start, end]` byte range inside the file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: u64,
    pub end: u64,
}

impl Segment {
    pub fn new(start: u64, end: u64) -> Self {
        Segment { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    /// Number of bytes covered, `0` when `end` precedes `start`.
    pub fn len(&self) -> u64 {
        self.end.saturating_add(1).saturating_sub(self.start)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FcsFileHeader {
    pub version: FcsVersion,
    pub text: Segment,
    // DATA and ANALYSIS are superseded by TEXT keywords once TEXT is parsed.
    pub data: Segment,
    pub analysis: Segment,
}

impl FcsFileHeader {
    pub fn from_bytes(buf: &[u8]) -> Result<FcsFileHeader> {
        let tag = bytes::slice_r(buf, 0, FCS_VERSION_SIZE, "version tag")?;
        let version = FcsVersion::from_tag(tag).ok_or_else(|| FcsError::UnsupportedVersion {
            found: String::from_utf8_lossy(tag).into_owned(),
        })?;

        let text = Segment::new(
            read_offset_field(buf, TEXT_START_OFFSET, "text start")?,
            read_offset_field(buf, TEXT_END_OFFSET, "text end")?,
        );
        let data = Segment::new(
            read_offset_field(buf, DATA_START_OFFSET, "data start")?,
            read_offset_field(buf, DATA_END_OFFSET, "data end")?,
        );
        let analysis = Segment::new(
            read_offset_field(buf, ANALYSIS_START_OFFSET, "analysis start")?,
            read_offset_field(buf, ANALYSIS_END_OFFSET, "analysis end")?,
        );

        Ok(FcsFileHeader {
            version,
            text,
            data,
            analysis,
        })
    }
}

/// Offsets are right-justified ASCII decimals, space padded.
fn read_offset_field(buf: &[u8], offset: usize, field: &'static str) -> Result<u64> {
    let raw = bytes::read_array_r::<FCS_OFFSET_FIELD_SIZE>(buf, offset, field)?;
    let malformed = || FcsError::MalformedHeader {
        field,
        offset,
        value: String::from_utf8_lossy(&raw).into_owned(),
    };

    let text = std::str::from_utf8(&raw).map_err(|_| malformed())?;
    text.trim_matches(|c: char| c.is_ascii_whitespace())
        .parse::<u64>()
        .map_err(|_| malformed())
}
