use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FcsError>;

#[derive(Debug, Error)]
pub enum FcsError {
    #[error("unsupported FCS version `{found}` (supported: FCS3.0, FCS3.1)")]
    UnsupportedVersion { found: String },

    #[error("header field `{field}` at offset {offset} is not a decimal integer: {value:?}")]
    MalformedHeader {
        field: &'static str,
        offset: usize,
        value: String,
    },

    #[error("only list mode (`$MODE` = `L`) is supported, found {found:?}")]
    UnsupportedMode { found: Option<String> },

    #[error("only float (`F`) and double (`D`) data is supported, `$DATATYPE` is {found:?}")]
    UnsupportedDataType { found: Option<String> },

    #[error("buffer too small for {what} at offset {offset} (need {need} bytes, have {have})")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("{segment} segment [{start}, {end}] is out of bounds (file is {len} bytes)")]
    SegmentOutOfBounds {
        segment: &'static str,
        start: u64,
        end: u64,
        len: usize,
    },

    #[error("failed to open file `{}`: {source}", path.display())]
    FailedToOpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("an I/O error has occurred: {0}")]
    Io(#[from] io::Error),
}
