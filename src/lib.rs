#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub use data_segment::{DataLayout, DataType, DecodedRecord, Endian};
pub use err::{FcsError, Result};
pub use fcs_file_header::{FcsFileHeader, FcsVersion, Segment};
pub use fcs_parser::{FcsDataset, FcsParser, ParserSettings, SegmentOffsets, parse};
pub use keywords::{Keyword, KeywordRegistry, ParameterField, ParameterKeyword, StandardKeyword};
pub use model::{ColumnOrder, Event, Parameter};
pub use parameters::{ParameterIndex, ParameterInfo};

pub mod data_segment;
pub mod err;
pub mod fcs_file_header;
pub mod fcs_parser;
pub mod keywords;
pub mod model;
pub mod output;
pub mod parameters;

mod text_segment;
mod utils;

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;
    use std::sync::Once;

    static LOGGER_INIT: Once = Once::new();

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
