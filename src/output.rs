//! Human-readable renderings of a parsed dataset: the keyword listing, delimited event rows and
//! JSON lines.

use crate::err::{FcsError, Result};
use crate::fcs_parser::FcsDataset;
use crate::keywords::KeywordRegistry;
use crate::model::{ColumnOrder, DEFAULT_DELIMITER, Event};

use log::info;
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const METADATA_EXTENSION: &str = ".meta.txt";
pub const DATA_EXTENSION: &str = ".data.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    delimiter: String,
    header_row: bool,
    column_order: ColumnOrder,
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            delimiter: DEFAULT_DELIMITER.to_owned(),
            header_row: true,
            column_order: ColumnOrder::default(),
        }
    }
}

impl OutputSettings {
    pub fn new() -> Self {
        OutputSettings::default()
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Whether delimited output starts with a row of parameter names.
    pub fn header_row(mut self, header_row: bool) -> Self {
        self.header_row = header_row;
        self
    }

    pub fn column_order(mut self, column_order: ColumnOrder) -> Self {
        self.column_order = column_order;
        self
    }

    pub fn get_delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn get_column_order(&self) -> ColumnOrder {
        self.column_order
    }
}

/// One `KEY => value` line per keyword, sorted by key.
pub fn metadata_string(keywords: &KeywordRegistry) -> String {
    let mut out = String::new();
    for (key, value) in keywords.iter() {
        out.push_str(key.as_str());
        out.push_str(" => ");
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Writes one delimited row per event, preceded by the names of the first event's parameters
/// when `settings` asks for a header row and there is at least one event.
pub fn write_events_delimited<W: Write>(
    mut writer: W,
    events: &[Event],
    settings: &OutputSettings,
) -> std::io::Result<()> {
    if settings.header_row {
        if let Some(first) = events.first() {
            writeln!(
                writer,
                "{}",
                first.names_delimited(&settings.delimiter, settings.column_order)
            )?;
        }
    }

    for event in events {
        writeln!(
            writer,
            "{}",
            event.values_delimited(&settings.delimiter, settings.column_order)
        )?;
    }

    writer.flush()
}

pub fn event_to_json(event: &Event, order: ColumnOrder) -> Value {
    let mut object = Map::with_capacity(event.len());
    for p in event.ordered(order) {
        let value = Number::from_f64(p.value).map_or(Value::Null, Value::Number);
        object.insert(p.name_or_empty().to_owned(), value);
    }
    Value::Object(object)
}

/// Writes one JSON object per line, mapping parameter names to values. Non-finite values are
/// written as `null`.
pub fn write_events_jsonl<W: Write>(
    mut writer: W,
    events: &[Event],
    order: ColumnOrder,
) -> std::io::Result<()> {
    for event in events {
        serde_json::to_writer(&mut writer, &event_to_json(event, order))?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

fn with_extension(input: &Path, extension: &str) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(extension);
    PathBuf::from(name)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| FcsError::FailedToOpenFile {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Writes `<input>.meta.txt` (see [`metadata_string`]) and `<input>.data.csv`
/// (see [`write_events_delimited`]) next to `input`, returning both paths.
pub fn write_metadata_and_data(
    input: &Path,
    dataset: &FcsDataset,
    settings: &OutputSettings,
) -> Result<(PathBuf, PathBuf)> {
    let meta_path = with_extension(input, METADATA_EXTENSION);
    let data_path = with_extension(input, DATA_EXTENSION);

    let mut meta = create(&meta_path)?;
    meta.write_all(metadata_string(&dataset.keywords).as_bytes())?;
    meta.flush()?;

    write_events_delimited(create(&data_path)?, &dataset.events, settings)?;

    info!(
        "wrote {} and {}",
        meta_path.display(),
        data_path.display()
    );
    Ok((meta_path, data_path))
}
