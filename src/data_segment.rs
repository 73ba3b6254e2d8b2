use crate::err::{FcsError, Result};
use crate::fcs_file_header::Segment;
use crate::keywords::{KeywordRegistry, StandardKeyword};
use crate::utils::bytes;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::{debug, warn};
use serde::Serialize;

/// `$BYTEORD` value denoting little-endian data. Every other value is read as big-endian.
pub const LITTLE_ENDIAN_BYTEORD: &str = "1,2,3,4";
pub const LIST_MODE: &str = "L";

/// One decoded event: a value per parameter, in file order.
pub type DecodedRecord = Vec<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    /// `F`, 32-bit IEEE-754.
    Float,
    /// `D`, 64-bit IEEE-754.
    Double,
}

impl DataType {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "F" => Some(DataType::Float),
            "D" => Some(DataType::Double),
            _ => None,
        }
    }

    pub const fn width(self) -> usize {
        match self {
            DataType::Float => 4,
            DataType::Double => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn from_keyword(value: Option<&str>) -> Self {
        match value {
            Some(LITTLE_ENDIAN_BYTEORD) => Endian::Little,
            _ => Endian::Big,
        }
    }
}

/// Everything needed from TEXT to decode list-mode DATA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataLayout {
    pub data_type: DataType,
    pub endian: Endian,
    pub parameter_count: usize,
    pub event_count: usize,
}

impl DataLayout {
    pub fn from_keywords(registry: &KeywordRegistry) -> Result<DataLayout> {
        let mode = registry.get_standard(StandardKeyword::Mode);
        if mode != Some(LIST_MODE) {
            return Err(FcsError::UnsupportedMode {
                found: mode.map(str::to_owned),
            });
        }

        let data_type = registry.get_standard(StandardKeyword::DataType);
        let data_type = data_type.and_then(DataType::from_keyword).ok_or_else(|| {
            FcsError::UnsupportedDataType {
                found: data_type.map(str::to_owned),
            }
        })?;

        Ok(DataLayout {
            data_type,
            endian: Endian::from_keyword(registry.get_standard(StandardKeyword::ByteOrd)),
            parameter_count: count_keyword(registry, StandardKeyword::Par),
            event_count: count_keyword(registry, StandardKeyword::Tot),
        })
    }

    /// Bytes occupied by the decoded fields of one event.
    pub fn record_width(&self) -> usize {
        self.parameter_count.saturating_mul(self.data_type.width())
    }
}

fn count_keyword(registry: &KeywordRegistry, key: StandardKeyword) -> usize {
    match registry.get_standard(key) {
        Some(value) => match value.trim().parse::<usize>() {
            Ok(n) => n,
            Err(_) => {
                warn!("`{key}` has non-numeric value {value:?}, treating it as 0");
                0
            }
        },
        None => {
            warn!("`{key}` is missing, treating it as 0");
            0
        }
    }
}

type DecodeFn = fn(&[u8]) -> f64;

fn read_f32<B: ByteOrder>(buf: &[u8]) -> f64 {
    f64::from(B::read_f32(buf))
}

fn read_f64<B: ByteOrder>(buf: &[u8]) -> f64 {
    B::read_f64(buf)
}

// Indexed by [DataType][Endian].
const DECODERS: [[DecodeFn; 2]; 2] = [
    [read_f32::<LittleEndian>, read_f32::<BigEndian>],
    [read_f64::<LittleEndian>, read_f64::<BigEndian>],
];

fn decoder_for(data_type: DataType, endian: Endian) -> DecodeFn {
    let row = match data_type {
        DataType::Float => 0,
        DataType::Double => 1,
    };
    let col = match endian {
        Endian::Little => 0,
        Endian::Big => 1,
    };
    DECODERS[row][col]
}

struct EventDecoder<'a> {
    buf: &'a [u8],
    start: u64,
    bytes_per_event: u64,
    record_width: usize,
    field_width: usize,
    read_field: DecodeFn,
}

impl EventDecoder<'_> {
    fn decode(&self, event: usize) -> Result<DecodedRecord> {
        let overflow = || FcsError::Truncated {
            what: "event record",
            offset: u64::MAX,
            need: self.record_width,
            have: 0,
        };
        let offset = (event as u64)
            .checked_mul(self.bytes_per_event)
            .and_then(|o| o.checked_add(self.start))
            .ok_or_else(overflow)?;
        let offset = bytes::offset_to_usize(offset, "event record")?;

        let record = bytes::slice_r(self.buf, offset, self.record_width, "event record")?;
        Ok(record
            .chunks_exact(self.field_width)
            .map(self.read_field)
            .collect())
    }

    #[cfg(feature = "multithreading")]
    fn decode_parallel(&self, event_count: usize, num_threads: usize) -> Result<Vec<DecodedRecord>> {
        use rayon::prelude::*;

        let run = || {
            (0..event_count)
                .into_par_iter()
                .map(|i| self.decode(i))
                .collect::<Result<Vec<_>>>()
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!("failed to build a thread pool ({e}), using the global pool");
                run()
            }
        }
    }
}

/// Decodes every event of the DATA segment `data` according to `layout`.
///
/// Each event occupies `(data.end - data.start + 1) / event_count` bytes, of which the first
/// `layout.record_width()` are decoded. Bytes left over by the integer division are not read.
pub(crate) fn decode_events(
    buf: &[u8],
    data: Segment,
    layout: &DataLayout,
    num_threads: usize,
) -> Result<Vec<DecodedRecord>> {
    if layout.event_count == 0 {
        debug!("no events declared, skipping DATA segment {data}");
        return Ok(Vec::new());
    }

    let bytes_per_event = data.len() / layout.event_count as u64;
    let remainder = data.len() % layout.event_count as u64;
    if remainder != 0 {
        debug!("DATA segment {data} leaves {remainder} trailing bytes unread");
    }

    let record_width = layout.record_width();
    if bytes_per_event < record_width as u64 {
        return Err(FcsError::Truncated {
            what: "event record",
            offset: data.start,
            need: record_width,
            have: bytes_per_event as usize,
        });
    }

    debug!(
        "decoding {} events of {} x {:?} ({:?} endian), {bytes_per_event} bytes per event",
        layout.event_count, layout.parameter_count, layout.data_type, layout.endian
    );

    let decoder = EventDecoder {
        buf,
        start: data.start,
        bytes_per_event,
        record_width,
        field_width: layout.data_type.width(),
        read_field: decoder_for(layout.data_type, layout.endian),
    };

    #[cfg(feature = "multithreading")]
    {
        if num_threads != 1 {
            return decoder.decode_parallel(layout.event_count, num_threads);
        }
    }
    #[cfg(not(feature = "multithreading"))]
    let _ = num_threads;

    (0..layout.event_count).map(|i| decoder.decode(i)).collect()
}
