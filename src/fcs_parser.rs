use crate::data_segment::{self, DataLayout};
use crate::err::{FcsError, Result};
use crate::fcs_file_header::{FcsFileHeader, FcsVersion, Segment};
use crate::keywords::{KeywordRegistry, StandardKeyword};
use crate::model::Event;
use crate::parameters::ParameterIndex;
use crate::text_segment::parse_text_region;

use log::{debug, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSettings {
    num_threads: usize,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            num_threads: if cfg!(feature = "multithreading") { 0 } else { 1 },
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    /// Sets the number of worker threads used to decode events.
    /// `0` will let rayon decide, `1` decodes on the calling thread.
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = if cfg!(feature = "multithreading") {
            num_threads
        } else {
            if num_threads > 1 {
                warn!("`num_threads` has no effect without the `multithreading` feature");
            }
            1
        };
        self
    }

    pub fn get_num_threads(&self) -> usize {
        self.num_threads
    }
}

/// Segment boundaries after TEXT has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SegmentOffsets {
    pub text: Segment,
    pub supplemental_text: Option<Segment>,
    pub data: Segment,
    pub analysis: Segment,
}

impl SegmentOffsets {
    /// DATA and ANALYSIS come from TEXT, whatever the HEADER said.
    ///
    /// Both ends of ANALYSIS are read from `$BEGINANALYSIS`; `$ENDANALYSIS` is not consulted.
    pub fn resolve(
        header: &FcsFileHeader,
        supplemental_text: Option<Segment>,
        registry: &KeywordRegistry,
    ) -> SegmentOffsets {
        let data = Segment::new(
            offset_keyword(registry, StandardKeyword::BeginData),
            offset_keyword(registry, StandardKeyword::EndData),
        );
        let analysis = Segment::new(
            offset_keyword(registry, StandardKeyword::BeginAnalysis),
            offset_keyword(registry, StandardKeyword::BeginAnalysis),
        );

        if data != header.data {
            debug!("DATA segment from TEXT {data} replaces HEADER {}", header.data);
        }

        SegmentOffsets {
            text: header.text,
            supplemental_text,
            data,
            analysis,
        }
    }
}

fn offset_keyword(registry: &KeywordRegistry, key: StandardKeyword) -> u64 {
    match registry.get_standard(key) {
        Some(value) => registry.get_int(key.as_str()).unwrap_or_else(|| {
            warn!("`{key}` has non-numeric value {value:?}, treating it as 0");
            0
        }),
        None => 0,
    }
}

/// The result of parsing one FCS file.
#[derive(Debug, Clone)]
pub struct FcsDataset {
    pub version: FcsVersion,
    pub offsets: SegmentOffsets,
    pub layout: DataLayout,
    pub keywords: KeywordRegistry,
    pub events: Vec<Event>,
}

impl FcsDataset {
    pub fn into_parts(self) -> (KeywordRegistry, Vec<Event>) {
        (self.keywords, self.events)
    }
}

/// Reads the primary TEXT region, then the supplemental one if `$BEGINSTEXT`/`$ENDSTEXT` point
/// to one. Keywords of the supplemental region override those of the primary region.
fn read_text_segments(
    buf: &[u8],
    header: &FcsFileHeader,
    registry: &mut KeywordRegistry,
) -> Result<Option<Segment>> {
    parse_text_region(buf, header.text.start, header.text.end, registry)?;

    let supplemental = Segment::new(
        offset_keyword(registry, StandardKeyword::BeginSText),
        offset_keyword(registry, StandardKeyword::EndSText),
    );
    if supplemental.is_empty() {
        return Ok(None);
    }

    debug!("reading supplemental TEXT {supplemental}");
    parse_text_region(buf, supplemental.start, supplemental.end, registry)?;
    Ok(Some(supplemental))
}

pub struct FcsParser {
    data: Vec<u8>,
    config: ParserSettings,
}

impl FcsParser {
    /// Reads the whole file into memory. Nothing is parsed until [`FcsParser::parse`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut f = File::open(path).map_err(|e| FcsError::FailedToOpenFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut data = Vec::new();
        f.read_to_end(&mut data)?;

        info!("loaded {} bytes from {}", data.len(), path.display());
        Ok(Self::from_buffer(data))
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::from_buffer(data))
    }

    pub fn from_buffer(buffer: Vec<u8>) -> Self {
        FcsParser {
            data: buffer,
            config: ParserSettings::default(),
        }
    }

    pub fn with_configuration(mut self, configuration: ParserSettings) -> Self {
        self.config = configuration;
        self
    }

    /// Decodes the file. The raw bytes are released when this returns.
    pub fn parse(self) -> Result<FcsDataset> {
        let FcsParser { data, config } = self;

        let header = FcsFileHeader::from_bytes(&data)?;
        debug!("FCS header: {header:?}");

        let mut keywords = KeywordRegistry::new();
        let supplemental_text = read_text_segments(&data, &header, &mut keywords)?;
        // Read-only from here on.
        let keywords = keywords;

        let offsets = SegmentOffsets::resolve(&header, supplemental_text, &keywords);
        debug!("resolved segments: {offsets:?}");

        let layout = DataLayout::from_keywords(&keywords)?;
        let records =
            data_segment::decode_events(&data, offsets.data, &layout, config.num_threads)?;
        drop(data);

        let index = ParameterIndex::from_keywords(&keywords);
        if index.len() != layout.parameter_count {
            debug!(
                "{} named parameters for `$PAR` = {}",
                index.len(),
                layout.parameter_count
            );
        }

        let events: Vec<Event> = records
            .into_iter()
            .map(|record| Event::from_record(record, &index))
            .collect();

        info!(
            "parsed {} events, {} keywords ({})",
            events.len(),
            keywords.len(),
            header.version
        );

        Ok(FcsDataset {
            version: header.version,
            offsets,
            layout,
            keywords,
            events,
        })
    }
}

/// Parses a complete FCS file held in memory.
pub fn parse(raw: Vec<u8>) -> Result<(KeywordRegistry, Vec<Event>)> {
    Ok(FcsParser::from_buffer(raw).parse()?.into_parts())
}
