
use fixtures::*;

use fcs::{ColumnOrder, FcsError, FcsParser, FcsVersion, ParserSettings, Segment};
use pretty_assertions::assert_eq;

fn parse(builder: &FcsFileBuilder) -> fcs::Result<fcs::FcsDataset> {
    ensure_env_logger_initialized();
    FcsParser::from_buffer(builder.build()).parse()
}

#[test]
fn test_it_decodes_little_endian_floats() {
    let raw = three_event_file().build();
    let (keywords, events) = fcs::parse(raw.clone()).unwrap();

    assert_eq!(keywords.get("$TOT"), Some("3"));
    assert_eq!(events.len(), 3);

    let data_start = keywords.get_int("$BEGINDATA").unwrap() as usize;
    for (i, event) in events.iter().enumerate() {
        assert_eq!(event.len(), 2);
        for (slot, name) in ["FSC-A", "SSC-A"].iter().enumerate() {
            let at = data_start + i * 8 + slot * 4;
            let expected = f32::from_le_bytes(raw[at..at + 4].try_into().unwrap());
            let actual = event.get(name).unwrap().value;
            assert_eq!(actual.to_bits(), f64::from(expected).to_bits());
        }
    }

    assert_eq!(events[1].get("SSC-A").unwrap().value, -3.25);
}

#[test]
fn test_it_decodes_big_endian_doubles() {
    let values = [1.5_f64, -2.0, 1e300, 0.1];
    let data = values.iter().flat_map(|v| v.to_be_bytes()).collect();

    let dataset = parse(
        &FcsFileBuilder::new()
            .version("FCS3.0")
            .keyword("$DATATYPE", "D")
            .keyword("$BYTEORD", "4,3,2,1")
            .keyword("$TOT", "2")
            .parameters(&["A", "B"])
            .data(data),
    )
    .unwrap();

    assert_eq!(dataset.version, FcsVersion::V3_0);
    let decoded: Vec<f64> = dataset
        .events
        .iter()
        .flat_map(|e| e.iter().map(|p| p.value))
        .collect();
    assert_eq!(decoded, values);
}

#[test]
fn test_every_event_has_every_declared_parameter() {
    let row: &[f32] = &[1.0, 2.0, 3.0, 4.0];
    let builder = FcsFileBuilder::new()
        .parameters(&["FSC-A", "SSC-A", "FL1-A", "Time"])
        .f32_le_events(&[row; 17]);

    let dataset = parse(&builder).unwrap();

    assert_eq!(dataset.events.len(), dataset.layout.event_count);
    assert_eq!(dataset.events.len(), 17);
    for event in &dataset.events {
        assert_eq!(event.len(), dataset.layout.parameter_count);
    }
}

#[test]
fn test_parallel_and_sequential_decoding_agree() {
    let rows: Vec<[f32; 3]> = (0..500)
        .map(|i| [i as f32, (i * 2) as f32 + 0.25, -(i as f32)])
        .collect();
    let rows: Vec<&[f32]> = rows.iter().map(|r| r.as_slice()).collect();
    let raw = FcsFileBuilder::new()
        .parameters(&["A", "B", "C"])
        .f32_le_events(&rows)
        .build();

    let sequential = FcsParser::from_buffer(raw.clone())
        .with_configuration(ParserSettings::new().num_threads(1))
        .parse()
        .unwrap();
    let parallel = FcsParser::from_buffer(raw)
        .with_configuration(ParserSettings::new().num_threads(4))
        .parse()
        .unwrap();

    assert_eq!(sequential.events, parallel.events);
}

#[test]
fn test_escaped_delimiters_in_values() {
    let dataset = parse(
        &three_event_file()
            .keyword("$FIL", "run/1/a.fcs")
            .keyword("$P1S", "CD3//CD4"),
    )
    .unwrap();

    assert_eq!(dataset.keywords.get("$FIL"), Some("run/1/a.fcs"));
    assert_eq!(dataset.keywords.get("$P1S"), Some("CD3//CD4"));
}

#[test]
fn test_other_delimiters() {
    let dataset = parse(&three_event_file().delimiter('|').keyword("$FIL", "a|b")).unwrap();

    assert_eq!(dataset.keywords.get("$FIL"), Some("a|b"));
    assert_eq!(dataset.events.len(), 3);
}

#[test]
fn test_column_order_follows_parameter_index() {
    // Same parameters, keywords written in opposite orders.
    let forward = FcsFileBuilder::new()
        .keyword("$PAR", "3")
        .keyword("$P1N", "Zeta")
        .keyword("$P2N", "Alpha")
        .keyword("$P10N", "Mu")
        .f32_le_events(&[&[1.0, 2.0, 3.0]]);
    let reversed = FcsFileBuilder::new()
        .keyword("$P10N", "Mu")
        .keyword("$P2N", "Alpha")
        .keyword("$P1N", "Zeta")
        .keyword("$PAR", "3")
        .f32_le_events(&[&[1.0, 2.0, 3.0]]);

    for builder in [forward, reversed] {
        let dataset = parse(&builder).unwrap();
        let event = &dataset.events[0];

        assert_eq!(
            event.names_delimited(",", ColumnOrder::Index),
            "Zeta,Alpha,Mu"
        );
        assert_eq!(event.get("Mu").unwrap().value, 3.0);
        assert_eq!(
            event.names_delimited(",", ColumnOrder::Alphabetical),
            "Alpha,Mu,Zeta"
        );
    }
}

#[test]
fn test_parameter_ranges_are_attached() {
    let dataset = parse(&three_event_file().keyword("$P2R", "262144")).unwrap();

    let event = &dataset.events[0];
    assert_eq!(event.get("SSC-A").unwrap().limit.as_deref(), Some("262144"));
    assert_eq!(event.get("FSC-A").unwrap().limit, None);
}

#[test]
fn test_supplemental_text_takes_precedence() {
    let dataset = parse(
        &three_event_file()
            .keyword("$CYT", "primary")
            .keyword("$FIL", "kept.fcs")
            .supplemental_keyword("$CYT", "supplemental")
            .supplemental_keyword("$P2N", "SSC-H"),
    )
    .unwrap();

    assert!(dataset.offsets.supplemental_text.is_some());
    assert_eq!(dataset.keywords.get("$CYT"), Some("supplemental"));
    assert_eq!(dataset.keywords.get("$FIL"), Some("kept.fcs"));
    assert!(dataset.events[0].get("SSC-H").is_some());
    assert!(dataset.events[0].get("SSC-A").is_none());
}

#[test]
fn test_unsupported_version() {
    let err = parse(&three_event_file().version("FCS2.0")).unwrap_err();

    assert!(
        matches!(err, FcsError::UnsupportedVersion { ref found } if found == "FCS2.0"),
        "unexpected error {err:?}"
    );
}

#[test]
fn test_unsupported_mode() {
    let err = parse(&three_event_file().keyword("$MODE", "C")).unwrap_err();
    assert!(matches!(err, FcsError::UnsupportedMode { found: Some(ref m) } if m == "C"));

    let err = parse(&three_event_file().without_keyword("$MODE")).unwrap_err();
    assert!(matches!(err, FcsError::UnsupportedMode { found: None }));
}

#[test]
fn test_unsupported_data_type() {
    let err = parse(&three_event_file().keyword("$DATATYPE", "I")).unwrap_err();

    assert!(
        matches!(err, FcsError::UnsupportedDataType { found: Some(ref t) } if t == "I"),
        "unexpected error {err:?}"
    );
}

#[test]
fn test_zero_events() {
    let dataset = parse(
        &FcsFileBuilder::new()
            .parameters(&["FSC-A", "SSC-A"])
            .keyword("$TOT", "0"),
    )
    .unwrap();

    assert!(dataset.events.is_empty());
    assert_eq!(dataset.offsets.data, Segment::new(0, 0));
}

#[test]
fn test_it_reads_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = three_event_file().write_to(&dir, "sample.fcs");

    let dataset = FcsParser::from_path(&path).unwrap().parse().unwrap();
    assert_eq!(dataset.events.len(), 3);

    let missing = FcsParser::from_path(dir.path().join("missing.fcs"));
    assert!(matches!(missing, Err(FcsError::FailedToOpenFile { .. })));
}
